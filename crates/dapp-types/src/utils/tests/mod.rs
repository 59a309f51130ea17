//! Test builders for dApp types
//!
//! Fluent builder APIs for constructing types with sensible defaults,
//! for TESTING purposes.
pub mod builders;
