//! Builders for transaction requests and receipts.

mod receipt;
mod transaction_request;

pub use receipt::TransactionReceiptBuilder;
pub use transaction_request::TransactionRequestBuilder;
