//! Secure string type for handling sensitive data.
//!
//! Private keys are only ever exposed through a closure and the backing
//! buffer is wiped when the value is dropped.

use serde::{Deserialize, Deserializer};
use std::fmt;
use zeroize::Zeroizing;

/// A string whose contents are redacted in debug output and zeroized on drop.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	pub fn new(value: String) -> Self {
		Self(Zeroizing::new(value))
	}

	/// Runs `f` with the exposed secret.
	pub fn with_exposed<R>(&self, f: impl FnOnce(&str) -> R) -> R {
		f(self.0.as_str())
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("SecretString(<redacted>)")
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		String::deserialize(deserializer).map(SecretString::new)
	}
}
