//! Event types for wallet change notifications and user-facing notices.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Change notifications emitted by a wallet provider.
///
/// Subscribers re-read account and network information when they see one of
/// these; the provider itself never pushes balances or other state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderEvent {
	/// The wallet's exposed accounts changed. The first entry is active.
	AccountsChanged(Vec<Address>),
	/// The wallet switched to another chain.
	ChainChanged(u64),
	/// The wallet disconnected.
	Disconnected,
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
	Success,
	Info,
	Warning,
	Error,
}

/// A transient notification shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
	pub level: NoticeLevel,
	pub message: String,
}

impl Notice {
	pub fn success(message: impl Into<String>) -> Self {
		Self {
			level: NoticeLevel::Success,
			message: message.into(),
		}
	}

	pub fn info(message: impl Into<String>) -> Self {
		Self {
			level: NoticeLevel::Info,
			message: message.into(),
		}
	}

	pub fn warning(message: impl Into<String>) -> Self {
		Self {
			level: NoticeLevel::Warning,
			message: message.into(),
		}
	}

	pub fn error(message: impl Into<String>) -> Self {
		Self {
			level: NoticeLevel::Error,
			message: message.into(),
		}
	}
}
