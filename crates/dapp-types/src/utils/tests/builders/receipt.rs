//! Builder for TransactionReceipt

use crate::delivery::{Log, TransactionReceipt};
use alloy_primitives::B256;

/// Builder for creating `TransactionReceipt` instances.
///
/// Defaults to a successful receipt in block 1 with no logs.
#[derive(Debug, Clone)]
pub struct TransactionReceiptBuilder {
	receipt: TransactionReceipt,
}

impl Default for TransactionReceiptBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl TransactionReceiptBuilder {
	pub fn new() -> Self {
		Self {
			receipt: TransactionReceipt {
				hash: B256::repeat_byte(0xab),
				block_number: 1,
				block_hash: Some(B256::repeat_byte(0xbb)),
				success: true,
				logs: Vec::new(),
			},
		}
	}

	pub fn hash(mut self, hash: B256) -> Self {
		self.receipt.hash = hash;
		self
	}

	pub fn block_number(mut self, block_number: u64) -> Self {
		self.receipt.block_number = block_number;
		self
	}

	pub fn success(mut self, success: bool) -> Self {
		self.receipt.success = success;
		self
	}

	pub fn log(mut self, log: Log) -> Self {
		self.receipt.logs.push(log);
		self
	}

	pub fn build(self) -> TransactionReceipt {
		self.receipt
	}
}
