//! Transaction delivery types for the dApp client.
//!
//! This module defines the receipt and log types that the delivery layer
//! hands back after a transaction has been included in a block.

use alloy_primitives::{Address, Bytes, LogData, B256};
use serde::{Deserialize, Serialize};

/// Event log emitted by a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
	/// Contract address that emitted the log.
	pub address: Address,
	/// Indexed event parameters.
	/// Topic[0] is the event signature hash for non-anonymous events.
	pub topics: Vec<B256>,
	/// Non-indexed event data.
	pub data: Bytes,
}

impl Log {
	/// Rebuilds the topic/data pair for event decoding.
	pub fn log_data(&self) -> LogData {
		LogData::new_unchecked(self.topics.clone(), self.data.clone())
	}
}

/// Transaction receipt containing execution details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub hash: B256,
	/// The block number where the transaction was included.
	pub block_number: u64,
	/// The hash of the including block, when the node reports it.
	pub block_hash: Option<B256>,
	/// Whether the transaction executed successfully.
	pub success: bool,
	/// Event logs emitted during transaction execution.
	pub logs: Vec<Log>,
}
