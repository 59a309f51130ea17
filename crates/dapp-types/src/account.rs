//! Transaction and account types for the dApp client.
//!
//! A [`TransactionRequest`] is always fully populated before it reaches the
//! signer: nonce, gas price and gas limit are read fresh for every
//! submission and never reused.

use crate::delivery::Log;
use alloy_primitives::{Address, Bytes, TxKind, B256, U256};
use serde::{Deserialize, Serialize};

/// A fully populated, unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
	/// Sending account.
	pub from: Address,
	/// Destination contract or account.
	pub to: Address,
	/// ABI-encoded call data (empty for plain value transfers).
	pub data: Bytes,
	/// Native value attached to the call, in base units.
	pub value: U256,
	/// Account nonce read right before submission.
	pub nonce: u64,
	/// Legacy gas price in wei.
	pub gas_price: u128,
	/// Gas limit for execution.
	pub gas_limit: u64,
	/// Chain ID for replay protection.
	pub chain_id: u64,
}

/// Conversion from our request type to Alloy's TransactionRequest.
impl From<TransactionRequest> for alloy_rpc_types::TransactionRequest {
	fn from(tx: TransactionRequest) -> Self {
		alloy_rpc_types::TransactionRequest {
			from: Some(tx.from),
			to: Some(TxKind::Call(tx.to)),
			value: Some(tx.value),
			nonce: Some(tx.nonce),
			gas: Some(tx.gas_limit),
			gas_price: Some(tx.gas_price),
			chain_id: Some(tx.chain_id),
			input: alloy_rpc_types::TransactionInput::new(tx.data),
			..Default::default()
		}
	}
}

/// A transaction that reached the requested number of confirmations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedTransaction {
	/// Transaction hash.
	pub hash: B256,
	/// Block the transaction was included in.
	pub block_number: u64,
	/// Hash of that block, when the node reports it.
	pub block_hash: Option<B256>,
	/// Logs emitted by the transaction.
	pub logs: Vec<Log>,
}

/// Snapshot of the connected account and network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
	/// Active account address.
	pub account: Address,
	/// Chain the wallet is connected to.
	pub chain_id: u64,
	/// Native balance in base units.
	pub balance: U256,
	/// Balance rendered in display units.
	pub formatted_balance: String,
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	#[test]
	fn test_into_alloy_request_populates_every_field() {
		let tx = TransactionRequest {
			from: address!("0x1111111111111111111111111111111111111111"),
			to: address!("0x2222222222222222222222222222222222222222"),
			data: Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
			value: U256::from(7u8),
			nonce: 3,
			gas_price: 30_000_000_000,
			gas_limit: 21_000,
			chain_id: 80001,
		};

		let request: alloy_rpc_types::TransactionRequest = tx.clone().into();
		assert_eq!(request.from, Some(tx.from));
		assert_eq!(request.to, Some(TxKind::Call(tx.to)));
		assert_eq!(request.value, Some(U256::from(7u8)));
		assert_eq!(request.nonce, Some(3));
		assert_eq!(request.gas, Some(21_000));
		assert_eq!(request.gas_price, Some(30_000_000_000));
		assert_eq!(request.chain_id, Some(80001));
		assert_eq!(request.input.input().cloned(), Some(tx.data));
	}
}
