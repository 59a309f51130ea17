//! Builder for TransactionRequest

use crate::account::TransactionRequest;
use alloy_primitives::{address, Address, Bytes, U256};

/// Builder for creating `TransactionRequest` instances with a fluent API.
///
/// Defaults to a zero-value call from the first Anvil account on chain 31337.
///
/// # Examples
///
/// ```text
/// use dapp_types::utils::tests::builders::TransactionRequestBuilder;
///
/// let tx = TransactionRequestBuilder::new().nonce(4).gas_limit(50_000).build();
/// assert_eq!(tx.nonce, 4);
/// ```
#[derive(Debug, Clone)]
pub struct TransactionRequestBuilder {
	request: TransactionRequest,
}

impl Default for TransactionRequestBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl TransactionRequestBuilder {
	pub fn new() -> Self {
		Self {
			request: TransactionRequest {
				from: address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
				to: address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"),
				data: Bytes::new(),
				value: U256::ZERO,
				nonce: 0,
				gas_price: 1_000_000_000,
				gas_limit: 21_000,
				chain_id: 31337,
			},
		}
	}

	pub fn from(mut self, from: Address) -> Self {
		self.request.from = from;
		self
	}

	pub fn to(mut self, to: Address) -> Self {
		self.request.to = to;
		self
	}

	pub fn data(mut self, data: impl Into<Bytes>) -> Self {
		self.request.data = data.into();
		self
	}

	pub fn value(mut self, value: U256) -> Self {
		self.request.value = value;
		self
	}

	pub fn nonce(mut self, nonce: u64) -> Self {
		self.request.nonce = nonce;
		self
	}

	pub fn gas_price(mut self, gas_price: u128) -> Self {
		self.request.gas_price = gas_price;
		self
	}

	pub fn gas_limit(mut self, gas_limit: u64) -> Self {
		self.request.gas_limit = gas_limit;
		self
	}

	pub fn chain_id(mut self, chain_id: u64) -> Self {
		self.request.chain_id = chain_id;
		self
	}

	pub fn build(self) -> TransactionRequest {
		self.request
	}
}
