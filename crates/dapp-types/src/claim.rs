//! Claim records recognized by the identity contract.
//!
//! A claim hash must be reproducible bit-for-bit by the contract that
//! verifies it. The fields are packed in the fixed order
//! `(string identifier, address from, address to, bytes data)` and hashed
//! with keccak256, matching `solidityKeccak256` over the same type list.

use crate::utils::conversion::parse_address;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{keccak256, Address, Bytes, B256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of the claim that allows an identity to mint the flag NFT.
pub const MINT_PERMISSION_IDENTIFIER: &str = "nft_mint_allowed";

/// Errors produced while building claims.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimError {
	/// A field could not be encoded for its declared type.
	#[error("Encoding error: {0}")]
	Encoding(String),
}

/// An immutable claim record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimRecord {
	identifier: String,
	from: Address,
	to: Address,
	data: Bytes,
}

impl ClaimRecord {
	/// Creates a claim record from typed fields.
	pub fn new(identifier: impl Into<String>, from: Address, to: Address, data: Bytes) -> Self {
		Self {
			identifier: identifier.into(),
			from,
			to,
			data,
		}
	}

	/// Creates a claim record from caller-supplied address strings.
	///
	/// # Errors
	/// Returns `ClaimError::Encoding` if either address is malformed.
	pub fn parse(
		identifier: impl Into<String>,
		from: &str,
		to: &str,
		data: Bytes,
	) -> Result<Self, ClaimError> {
		let from = parse_address(from).map_err(|e| ClaimError::Encoding(format!("from: {e}")))?;
		let to = parse_address(to).map_err(|e| ClaimError::Encoding(format!("to: {e}")))?;
		Ok(Self::new(identifier, from, to, data))
	}

	/// The claim that lets `to` (an identity contract) mint on behalf of `from`.
	///
	/// The data field is 32 zero bytes, the encoding of an empty bytes32 string.
	pub fn mint_permission(from: Address, identity: Address) -> Self {
		Self::new(
			MINT_PERMISSION_IDENTIFIER,
			from,
			identity,
			Bytes::from(vec![0u8; 32]),
		)
	}

	pub fn identifier(&self) -> &str {
		&self.identifier
	}

	pub fn from(&self) -> Address {
		self.from
	}

	pub fn to(&self) -> Address {
		self.to
	}

	pub fn data(&self) -> &Bytes {
		&self.data
	}

	/// Packed encoding of the record in wire order.
	pub fn encode_packed(&self) -> Vec<u8> {
		(
			self.identifier.clone(),
			self.from,
			self.to,
			self.data.clone(),
		)
			.abi_encode_packed()
	}

	/// The claim hash verified on-chain.
	pub fn hash(&self) -> B256 {
		keccak256(self.encode_packed())
	}
}

/// A claim record together with its signature, as passed to `addClaim`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
	pub record: ClaimRecord,
	pub signature: Bytes,
}

impl Claim {
	pub fn new(record: ClaimRecord, signature: Bytes) -> Self {
		Self { record, signature }
	}

	/// ABI value of the `(string,address,address,bytes,bytes)` claim tuple.
	pub fn to_sol_value(&self) -> DynSolValue {
		DynSolValue::Tuple(vec![
			DynSolValue::String(self.record.identifier.clone()),
			DynSolValue::Address(self.record.from),
			DynSolValue::Address(self.record.to),
			DynSolValue::Bytes(self.record.data.to_vec()),
			DynSolValue::Bytes(self.signature.to_vec()),
		])
	}
}
