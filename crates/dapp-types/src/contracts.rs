//! Contract ABIs and call encoding.
//!
//! The dApp talks to three fixed contracts: the identity contract, the
//! identity factory and the capture-the-flag NFT. Their ABIs are compiled in
//! as human-readable signatures and parsed once. Encoding a call is a pure
//! step: it checks the arguments against the declared signature and produces
//! the selector-prefixed call data, without touching the network.

use crate::delivery::Log;
use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{keccak256, Address, Bytes, FixedBytes};
use alloy_sol_types::{sol, SolEvent};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

sol! {
	/// Emitted by the identity factory for every identity it deploys.
	event IdentityDeployed(address _contract);
}

const IDENTITY_ABI: &[&str] = &[
	"function owner() view returns (address)",
	"function additionalOwnersCount() view returns (uint256)",
	"function additionalOwners(address owner) view returns (bool)",
	"function addAdditionalOwner(address owner)",
	"function execute(uint256 operationType, address to, uint256 value, bytes data) returns (bytes)",
	// (identifier, from, to, data, signature)
	"function addClaim((string,address,address,bytes,bytes) claim)",
];

const IDENTITY_FACTORY_ABI: &[&str] = &[
	"function owner() view returns (address)",
	"function deployIdentity() returns (address)",
	"event IdentityDeployed(address _contract)",
];

const CAPTURE_FLAG_ABI: &[&str] = &[
	"function owner() view returns (address)",
	"function balanceOf(address owner) view returns (uint256)",
	"function safeMint()",
];

static IDENTITY: Lazy<JsonAbi> = Lazy::new(|| parse_abi(IDENTITY_ABI));
static IDENTITY_FACTORY: Lazy<JsonAbi> = Lazy::new(|| parse_abi(IDENTITY_FACTORY_ABI));
static CAPTURE_FLAG: Lazy<JsonAbi> = Lazy::new(|| parse_abi(CAPTURE_FLAG_ABI));

fn parse_abi(signatures: &[&str]) -> JsonAbi {
	JsonAbi::parse(signatures.iter().copied()).expect("static ABI signatures are valid")
}

/// Errors produced while encoding or decoding contract calls.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AbiError {
	/// The contract's ABI has no method with this name.
	#[error("Unknown method {method} on {contract}")]
	UnknownMethod { contract: ContractKind, method: String },
	/// Argument count or types do not match the method signature.
	#[error("ABI mismatch for {method}: {reason}")]
	Mismatch { method: String, reason: String },
	/// Returned data could not be decoded.
	#[error("Failed to decode {method} output: {reason}")]
	Decode { method: String, reason: String },
}

/// The fixed set of contracts the dApp interacts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
	Identity,
	IdentityFactory,
	CaptureFlag,
}

impl ContractKind {
	/// Parsed ABI for this contract.
	pub fn abi(&self) -> &'static JsonAbi {
		match self {
			ContractKind::Identity => &IDENTITY,
			ContractKind::IdentityFactory => &IDENTITY_FACTORY,
			ContractKind::CaptureFlag => &CAPTURE_FLAG,
		}
	}

	fn function(&self, method: &str, arg_count: usize) -> Result<&'static Function, AbiError> {
		let overloads = self
			.abi()
			.function(method)
			.ok_or_else(|| AbiError::UnknownMethod {
				contract: *self,
				method: method.to_string(),
			})?;

		overloads
			.iter()
			.find(|f| f.inputs.len() == arg_count)
			.ok_or_else(|| AbiError::Mismatch {
				method: method.to_string(),
				reason: format!(
					"expected {} argument(s), got {}",
					overloads[0].inputs.len(),
					arg_count
				),
			})
	}

	/// Decodes the return data of `method`.
	pub fn decode_output(
		&self,
		method: &str,
		arg_count: usize,
		data: &[u8],
	) -> Result<Vec<DynSolValue>, AbiError> {
		let function = self.function(method, arg_count)?;
		function
			.abi_decode_output(data)
			.map_err(|e| AbiError::Decode {
				method: method.to_string(),
				reason: e.to_string(),
			})
	}
}

impl fmt::Display for ContractKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ContractKind::Identity => write!(f, "identity"),
			ContractKind::IdentityFactory => write!(f, "identity factory"),
			ContractKind::CaptureFlag => write!(f, "capture flag"),
		}
	}
}

/// Destination and call data of an encoded contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCall {
	pub to: Address,
	pub data: Bytes,
}

/// A method invocation on one of the known contracts.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractCall {
	pub contract: ContractKind,
	pub target: Address,
	pub method: String,
	pub args: Vec<DynSolValue>,
}

impl ContractCall {
	pub fn new(
		contract: ContractKind,
		target: Address,
		method: impl Into<String>,
		args: Vec<DynSolValue>,
	) -> Self {
		Self {
			contract,
			target,
			method: method.into(),
			args,
		}
	}

	/// Encodes selector and arguments.
	///
	/// # Errors
	/// Returns `AbiError::UnknownMethod` if the method is not declared and
	/// `AbiError::Mismatch` if the arguments do not fit its signature.
	pub fn encode(&self) -> Result<EncodedCall, AbiError> {
		let function = self.contract.function(&self.method, self.args.len())?;
		let data = function
			.abi_encode_input(&self.args)
			.map_err(|e| AbiError::Mismatch {
				method: self.method.clone(),
				reason: e.to_string(),
			})?;

		Ok(EncodedCall {
			to: self.target,
			data: Bytes::from(data),
		})
	}

	/// Decodes data returned by this call.
	pub fn decode_output(&self, data: &[u8]) -> Result<Vec<DynSolValue>, AbiError> {
		self.contract
			.decode_output(&self.method, self.args.len(), data)
	}
}

/// First four bytes of the keccak256 hash of a function signature.
pub fn selector(signature: &str) -> FixedBytes<4> {
	FixedBytes::from_slice(&keccak256(signature.as_bytes())[..4])
}

/// Extracts the deployed identity address from factory receipt logs.
///
/// Both the indexed and the non-indexed layout of `_contract` are accepted.
pub fn decode_identity_deployed(logs: &[Log]) -> Option<Address> {
	logs.iter()
		.filter(|log| log.topics.first() == Some(&IdentityDeployed::SIGNATURE_HASH))
		.find_map(|log| {
			if log.data.len() >= 32 {
				Some(Address::from_slice(&log.data[12..32]))
			} else {
				log.topics
					.get(1)
					.map(|topic| Address::from_slice(&topic[12..]))
			}
		})
}
