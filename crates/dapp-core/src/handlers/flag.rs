//! Capture-the-flag NFT operations.
//!
//! Minting goes through the user's identity contract: the identity executes
//! `safeMint()` on the flag contract and forwards the mint price from its own
//! balance, so the transaction itself carries no value.

use super::HandlerContext;
use crate::CoreError;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use dapp_types::{selector, ConfirmedTransaction, ContractCall, ContractKind, InfoEntry, Notice};
use tracing::instrument;

/// Reads the flag contract and mints through the identity.
pub struct FlagHandler {
	ctx: HandlerContext,
}

impl FlagHandler {
	pub fn new(ctx: HandlerContext) -> Self {
		Self { ctx }
	}

	/// Owner of the flag contract.
	#[instrument(skip_all)]
	pub async fn flag_owner(&self) -> Result<Address, CoreError> {
		let result = self
			.ctx
			.read_address(ContractCall::new(
				ContractKind::CaptureFlag,
				self.ctx.contracts.capture_flag,
				"owner",
				vec![],
			))
			.await;
		self.ctx.report("flag_owner", result)
	}

	/// Mints the flag through the identity contract and records the result.
	#[instrument(skip_all)]
	pub async fn mint(&self) -> Result<ConfirmedTransaction, CoreError> {
		let result = self.mint_inner().await;
		self.ctx.report("mint", result)
	}

	async fn mint_inner(&self) -> Result<ConfirmedTransaction, CoreError> {
		let identity = self.ctx.identity_address().await?;
		let settings = &self.ctx.settings;

		let call = ContractCall::new(
			ContractKind::Identity,
			identity,
			"execute",
			vec![
				DynSolValue::Uint(U256::ZERO, 256),
				DynSolValue::Address(self.ctx.contracts.capture_flag),
				DynSolValue::Uint(settings.mint_value, 256),
				DynSolValue::Bytes(selector("safeMint()").to_vec()),
			],
		)
		.encode()?;

		let confirmed = self
			.ctx
			.send(&call, U256::ZERO, Some(settings.mint_gas_limit))
			.await?;

		let block_hash = confirmed
			.block_hash
			.map(|hash| hash.to_string())
			.unwrap_or_else(|| confirmed.hash.to_string());
		tracing::info!(tx_hash = %confirmed.hash, %identity, "Flag minted");

		self.ctx
			.session
			.state()
			.append(InfoEntry::other("Mint result", confirmed.hash.to_string()))
			.await?;
		self.ctx
			.notify(Notice::success(format!("Success mint [hash]: {block_hash}")));

		Ok(confirmed)
	}
}
