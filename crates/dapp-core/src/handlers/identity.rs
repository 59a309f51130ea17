//! Identity contract operations.
//!
//! Reads the contract's ownership state, funds it, adds additional owners
//! and registers the mint-permission claim. The claim hash doubles as the
//! claim signature, matching what the identity contract checks.

use super::HandlerContext;
use crate::CoreError;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, B256, U256};
use dapp_types::{
	format_units, parse_address, parse_units, Claim, ClaimRecord, ConfirmedTransaction,
	ContractCall, ContractKind, EncodedCall, Notice, NATIVE_DECIMALS,
};
use serde::Serialize;
use std::str::FromStr;
use tracing::instrument;

/// Ownership and balance of an identity contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityState {
	pub address: Address,
	pub owner: Address,
	pub additional_owners_count: U256,
	/// Whether the connected account is an additional owner.
	pub is_owner: bool,
	pub balance: U256,
	pub formatted_balance: String,
}

/// Operations on the user's identity contract.
pub struct IdentityHandler {
	ctx: HandlerContext,
}

impl IdentityHandler {
	pub fn new(ctx: HandlerContext) -> Self {
		Self { ctx }
	}

	fn call(identity: Address, method: &str, args: Vec<DynSolValue>) -> ContractCall {
		ContractCall::new(ContractKind::Identity, identity, method, args)
	}

	#[instrument(skip_all)]
	pub async fn identity_state(&self) -> Result<IdentityState, CoreError> {
		let result = self.read_state().await;
		self.ctx.report("identity_state", result)
	}

	async fn read_state(&self) -> Result<IdentityState, CoreError> {
		let identity = self.ctx.identity_address().await?;
		let (wallet, account) = self.ctx.session.wallet_and_account().await?;

		let owner = self
			.ctx
			.read_address(Self::call(identity, "owner", vec![]))
			.await?;

		let additional_owners_count = self
			.ctx
			.read(Self::call(identity, "additionalOwnersCount", vec![]))
			.await?
			.first()
			.and_then(DynSolValue::as_uint)
			.map(|(count, _)| count)
			.ok_or_else(|| {
				CoreError::AbiMismatch("additionalOwnersCount did not return a uint".to_string())
			})?;

		let is_owner = self
			.ctx
			.read(Self::call(
				identity,
				"additionalOwners",
				vec![DynSolValue::Address(account)],
			))
			.await?
			.first()
			.and_then(DynSolValue::as_bool)
			.ok_or_else(|| {
				CoreError::AbiMismatch("additionalOwners did not return a bool".to_string())
			})?;

		let balance = wallet.balance(identity).await?;

		Ok(IdentityState {
			address: identity,
			owner,
			additional_owners_count,
			is_owner,
			balance,
			formatted_balance: format_units(balance, NATIVE_DECIMALS)?,
		})
	}

	/// Sends `value` native units to the identity contract.
	///
	/// An empty value sends zero.
	#[instrument(skip_all, fields(value = %value))]
	pub async fn fund(&self, value: &str) -> Result<ConfirmedTransaction, CoreError> {
		let result = self.fund_inner(value).await;
		self.ctx.report("fund", result)
	}

	async fn fund_inner(&self, value: &str) -> Result<ConfirmedTransaction, CoreError> {
		let identity = self.ctx.identity_address().await?;
		let display = if value.trim().is_empty() {
			"0"
		} else {
			value.trim()
		};
		let amount = parse_units(display, NATIVE_DECIMALS)?;

		let transfer = EncodedCall {
			to: identity,
			data: Bytes::new(),
		};
		let confirmed = self.ctx.send(&transfer, amount, None).await?;

		tracing::info!(%identity, %amount, tx_hash = %confirmed.hash, "Identity funded");
		self.ctx.notify(Notice::success(format!(
			"Success send {} {} to {}",
			display, self.ctx.settings.native_symbol, identity
		)));
		Ok(confirmed)
	}

	/// Adds `owner` as an additional owner and returns the refreshed state.
	#[instrument(skip_all, fields(owner = %owner))]
	pub async fn add_owner(&self, owner: &str) -> Result<IdentityState, CoreError> {
		let result = self.add_owner_inner(owner).await;
		self.ctx.report("add_owner", result)
	}

	async fn add_owner_inner(&self, owner: &str) -> Result<IdentityState, CoreError> {
		let identity = self.ctx.identity_address().await?;
		let owner = parse_address(owner.trim()).map_err(CoreError::InvalidAddress)?;

		let call = Self::call(
			identity,
			"addAdditionalOwner",
			vec![DynSolValue::Address(owner)],
		)
		.encode()?;
		let confirmed = self.ctx.send(&call, U256::ZERO, None).await?;

		tracing::info!(%identity, %owner, tx_hash = %confirmed.hash, "Additional owner added");
		self.ctx.notify(Notice::success("Success add owner"));

		self.read_state().await
	}

	/// Hash of the mint-permission claim for the active account.
	#[instrument(skip_all)]
	pub async fn sign_claim(&self) -> Result<B256, CoreError> {
		let result = self.claim_record().await.map(|record| record.hash());
		if let Ok(hash) = &result {
			tracing::debug!(claim_hash = %hash, "Claim hash computed");
		}
		self.ctx.report("sign_claim", result)
	}

	async fn claim_record(&self) -> Result<ClaimRecord, CoreError> {
		let identity = self.ctx.identity_address().await?;
		let account = self
			.ctx
			.session
			.account()
			.await
			.ok_or_else(|| CoreError::NoProvider("No wallet connected".to_string()))?;
		Ok(ClaimRecord::mint_permission(account, identity))
	}

	/// Registers the mint-permission claim on the identity.
	///
	/// Without an explicit signature the claim hash is used, as produced by
	/// [`sign_claim`](Self::sign_claim).
	#[instrument(skip_all)]
	pub async fn add_claim(
		&self,
		signature: Option<&str>,
	) -> Result<ConfirmedTransaction, CoreError> {
		let result = self.add_claim_inner(signature).await;
		self.ctx.report("add_claim", result)
	}

	async fn add_claim_inner(
		&self,
		signature: Option<&str>,
	) -> Result<ConfirmedTransaction, CoreError> {
		let record = self.claim_record().await?;
		let signature = match signature {
			Some(signature) => Bytes::from_str(signature.trim())
				.map_err(|e| CoreError::InvalidInput(format!("Invalid signature: {e}")))?,
			None => Bytes::from(record.hash().to_vec()),
		};
		let identity = record.to();
		let claim = Claim::new(record, signature);

		let call = Self::call(identity, "addClaim", vec![claim.to_sol_value()]).encode()?;
		let confirmed = self.ctx.send(&call, U256::ZERO, None).await?;

		tracing::info!(%identity, tx_hash = %confirmed.hash, "Claim added");
		self.ctx.notify(Notice::success("Claim added"));
		Ok(confirmed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::handlers::tests::*;
	use dapp_account::{AccountError, MockWalletInterface};
	use dapp_delivery::MockDeliveryInterface;
	use dapp_types::{selector, NoticeLevel, MINT_PERMISSION_IDENTIFIER};

	fn identity_reads(wallet: &mut MockWalletInterface) {
		answer_calls(
			wallet,
			vec![
				("owner()", DynSolValue::Address(TEMPLATE)),
				("additionalOwnersCount()", DynSolValue::Uint(U256::from(2u8), 256)),
				("additionalOwners(address)", DynSolValue::Bool(true)),
			],
		);
		wallet
			.expect_balance()
			.returning(|_| Box::pin(async { Ok(U256::from(1_500_000_000_000_000_000u128)) }));
	}

	#[tokio::test]
	async fn test_identity_state() {
		let mut wallet = MockWalletInterface::new();
		identity_reads(&mut wallet);
		let h = harness(wallet, MockDeliveryInterface::new()).await;
		h.ctx.registry.set(&USER_IDENTITY.to_string()).await.unwrap();

		let state = IdentityHandler::new(h.ctx).identity_state().await.unwrap();
		assert_eq!(state.address, USER_IDENTITY);
		assert_eq!(state.owner, TEMPLATE);
		assert_eq!(state.additional_owners_count, U256::from(2u8));
		assert!(state.is_owner);
		assert_eq!(state.formatted_balance, "1.5");
	}

	#[tokio::test]
	async fn test_fund_empty_value_sends_zero() {
		let mut wallet = MockWalletInterface::new();
		wallet
			.expect_sign_and_send()
			.withf(|tx| tx.to == USER_IDENTITY && tx.value == U256::ZERO && tx.data.is_empty())
			.times(1)
			.returning(|_| Box::pin(async { Ok(TX_HASH) }));
		let h = harness(wallet, confirming_delivery(vec![])).await;
		h.ctx.registry.set(&USER_IDENTITY.to_string()).await.unwrap();
		let mut notices = h.notices;

		IdentityHandler::new(h.ctx).fund("").await.unwrap();
		let notice = notices.recv().await.unwrap();
		assert_eq!(
			notice.message,
			format!("Success send 0 MATIC to {USER_IDENTITY}")
		);
	}

	#[tokio::test]
	async fn test_fund_parses_display_units() {
		let mut wallet = MockWalletInterface::new();
		wallet
			.expect_sign_and_send()
			.withf(|tx| tx.value == U256::from(250_000_000_000_000_000u128) && tx.gas_limit == 90_000)
			.times(1)
			.returning(|_| Box::pin(async { Ok(TX_HASH) }));
		let h = harness(wallet, confirming_delivery(vec![])).await;
		h.ctx.registry.set(&USER_IDENTITY.to_string()).await.unwrap();

		let confirmed = IdentityHandler::new(h.ctx).fund("0.25").await.unwrap();
		assert_eq!(confirmed.block_number, 7);
	}

	#[tokio::test]
	async fn test_fund_without_identity() {
		let mut wallet = MockWalletInterface::new();
		wallet.expect_sign_and_send().times(0);
		let mut h = harness(wallet, MockDeliveryInterface::new()).await;

		let result = IdentityHandler::new(h.ctx.clone()).fund("1").await;
		assert!(matches!(result, Err(CoreError::InvalidInput(_))));
		assert_eq!(
			h.notices.recv().await.unwrap(),
			Notice::error("Invalid input: No identity contract provided")
		);
	}

	#[tokio::test]
	async fn test_rejected_fund_leaves_log_unchanged() {
		let mut wallet = MockWalletInterface::new();
		wallet.expect_sign_and_send().returning(|_| {
			Box::pin(async { Err(AccountError::UserRejected("declined".into())) })
		});
		let mut h = harness(wallet, confirming_delivery(vec![])).await;
		h.ctx.registry.set(&USER_IDENTITY.to_string()).await.unwrap();
		let before = h.ctx.session.state().snapshot();

		let result = IdentityHandler::new(h.ctx.clone()).fund("1").await;
		assert!(matches!(result, Err(CoreError::UserRejected(_))));
		assert_eq!(h.ctx.session.state().snapshot(), before);
		assert_eq!(h.notices.recv().await.unwrap().level, NoticeLevel::Error);
	}

	#[tokio::test]
	async fn test_add_owner_rejects_bad_address() {
		let mut wallet = MockWalletInterface::new();
		wallet.expect_sign_and_send().times(0);
		let h = harness(wallet, MockDeliveryInterface::new()).await;
		h.ctx.registry.set(&USER_IDENTITY.to_string()).await.unwrap();

		let result = IdentityHandler::new(h.ctx).add_owner("0x1234").await;
		assert!(matches!(result, Err(CoreError::InvalidAddress(_))));
	}

	#[tokio::test]
	async fn test_add_owner_then_refreshes_state() {
		let mut wallet = MockWalletInterface::new();
		identity_reads(&mut wallet);
		let add_owner_selector = selector("addAdditionalOwner(address)");
		wallet
			.expect_sign_and_send()
			.withf(move |tx| tx.data.starts_with(add_owner_selector.as_slice()))
			.times(1)
			.returning(|_| Box::pin(async { Ok(TX_HASH) }));
		let h = harness(wallet, confirming_delivery(vec![])).await;
		h.ctx.registry.set(&USER_IDENTITY.to_string()).await.unwrap();

		let state = IdentityHandler::new(h.ctx)
			.add_owner(&ALICE.to_string())
			.await
			.unwrap();
		assert!(state.is_owner);
	}

	#[tokio::test]
	async fn test_sign_claim_matches_packed_hash() {
		let h = harness(MockWalletInterface::new(), MockDeliveryInterface::new()).await;
		h.ctx.registry.set(&USER_IDENTITY.to_string()).await.unwrap();

		let hash = IdentityHandler::new(h.ctx).sign_claim().await.unwrap();
		let record = ClaimRecord::new(
			MINT_PERMISSION_IDENTIFIER,
			ALICE,
			USER_IDENTITY,
			Bytes::from(vec![0u8; 32]),
		);
		assert_eq!(hash, record.hash());
	}

	#[tokio::test]
	async fn test_add_claim_uses_claim_hash_as_signature() {
		let expected_hash = ClaimRecord::mint_permission(ALICE, USER_IDENTITY).hash();
		let mut wallet = MockWalletInterface::new();
		let add_claim_selector = selector("addClaim((string,address,address,bytes,bytes))");
		wallet
			.expect_sign_and_send()
			.withf(move |tx| {
				tx.to == USER_IDENTITY
					&& tx.data.starts_with(add_claim_selector.as_slice())
					&& tx
						.data
						.windows(32)
						.any(|window| window == expected_hash.as_slice())
			})
			.times(1)
			.returning(|_| Box::pin(async { Ok(TX_HASH) }));
		let h = harness(wallet, confirming_delivery(vec![])).await;
		h.ctx.registry.set(&USER_IDENTITY.to_string()).await.unwrap();

		IdentityHandler::new(h.ctx).add_claim(None).await.unwrap();
	}

	#[tokio::test]
	async fn test_add_claim_rejects_malformed_signature() {
		let mut wallet = MockWalletInterface::new();
		wallet.expect_sign_and_send().times(0);
		let h = harness(wallet, MockDeliveryInterface::new()).await;
		h.ctx.registry.set(&USER_IDENTITY.to_string()).await.unwrap();

		let result = IdentityHandler::new(h.ctx).add_claim(Some("0xzz")).await;
		assert!(matches!(result, Err(CoreError::InvalidInput(_))));
	}
}
