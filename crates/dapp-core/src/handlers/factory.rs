//! Identity factory operations.

use super::HandlerContext;
use crate::CoreError;
use alloy_primitives::{Address, U256};
use dapp_types::contracts::decode_identity_deployed;
use dapp_types::{ContractCall, ContractKind, InfoEntry, Notice};
use tracing::instrument;

/// Deploys identity contracts through the factory.
pub struct FactoryHandler {
	ctx: HandlerContext,
}

impl FactoryHandler {
	pub fn new(ctx: HandlerContext) -> Self {
		Self { ctx }
	}

	/// Deploys a new identity and records its address.
	///
	/// Only the owner of the template identity contract may deploy.
	///
	/// # Errors
	/// Returns `NotOwner` when the active account does not own the template,
	/// and `Chain` when the receipt carries no `IdentityDeployed` event.
	#[instrument(skip_all)]
	pub async fn deploy_identity(&self) -> Result<Address, CoreError> {
		let result = self.deploy_inner().await;
		self.ctx.report("deploy_identity", result)
	}

	async fn deploy_inner(&self) -> Result<Address, CoreError> {
		let account = self
			.ctx
			.session
			.account()
			.await
			.ok_or_else(|| CoreError::NoProvider("Web3 is not provided".to_string()))?;

		let owner = self
			.ctx
			.read_address(ContractCall::new(
				ContractKind::Identity,
				self.ctx.contracts.identity,
				"owner",
				vec![],
			))
			.await?;

		if owner != account {
			return Err(CoreError::NotOwner(
				"You're not the owner of the identities factory contract".to_string(),
			));
		}
		self.ctx
			.notify(Notice::info("You're the owner of the identities"));

		let call = ContractCall::new(
			ContractKind::IdentityFactory,
			self.ctx.contracts.identity_factory,
			"deployIdentity",
			vec![],
		)
		.encode()?;
		let confirmed = self.ctx.send(&call, U256::ZERO, None).await?;

		let deployed = decode_identity_deployed(&confirmed.logs).ok_or_else(|| {
			CoreError::Chain(format!(
				"Transaction {} emitted no IdentityDeployed event",
				confirmed.hash
			))
		})?;

		tracing::info!(identity = %deployed, tx_hash = %confirmed.hash, "Identity deployed");
		self.ctx
			.session
			.state()
			.append(InfoEntry::identity_deployed(deployed.to_string()))
			.await?;
		self.ctx
			.notify(Notice::success(format!("New identity contract {deployed}")));

		Ok(deployed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::handlers::tests::*;
	use alloy_dyn_abi::DynSolValue;
	use alloy_primitives::{keccak256, Bytes, B256};
	use dapp_account::MockWalletInterface;
	use dapp_delivery::MockDeliveryInterface;
	use dapp_types::{InfoKind, Log, NoticeLevel};

	fn deployed_log(identity: Address) -> Log {
		let mut data = vec![0u8; 12];
		data.extend_from_slice(identity.as_slice());
		Log {
			address: FACTORY,
			topics: vec![keccak256("IdentityDeployed(address)")],
			data: Bytes::from(data),
		}
	}

	#[tokio::test]
	async fn test_deploy_records_new_identity() {
		let mut wallet = MockWalletInterface::new();
		answer_calls(&mut wallet, vec![("owner()", DynSolValue::Address(ALICE))]);
		wallet
			.expect_sign_and_send()
			.withf(|tx| tx.to == FACTORY)
			.times(1)
			.returning(|_| Box::pin(async { Ok(TX_HASH) }));

		let h = harness(wallet, confirming_delivery(vec![deployed_log(USER_IDENTITY)])).await;
		let deployed = FactoryHandler::new(h.ctx.clone())
			.deploy_identity()
			.await
			.unwrap();

		assert_eq!(deployed, USER_IDENTITY);
		let log = h.ctx.session.state().snapshot().log;
		let last = log.entries().last().unwrap();
		assert_eq!(last.kind, InfoKind::IdentityDeployed);
		assert_eq!(last.content, USER_IDENTITY.to_string());
		assert_eq!(log.identity_contracts(), vec![USER_IDENTITY.to_string()]);
	}

	#[tokio::test]
	async fn test_deploy_requires_template_ownership() {
		let mut wallet = MockWalletInterface::new();
		answer_calls(&mut wallet, vec![("owner()", DynSolValue::Address(TEMPLATE))]);
		wallet.expect_sign_and_send().times(0);

		let mut h = harness(wallet, MockDeliveryInterface::new()).await;
		let before = h.ctx.session.state().snapshot();

		let result = FactoryHandler::new(h.ctx.clone()).deploy_identity().await;
		assert!(matches!(result, Err(CoreError::NotOwner(_))));
		assert_eq!(h.ctx.session.state().snapshot(), before);

		let notice = h.notices.recv().await.unwrap();
		assert_eq!(notice.level, NoticeLevel::Error);
		assert!(notice.message.contains("not the owner"));
	}

	#[tokio::test]
	async fn test_deploy_without_event_is_chain_error() {
		let mut wallet = MockWalletInterface::new();
		answer_calls(&mut wallet, vec![("owner()", DynSolValue::Address(ALICE))]);
		wallet
			.expect_sign_and_send()
			.returning(|_| Box::pin(async { Ok(B256::repeat_byte(0x01)) }));

		let h = harness(wallet, confirming_delivery(vec![])).await;
		let result = FactoryHandler::new(h.ctx).deploy_identity().await;
		assert!(matches!(result, Err(CoreError::Chain(_))));
	}
}
