//! Choosing the identity contract to work with.

use super::HandlerContext;
use crate::CoreError;
use dapp_types::{InfoEntry, Notice};
use tracing::instrument;

/// Stores the user's identity contract choice.
pub struct RegistryHandler {
	ctx: HandlerContext,
}

impl RegistryHandler {
	pub fn new(ctx: HandlerContext) -> Self {
		Self { ctx }
	}

	/// Persists `address` and adds it to the information log.
	#[instrument(skip_all, fields(address = %address))]
	pub async fn set_identity(&self, address: &str) -> Result<String, CoreError> {
		let result = self.set_inner(address).await;
		self.ctx.report("set_identity", result)
	}

	async fn set_inner(&self, address: &str) -> Result<String, CoreError> {
		let stored = self.ctx.registry.set(address).await?;
		self.ctx
			.session
			.state()
			.append(InfoEntry::identity_added(stored.clone()))
			.await?;
		self.ctx
			.notify(Notice::success(format!("Success added {stored}")));
		Ok(stored)
	}

	/// Forgets the stored choice.
	#[instrument(skip_all)]
	pub async fn clear_identity(&self) -> Result<(), CoreError> {
		let result = self.ctx.registry.clear().await;
		if result.is_ok() {
			self.ctx.notify(Notice::info("Identity contract cleared"));
		}
		self.ctx.report("clear_identity", result)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::handlers::tests::*;
	use dapp_account::MockWalletInterface;
	use dapp_delivery::MockDeliveryInterface;
	use dapp_types::{InfoKind, NoticeLevel};

	#[tokio::test]
	async fn test_set_identity_appends_entry() {
		let mut h = harness(MockWalletInterface::new(), MockDeliveryInterface::new()).await;

		let stored = RegistryHandler::new(h.ctx.clone())
			.set_identity(&USER_IDENTITY.to_string().to_lowercase())
			.await
			.unwrap();
		assert_eq!(stored, USER_IDENTITY.to_string());

		let snapshot = h.ctx.session.state().snapshot();
		assert_eq!(snapshot.identity, stored);
		let last = snapshot.log.entries().last().unwrap();
		assert_eq!(last.kind, InfoKind::IdentityAdded);
		assert_eq!(last.content, stored);

		let notice = h.notices.recv().await.unwrap();
		assert_eq!(notice, Notice::success(format!("Success added {stored}")));
	}

	#[tokio::test]
	async fn test_invalid_identity_keeps_prior_value() {
		let mut h = harness(MockWalletInterface::new(), MockDeliveryInterface::new()).await;
		let handler = RegistryHandler::new(h.ctx.clone());
		handler
			.set_identity(&USER_IDENTITY.to_string())
			.await
			.unwrap();
		let _ = h.notices.recv().await;
		let before = h.ctx.session.state().snapshot();

		let result = handler.set_identity("not-an-address").await;
		assert!(matches!(result, Err(CoreError::InvalidAddress(_))));
		assert_eq!(h.ctx.registry.get().await.unwrap(), USER_IDENTITY.to_string());
		assert_eq!(h.ctx.session.state().snapshot(), before);
		assert_eq!(h.notices.recv().await.unwrap().level, NoticeLevel::Error);
	}

	#[tokio::test]
	async fn test_clear_identity() {
		let h = harness(MockWalletInterface::new(), MockDeliveryInterface::new()).await;
		let handler = RegistryHandler::new(h.ctx.clone());
		handler
			.set_identity(&USER_IDENTITY.to_string())
			.await
			.unwrap();
		handler.clear_identity().await.unwrap();
		assert_eq!(h.ctx.registry.get().await.unwrap(), "");
	}
}
