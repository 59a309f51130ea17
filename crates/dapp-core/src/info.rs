//! Account and network information.

use crate::session::Session;
use crate::CoreError;
use dapp_types::{format_units, AccountInfo, NATIVE_DECIMALS};

/// Reads the active account, its chain and native balance.
///
/// Read-only: nothing is cached or published here.
///
/// # Errors
/// Returns `NoProvider` when no wallet is connected and `Network` when the
/// wallet cannot reach its node.
pub async fn read_account_info(session: &Session) -> Result<AccountInfo, CoreError> {
	let wallet = session.wallet().await?;

	let accounts = wallet.accounts().await?;
	let account = *accounts
		.first()
		.ok_or_else(|| CoreError::NoProvider("Wallet exposed no accounts".to_string()))?;
	let chain_id = wallet.chain_id().await?;
	let balance = wallet.balance(account).await?;

	tracing::debug!(%account, chain_id, %balance, "Read account info");

	Ok(AccountInfo {
		account,
		chain_id,
		balance,
		formatted_balance: format_units(balance, NATIVE_DECIMALS)?,
	})
}
