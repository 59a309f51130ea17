//! Command-line front end for the identity dApp.
//!
//! The binary wires a [`dapp_core::DappEngine`] from a TOML file, connects the
//! configured wallet and runs one operation per invocation. Notices published
//! by the core are printed as they arrive.

pub mod approval;
pub mod cli;

use anyhow::{Context, Result};
use dapp_config::Config;
use std::path::Path;

/// Default log filter when neither `--log-level` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "dapp_cli=info,dapp_core=info,warn";

/// Loads the configuration and applies the `--account` override.
pub async fn load_config(path: &Path, account: Option<usize>) -> Result<Config> {
	let mut config = Config::from_file(path)
		.await
		.with_context(|| format!("Failed to load config from {}", path.display()))?;

	if let Some(index) = account {
		config.wallet.default_account = index;
		config
			.validate()
			.with_context(|| format!("Invalid --account {index}"))?;
	}

	Ok(config)
}
