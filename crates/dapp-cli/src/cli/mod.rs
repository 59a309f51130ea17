//! Command-line interface definitions.

pub mod output;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Identity dApp client.
#[derive(Parser, Debug)]
#[command(name = "identity-dapp")]
#[command(about = "Manage identity contracts, claims and the capture-the-flag NFT")]
#[command(version)]
pub struct Cli {
	#[command(subcommand)]
	pub command: Commands,

	/// Config file path
	#[arg(global = true, long, env = "DAPP_CONFIG", default_value = "config/demo.toml")]
	pub config: PathBuf,

	/// Log filter, overriding RUST_LOG (e.g. "debug" or "dapp_core=trace")
	#[arg(global = true, long)]
	pub log_level: Option<String>,

	/// Index of the configured key to act as
	#[arg(global = true, long)]
	pub account: Option<usize>,

	/// Approve connection and transaction prompts without asking
	#[arg(global = true, short, long)]
	pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Connect the wallet and show account information
	Connect,

	/// Disconnect and forget the cached wallet choice
	Disconnect,

	/// Show the information log of a fresh session
	Log,

	/// Stream notices and log changes until interrupted
	Watch,

	/// Identity contract operations
	Identity(IdentityCommand),

	/// Capture-the-flag NFT operations
	Flag(FlagCommand),
}

#[derive(Args, Debug)]
pub struct IdentityCommand {
	#[command(subcommand)]
	pub command: IdentitySubcommand,
}

#[derive(Subcommand, Debug)]
pub enum IdentitySubcommand {
	/// Show the stored identity contract
	Show,

	/// Store the identity contract to work with
	Set {
		/// Identity contract address
		address: String,
	},

	/// Forget the stored identity contract
	Clear,

	/// Show owner, additional owners and balance
	State,

	/// Send native currency to the identity contract
	Fund {
		/// Amount in display units; empty sends zero
		#[arg(default_value = "")]
		value: String,
	},

	/// Add an additional owner
	AddOwner {
		/// Address of the new owner
		address: String,
	},

	/// Compute the mint-permission claim hash
	SignClaim,

	/// Register the mint-permission claim
	AddClaim {
		/// Claim signature as hex; defaults to the claim hash
		#[arg(long)]
		signature: Option<String>,
	},

	/// Deploy a new identity through the factory
	Deploy,
}

#[derive(Args, Debug)]
pub struct FlagCommand {
	#[command(subcommand)]
	pub command: FlagSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum FlagSubcommand {
	/// Show the flag contract owner
	Owner,

	/// Mint the flag through the identity contract
	Mint,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_identity_set() {
		let cli = Cli::try_parse_from([
			"identity-dapp",
			"--config",
			"local.toml",
			"identity",
			"set",
			"0x5FbDB2315678afecb367f032d93F642f64180aa3",
		])
		.unwrap();

		assert_eq!(cli.config, PathBuf::from("local.toml"));
		match cli.command {
			Commands::Identity(IdentityCommand {
				command: IdentitySubcommand::Set { address },
			}) => assert_eq!(address, "0x5FbDB2315678afecb367f032d93F642f64180aa3"),
			other => panic!("unexpected command {other:?}"),
		}
	}

	#[test]
	fn test_fund_value_defaults_to_empty() {
		let cli = Cli::try_parse_from(["identity-dapp", "identity", "fund"]).unwrap();
		assert!(matches!(
			cli.command,
			Commands::Identity(IdentityCommand {
				command: IdentitySubcommand::Fund { value },
			}) if value.is_empty()
		));
	}

	#[test]
	fn test_global_flags_after_subcommand() {
		let cli = Cli::try_parse_from([
			"identity-dapp",
			"flag",
			"mint",
			"--yes",
			"--account",
			"2",
			"--log-level",
			"debug",
		])
		.unwrap();

		assert!(cli.yes);
		assert_eq!(cli.account, Some(2));
		assert_eq!(cli.log_level.as_deref(), Some("debug"));
		assert!(matches!(
			cli.command,
			Commands::Flag(FlagCommand {
				command: FlagSubcommand::Mint
			})
		));
	}

	#[test]
	fn test_unknown_subcommand_fails() {
		assert!(Cli::try_parse_from(["identity-dapp", "identity", "burn"]).is_err());
	}
}
