//! Terminal output.
//!
//! Notices from the core are rendered the way toasts were in the browser:
//! one colored line each. Account info and the information log get simple
//! key-value layouts.

use colored::Colorize;
use dapp_core::handlers::IdentityState;
use dapp_types::{AccountInfo, InformationLog, Notice, NoticeLevel};

/// Terminal display helpers.
pub struct Display;

impl Display {
	pub fn header(text: &str) {
		println!("\n{}", text.bold().cyan());
		println!("{}", "─".repeat(text.chars().count()).cyan());
	}

	pub fn success(message: &str) {
		println!("{} {}", "✓".green().bold(), message);
	}

	/// Errors go to stderr.
	pub fn error(message: &str) {
		eprintln!("{} {}", "✗".red().bold(), message.red());
	}

	pub fn warning(message: &str) {
		println!("{} {}", "⚠".yellow().bold(), message.yellow());
	}

	pub fn info(message: &str) {
		println!("{} {}", "ℹ".blue().bold(), message);
	}

	pub fn kv(key: &str, value: &str) {
		println!("  {} {}", format!("{}:", key).bold(), value);
	}

	pub fn notice(notice: &Notice) {
		match notice.level {
			NoticeLevel::Success => Self::success(&notice.message),
			NoticeLevel::Info => Self::info(&notice.message),
			NoticeLevel::Warning => Self::warning(&notice.message),
			NoticeLevel::Error => Self::error(&notice.message),
		}
	}

	pub fn account_info(info: &AccountInfo, symbol: &str) {
		Self::header("Account");
		Self::kv("Address", &info.account.to_string());
		Self::kv("Chain ID", &info.chain_id.to_string());
		Self::kv("Balance", &format!("{} {}", info.formatted_balance, symbol));
	}

	pub fn identity_state(state: &IdentityState, symbol: &str) {
		Self::header("Identity");
		Self::kv("Contract", &state.address.to_string());
		Self::kv("Owner", &state.owner.to_string());
		Self::kv("Additional owners", &state.additional_owners_count.to_string());
		Self::kv("You are an owner", if state.is_owner { "yes" } else { "no" });
		Self::kv("Balance", &format!("{} {}", state.formatted_balance, symbol));
	}

	pub fn information_log(log: &InformationLog) {
		Self::header("Information");
		if log.is_empty() {
			println!("  {}", "Please connect a wallet".dimmed());
			return;
		}
		for line in log_lines(log) {
			println!("  {}", line);
		}
	}
}

/// One `title: content` line per log entry.
pub fn log_lines(log: &InformationLog) -> Vec<String> {
	log.entries()
		.iter()
		.map(|entry| format!("{}: {}", entry.title(), entry.content))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use dapp_types::InfoEntry;

	#[test]
	fn test_log_lines() {
		let mut log = InformationLog::new();
		log.append(
			InfoEntry::identity_added("0x5FbDB2315678afecb367f032d93F642f64180aa3"),
			None,
		);
		log.append(InfoEntry::account("0x70997970C51812dc3A010C7d01b50e0d17dc79C8"), None);

		assert_eq!(
			log_lines(&log),
			vec![
				"Identity Contract added!: 0x5FbDB2315678afecb367f032d93F642f64180aa3",
				"Account: 0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
			]
		);
	}

	#[test]
	fn test_empty_log_has_no_lines() {
		assert!(log_lines(&InformationLog::new()).is_empty());
	}
}
