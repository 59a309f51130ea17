//! Session information log.
//!
//! The log is an ordered, append-only list of `{title, content}` entries shown
//! to the user. One reconciliation rule keeps it from growing across
//! reconnects: after every append, entries whose content is the current
//! account collapse into the newest one. Identity-contract entries carry a
//! contract address, so they never take part in that rule even when the
//! strings happen to match.

use serde::{Deserialize, Serialize};

/// What an information entry describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "title", rename_all = "snake_case")]
pub enum InfoKind {
	/// The connected account.
	Account,
	/// An identity contract address chosen by the user.
	IdentityAdded,
	/// An identity contract deployed through the factory.
	IdentityDeployed,
	/// Anything else, with its own title.
	Other(String),
}

impl InfoKind {
	pub fn title(&self) -> &str {
		match self {
			InfoKind::Account => "Account",
			InfoKind::IdentityAdded => "Identity Contract added!",
			InfoKind::IdentityDeployed => "New Identity Contract",
			InfoKind::Other(title) => title,
		}
	}

	/// Whether the entry names an identity contract.
	pub fn is_identity_contract(&self) -> bool {
		matches!(self, InfoKind::IdentityAdded | InfoKind::IdentityDeployed)
	}
}

/// One line of the information log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoEntry {
	pub kind: InfoKind,
	pub content: String,
}

impl InfoEntry {
	pub fn new(kind: InfoKind, content: impl Into<String>) -> Self {
		Self {
			kind,
			content: content.into(),
		}
	}

	pub fn account(account: impl Into<String>) -> Self {
		Self::new(InfoKind::Account, account)
	}

	pub fn identity_added(address: impl Into<String>) -> Self {
		Self::new(InfoKind::IdentityAdded, address)
	}

	pub fn identity_deployed(address: impl Into<String>) -> Self {
		Self::new(InfoKind::IdentityDeployed, address)
	}

	pub fn other(title: impl Into<String>, content: impl Into<String>) -> Self {
		Self::new(InfoKind::Other(title.into()), content)
	}

	pub fn title(&self) -> &str {
		self.kind.title()
	}

	fn is_tagged_with(&self, account: &str) -> bool {
		!self.kind.is_identity_contract() && self.content.eq_ignore_ascii_case(account)
	}
}

/// Ordered information entries for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InformationLog {
	entries: Vec<InfoEntry>,
}

impl InformationLog {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends an entry and reconciles entries for `current_account`.
	pub fn append(&mut self, entry: InfoEntry, current_account: Option<&str>) {
		self.entries.push(entry);
		if let Some(account) = current_account {
			self.reconcile(account);
		}
	}

	/// Drops all but the newest entry tagged with `account`.
	///
	/// Other entries keep their relative order.
	pub fn reconcile(&mut self, account: &str) {
		if account.is_empty() {
			return;
		}

		let Some(newest) = self.entries.iter().rposition(|e| e.is_tagged_with(account)) else {
			return;
		};

		let mut index = 0;
		self.entries.retain(|entry| {
			let keep = index == newest || !entry.is_tagged_with(account);
			index += 1;
			keep
		});
	}

	pub fn contains(&self, entry: &InfoEntry) -> bool {
		self.entries.contains(entry)
	}

	pub fn entries(&self) -> &[InfoEntry] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Identity contract addresses known to this session, oldest first.
	pub fn identity_contracts(&self) -> Vec<&str> {
		self.entries
			.iter()
			.filter(|e| e.kind.is_identity_contract())
			.map(|e| e.content.as_str())
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const ACCT: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
	const OTHER: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";

	#[test]
	fn test_reconcile_keeps_newest_account_entry() {
		let mut log = InformationLog::new();
		log.append(InfoEntry::other("A", ACCT), None);
		log.append(InfoEntry::other("B", OTHER), None);
		log.append(InfoEntry::other("C", ACCT), None);

		log.append(InfoEntry::other("D", ACCT), Some(ACCT));

		assert_eq!(
			log.entries(),
			&[InfoEntry::other("B", OTHER), InfoEntry::other("D", ACCT)]
		);
	}

	#[test]
	fn test_reconcile_preserves_order_of_other_entries() {
		let mut log = InformationLog::new();
		log.append(InfoEntry::other("first", "x"), Some(ACCT));
		log.append(InfoEntry::account(ACCT), Some(ACCT));
		log.append(InfoEntry::other("second", "y"), Some(ACCT));
		log.append(InfoEntry::account(ACCT), Some(ACCT));
		log.append(InfoEntry::other("third", "z"), Some(ACCT));

		let titles: Vec<_> = log.entries().iter().map(|e| e.title()).collect();
		assert_eq!(titles, vec!["first", "second", "Account", "third"]);
	}

	#[test]
	fn test_reconcile_is_case_insensitive() {
		let mut log = InformationLog::new();
		log.append(InfoEntry::account(ACCT.to_lowercase()), None);
		log.append(InfoEntry::account(ACCT), Some(ACCT));
		assert_eq!(log.len(), 1);
		assert_eq!(log.entries()[0].content, ACCT);
	}

	#[test]
	fn test_identity_entries_survive_reconciliation() {
		let mut log = InformationLog::new();
		log.append(InfoEntry::identity_added(ACCT), None);
		log.append(InfoEntry::account(ACCT), Some(ACCT));
		log.append(InfoEntry::account(ACCT), Some(ACCT));

		assert_eq!(
			log.entries(),
			&[InfoEntry::identity_added(ACCT), InfoEntry::account(ACCT)]
		);
	}

	#[test]
	fn test_no_account_means_plain_append() {
		let mut log = InformationLog::new();
		log.append(InfoEntry::account(ACCT), None);
		log.append(InfoEntry::account(ACCT), None);
		assert_eq!(log.len(), 2);

		log.append(InfoEntry::other("x", "y"), Some(""));
		assert_eq!(log.len(), 3);
	}

	#[test]
	fn test_identity_contracts() {
		let mut log = InformationLog::new();
		log.append(InfoEntry::identity_added(OTHER), None);
		log.append(InfoEntry::account(ACCT), Some(ACCT));
		log.append(
			InfoEntry::identity_deployed("0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0"),
			Some(ACCT),
		);
		assert!(log.contains(&InfoEntry::account(ACCT)));
		assert_eq!(
			log.identity_contracts(),
			vec![OTHER, "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0"]
		);
	}
}
