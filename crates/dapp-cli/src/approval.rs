//! Interactive approval on the terminal.
//!
//! Stands in for the wallet popup: connection and signing requests are shown
//! and the user answers `y` or `n`. Anything other than a yes is a rejection.

use alloy_primitives::Address;
use async_trait::async_trait;
use dapp_account::ApprovalInterface;
use dapp_types::{format_units, TransactionRequest, NATIVE_DECIMALS};
use std::io::{BufRead, BufReader, Stdin};
use std::sync::{Arc, Mutex};

/// Asks for approval by reading answers from `R`.
pub struct PromptApproval<R> {
	input: Arc<Mutex<R>>,
}

impl PromptApproval<BufReader<Stdin>> {
	pub fn stdin() -> Self {
		Self::new(BufReader::new(std::io::stdin()))
	}
}

impl<R: BufRead + Send + 'static> PromptApproval<R> {
	pub fn new(input: R) -> Self {
		Self {
			input: Arc::new(Mutex::new(input)),
		}
	}

	async fn ask(&self, question: String) -> bool {
		let input = self.input.clone();
		let answer = tokio::task::spawn_blocking(move || {
			println!("{question} [y/N]");
			let mut line = String::new();
			let mut input = match input.lock() {
				Ok(guard) => guard,
				Err(poisoned) => poisoned.into_inner(),
			};
			input.read_line(&mut line).map(|_| line)
		})
		.await;

		match answer {
			Ok(Ok(line)) => is_yes(&line),
			Ok(Err(e)) => {
				tracing::warn!(error = %e, "Could not read approval answer");
				false
			},
			Err(e) => {
				tracing::warn!(error = %e, "Approval prompt task failed");
				false
			},
		}
	}
}

fn is_yes(answer: &str) -> bool {
	matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn describe_transaction(tx: &TransactionRequest) -> String {
	let mut text = format!(
		"Sign transaction from {} to {} (value {}, gas limit {}",
		tx.from,
		tx.to,
		format_units(tx.value, NATIVE_DECIMALS).unwrap_or_else(|_| tx.value.to_string()),
		tx.gas_limit
	);
	if !tx.data.is_empty() {
		text.push_str(&format!(", {} bytes of call data", tx.data.len()));
	}
	text.push_str(")?");
	text
}

#[async_trait]
impl<R: BufRead + Send + 'static> ApprovalInterface for PromptApproval<R> {
	async fn approve_connection(&self, accounts: &[Address]) -> bool {
		let list = accounts
			.iter()
			.map(ToString::to_string)
			.collect::<Vec<_>>()
			.join(", ");
		self.ask(format!("Connect to this site with {list}?")).await
	}

	async fn approve_transaction(&self, tx: &TransactionRequest) -> bool {
		self.ask(describe_transaction(tx)).await
	}
}
