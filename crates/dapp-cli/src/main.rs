//! Main binary entry point for the identity dApp CLI.

use anyhow::Result;
use clap::Parser;
use dapp_account::{ApprovalInterface, AutoApprove};
use dapp_cli::{
	approval::PromptApproval,
	cli::{output::Display, Cli, Commands, FlagSubcommand, IdentitySubcommand},
	load_config, DEFAULT_LOG_FILTER,
};
use dapp_core::{CoreError, DappEngine};
use dapp_types::{format_address_short, Notice};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
	let _ = dotenvy::dotenv();

	let cli = Cli::parse();
	init_logging(cli.log_level.as_deref());

	let config = load_config(&cli.config, cli.account).await?;
	let approver: Arc<dyn ApprovalInterface> = if cli.yes {
		Arc::new(AutoApprove)
	} else {
		Arc::new(PromptApproval::stdin())
	};

	let engine = DappEngine::from_config(config, approver).await?;
	let mut notices = engine.subscribe();

	let result = run(&engine, &mut notices, cli.command).await;
	drain(&mut notices);

	match result {
		Ok(()) => Ok(ExitCode::SUCCESS),
		// Already shown as an error notice
		Err(e) => {
			tracing::debug!(error = %e, "Command failed");
			Ok(ExitCode::FAILURE)
		},
	}
}

fn init_logging(level: Option<&str>) {
	use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

	let env_filter = match level {
		Some(level) => EnvFilter::new(level),
		None => EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
	};

	tracing_subscriber::registry()
		.with(
			fmt::layer()
				.with_target(true)
				.with_thread_ids(false)
				.with_file(false)
				.with_line_number(false)
				.compact(),
		)
		.with(env_filter)
		.init();
}

/// Prints every notice published so far.
fn drain(notices: &mut broadcast::Receiver<Notice>) {
	loop {
		match notices.try_recv() {
			Ok(notice) => Display::notice(&notice),
			Err(TryRecvError::Lagged(skipped)) => {
				tracing::warn!(skipped, "Missed notices");
			},
			Err(TryRecvError::Empty | TryRecvError::Closed) => break,
		}
	}
}

async fn run(
	engine: &DappEngine,
	notices: &mut broadcast::Receiver<Notice>,
	command: Commands,
) -> Result<(), CoreError> {
	let symbol = engine.config().network.native_symbol.clone();

	match command {
		Commands::Connect => {
			let account = engine.connect().await?;
			drain(notices);
			Display::success(&format!("Connected {}", format_address_short(account)));
			let info = engine.account_info().await?;
			Display::account_info(&info, &symbol);
			Display::information_log(&engine.session().state().snapshot().log);
		},

		Commands::Disconnect => {
			engine.disconnect().await?;
			Display::success("Disconnected");
		},

		Commands::Log => {
			engine.connect().await?;
			Display::information_log(&engine.session().state().snapshot().log);
		},

		Commands::Watch => {
			engine.connect().await?;
			watch(engine, notices).await;
		},

		Commands::Identity(cmd) => match cmd.command {
			IdentitySubcommand::Show => {
				let identity = engine.registry().get().await?;
				if identity.is_empty() {
					Display::info("No identity contract stored");
				} else {
					Display::kv("Identity", &identity);
				}
			},
			IdentitySubcommand::Set { address } => {
				engine.identity_registry().set_identity(&address).await?;
			},
			IdentitySubcommand::Clear => {
				engine.identity_registry().clear_identity().await?;
			},
			IdentitySubcommand::State => {
				engine.connect().await?;
				let state = engine.identity().identity_state().await?;
				drain(notices);
				Display::identity_state(&state, &symbol);
			},
			IdentitySubcommand::Fund { value } => {
				engine.connect().await?;
				engine.identity().fund(&value).await?;
			},
			IdentitySubcommand::AddOwner { address } => {
				engine.connect().await?;
				let state = engine.identity().add_owner(&address).await?;
				drain(notices);
				Display::identity_state(&state, &symbol);
			},
			IdentitySubcommand::SignClaim => {
				engine.connect().await?;
				let hash = engine.identity().sign_claim().await?;
				Display::kv("Claim hash", &hash.to_string());
			},
			IdentitySubcommand::AddClaim { signature } => {
				engine.connect().await?;
				engine.identity().add_claim(signature.as_deref()).await?;
			},
			IdentitySubcommand::Deploy => {
				engine.connect().await?;
				engine.factory().deploy_identity().await?;
				drain(notices);
				Display::information_log(&engine.session().state().snapshot().log);
			},
		},

		Commands::Flag(cmd) => match cmd.command {
			FlagSubcommand::Owner => {
				engine.connect().await?;
				let owner = engine.flag().flag_owner().await?;
				Display::kv("Flag owner", &owner.to_string());
			},
			FlagSubcommand::Mint => {
				engine.connect().await?;
				engine.flag().mint().await?;
			},
		},
	}

	Ok(())
}

/// Streams notices and log changes until Ctrl-C or disconnection.
async fn watch(engine: &DappEngine, notices: &mut broadcast::Receiver<Notice>) {
	let mut state = engine.session().state().watch();
	drain(notices);
	Display::information_log(&state.borrow_and_update().log);
	Display::info("Watching wallet events, press Ctrl-C to stop");

	loop {
		tokio::select! {
			_ = tokio::signal::ctrl_c() => break,
			notice = notices.recv() => match notice {
				Ok(notice) => Display::notice(&notice),
				Err(RecvError::Lagged(skipped)) => {
					tracing::warn!(skipped, "Missed notices");
				},
				Err(RecvError::Closed) => break,
			},
			changed = state.changed() => {
				if changed.is_err() {
					break;
				}
				let snapshot = state.borrow_and_update().clone();
				Display::information_log(&snapshot.log);
				if !engine.session().is_connected().await {
					Display::warning("Wallet disconnected");
					break;
				}
			},
		}
	}
}
