//! Master key provisioning for operators
//!
//! `setvault-keygen` prints a fresh base64 master key on stdout.
//! `setvault-keygen check` verifies the key in `SETTINGS_ENCRYPTION_KEY`.

use std::process::ExitCode;

use setvault::config::MASTER_KEY_ENV;
use setvault::crypto::{MasterKey, generate_master_key};
use tracing::{error, info};

fn check() -> ExitCode {
	let Ok(encoded) = std::env::var(MASTER_KEY_ENV) else {
		error!("{} is not set", MASTER_KEY_ENV);
		return ExitCode::FAILURE;
	};

	match MasterKey::from_base64(&encoded) {
		Ok(_) => {
			info!("{} holds a valid master key", MASTER_KEY_ENV);
			ExitCode::SUCCESS
		}
		Err(err) => {
			error!("{}", err);
			ExitCode::FAILURE
		}
	}
}

fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();

	match std::env::args().nth(1).as_deref() {
		None => {
			println!("{}", generate_master_key());
			info!("Store this key as {}; losing it makes encrypted settings unreadable", MASTER_KEY_ENV);
			ExitCode::SUCCESS
		}
		Some("check") => check(),
		Some(other) => {
			error!("Unknown command '{}' (usage: setvault-keygen [check])", other);
			ExitCode::from(2)
		}
	}
}

// vim: ts=4
