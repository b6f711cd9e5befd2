//! Process configuration read from the environment

use std::path::PathBuf;

use crate::catalog::UnknownKeyPolicy;

/// Base64-encoded 32-byte master key
pub const MASTER_KEY_ENV: &str = "SETTINGS_ENCRYPTION_KEY";
/// Runtime mode: development-like values are listed in `RuntimeMode::parse`
pub const RUNTIME_ENV: &str = "APP_ENV";
pub const DB_PATH_ENV: &str = "SETTINGS_DB_PATH";
pub const WORKERS_ENV: &str = "SETTINGS_WORKERS";
pub const UNKNOWN_KEYS_ENV: &str = "SETTINGS_UNKNOWN_KEYS";

const DEFAULT_DB_PATH: &str = "./data/settings.db";
const DEFAULT_WORKERS: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeMode {
	Production,
	Development,
}

impl RuntimeMode {
	/// Anything not explicitly development-like counts as production.
	pub fn parse(value: Option<&str>) -> RuntimeMode {
		match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
			Some("development" | "dev" | "test" | "local") => RuntimeMode::Development,
			_ => RuntimeMode::Production,
		}
	}
}

#[derive(Clone, Debug)]
pub struct VaultConfig {
	/// Raw base64 master key, if provided
	pub master_key: Option<String>,
	pub mode: RuntimeMode,
	pub db_path: PathBuf,
	pub worker_threads: usize,
	pub unknown_keys: UnknownKeyPolicy,
}

impl VaultConfig {
	pub fn from_env() -> Self {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Build the configuration from an arbitrary variable lookup
	pub fn from_lookup<F>(lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		let master_key = lookup(MASTER_KEY_ENV).filter(|v| !v.trim().is_empty());
		let mode = RuntimeMode::parse(lookup(RUNTIME_ENV).as_deref());
		let db_path =
			PathBuf::from(lookup(DB_PATH_ENV).unwrap_or_else(|| DEFAULT_DB_PATH.to_string()));
		let worker_threads = lookup(WORKERS_ENV)
			.and_then(|v| v.trim().parse::<usize>().ok())
			.filter(|n| *n > 0)
			.unwrap_or(DEFAULT_WORKERS);
		let unknown_keys = match lookup(UNKNOWN_KEYS_ENV).as_deref().map(str::trim) {
			Some("allow-plain") => UnknownKeyPolicy::AllowPlain,
			_ => UnknownKeyPolicy::Reject,
		};

		Self { master_key, mode, db_path, worker_threads, unknown_keys }
	}

	/// Development configuration without a master key, mostly for tests
	pub fn development() -> Self {
		Self::from_lookup(|name| (name == RUNTIME_ENV).then(|| "development".to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> =
			vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
		move |name| map.get(name).cloned()
	}

	#[test]
	fn test_runtime_mode_fails_closed() {
		assert_eq!(RuntimeMode::parse(None), RuntimeMode::Production);
		assert_eq!(RuntimeMode::parse(Some("")), RuntimeMode::Production);
		assert_eq!(RuntimeMode::parse(Some("staging")), RuntimeMode::Production);
		assert_eq!(RuntimeMode::parse(Some("Development")), RuntimeMode::Development);
		assert_eq!(RuntimeMode::parse(Some(" test ")), RuntimeMode::Development);
	}

	#[test]
	fn test_defaults() {
		let config = VaultConfig::from_lookup(lookup_from(&[]));
		assert!(config.master_key.is_none());
		assert_eq!(config.mode, RuntimeMode::Production);
		assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
		assert_eq!(config.worker_threads, DEFAULT_WORKERS);
		assert_eq!(config.unknown_keys, UnknownKeyPolicy::Reject);
	}

	#[test]
	fn test_values_from_lookup() {
		let config = VaultConfig::from_lookup(lookup_from(&[
			(MASTER_KEY_ENV, "a2V5"),
			(RUNTIME_ENV, "dev"),
			(DB_PATH_ENV, "/tmp/s.db"),
			(WORKERS_ENV, "4"),
			(UNKNOWN_KEYS_ENV, "allow-plain"),
		]));
		assert_eq!(config.master_key.as_deref(), Some("a2V5"));
		assert_eq!(config.mode, RuntimeMode::Development);
		assert_eq!(config.db_path, PathBuf::from("/tmp/s.db"));
		assert_eq!(config.worker_threads, 4);
		assert_eq!(config.unknown_keys, UnknownKeyPolicy::AllowPlain);
	}

	#[test]
	fn test_blank_master_key_counts_as_absent() {
		let config = VaultConfig::from_lookup(lookup_from(&[(MASTER_KEY_ENV, "  ")]));
		assert!(config.master_key.is_none());
	}

	#[test]
	fn test_invalid_worker_count_uses_default() {
		let config = VaultConfig::from_lookup(lookup_from(&[(WORKERS_ENV, "0")]));
		assert_eq!(config.worker_threads, DEFAULT_WORKERS);
	}
}

// vim: ts=4
