//! Encrypted application settings.
//!
//! Sensitive settings (API keys, secrets) are stored next to plain ones; the
//! sensitive part is sealed with a per-value key derived from one process
//! master key. The repository also serves masked views for display and
//! derives whether the application's required setup is complete.

pub mod catalog;
pub mod config;
pub mod crypto;
pub mod mask;
pub mod repository;
pub mod setup;

pub use setvault_types::{error, settings_adapter, types, worker};

pub mod prelude {
	pub use crate::catalog::{Classification, SettingsCatalog, UnknownKeyPolicy};
	pub use crate::config::{RuntimeMode, VaultConfig};
	pub use crate::repository::{MaskedSettings, SetOptions, SettingState, SettingsRepository};
	pub use crate::setup::{SetupStatus, SetupStatusDeriver, SetupStep};
	pub use setvault_types::prelude::*;
}

// vim: ts=4
