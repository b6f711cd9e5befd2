//! Settings repository: the persistence façade over a `SettingsAdapter`
//!
//! Encrypted values are sealed before they reach the adapter and opened after
//! they leave it. All key derivation and cipher work runs on the worker pool.

use futures::future::{join_all, try_join_all};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use setvault_types::prelude::*;
use setvault_types::settings_adapter::SettingsAdapter;
use setvault_types::types::{AppSetting, SettingWrite};
use setvault_types::worker::WorkerPool;
use setvault_settings_adapter_sqlite::SettingsAdapterSqlite;

use crate::catalog::{SettingsCatalog, UnknownKeyPolicy};
use crate::config::VaultConfig;
use crate::crypto::{CipherEngine, MasterKeySource};
use crate::mask;
use crate::setup::{SetupStatus, SetupStatusDeriver};

const MAX_KEY_LEN: usize = 128;

/// Per-write overrides of the catalog classification
#[derive(Clone, Debug, Default)]
pub struct SetOptions {
	pub encrypt: Option<bool>,
	pub category: Option<Category>,
	pub description: Option<String>,
}

/// Display-safe view of all settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskedSettings {
	pub values: BTreeMap<String, String>,
	pub configured: BTreeMap<String, bool>,
}

/// Outcome of reading a single setting
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingState {
	Absent,
	Present(String),
	Undecryptable,
}

#[derive(Debug)]
pub struct SettingsRepository {
	adapter: Arc<dyn SettingsAdapter>,
	catalog: Arc<SettingsCatalog>,
	cipher: CipherEngine,
	worker: Arc<WorkerPool>,
	unknown_keys: UnknownKeyPolicy,
}

impl SettingsRepository {
	pub fn new(
		adapter: Arc<dyn SettingsAdapter>,
		catalog: Arc<SettingsCatalog>,
		cipher: CipherEngine,
		worker: Arc<WorkerPool>,
	) -> Self {
		Self { adapter, catalog, cipher, worker, unknown_keys: UnknownKeyPolicy::default() }
	}

	pub fn with_unknown_keys(mut self, policy: UnknownKeyPolicy) -> Self {
		self.unknown_keys = policy;
		self
	}

	/// Build the process-wide repository from configuration
	pub fn from_config(config: &VaultConfig, adapter: Arc<dyn SettingsAdapter>) -> SvResult<Self> {
		let catalog = Arc::new(SettingsCatalog::standard()?);
		let keys = Arc::new(MasterKeySource::new(config));
		let cipher = CipherEngine::new(keys);
		let worker = Arc::new(WorkerPool::new(config.worker_threads));

		info!(
			"Settings repository ready ({} known settings, {} workers, mode {:?})",
			catalog.len(),
			config.worker_threads,
			config.mode
		);
		Ok(Self::new(adapter, catalog, cipher, worker).with_unknown_keys(config.unknown_keys))
	}

	/// Open the SQLite store at `config.db_path` and build the repository on it
	pub async fn open(config: &VaultConfig) -> SvResult<Self> {
		let adapter = SettingsAdapterSqlite::new(&config.db_path).await.map_err(|err| {
			error!("Cannot open settings database {}: {}", config.db_path.display(), err);
			Error::ConfigurationError(format!(
				"cannot open settings database {}: {}",
				config.db_path.display(),
				err.cause()
			))
		})?;
		Self::from_config(config, Arc::new(adapter))
	}

	pub fn catalog(&self) -> &Arc<SettingsCatalog> {
		&self.catalog
	}

	// Reads
	//*******

	/// All settings with encrypted values decrypted. Values that fail to
	/// decrypt are `None`.
	pub async fn get_settings(&self) -> SvResult<BTreeMap<String, Option<String>>> {
		let rows = self.list_rows().await?;
		let opened = self.open_rows(&rows).await?;
		Ok(rows.iter().map(|row| row.key.to_string()).zip(opened).collect())
	}

	/// All settings with secrets masked, plus a configured flag per provider
	pub async fn get_masked_settings(&self) -> SvResult<MaskedSettings> {
		let rows = self.list_rows().await?;
		let opened = self.open_rows(&rows).await?;

		let mut values = BTreeMap::new();
		let mut plain = BTreeMap::new();
		for (row, value) in rows.iter().zip(opened) {
			// Catalog secrets stay masked even if stored plain through an override
			let sensitive =
				row.encrypted || self.catalog.classify(&row.key).is_some_and(|c| c.encrypt);
			let shown = match (&value, sensitive) {
				(Some(v), true) => mask::mask(v),
				(Some(v), false) => v.clone(),
				(None, _) => mask::placeholder(),
			};
			values.insert(row.key.to_string(), shown);
			plain.insert(row.key.to_string(), value);
		}

		Ok(MaskedSettings { values, configured: self.configured_from(&plain) })
	}

	/// Read one setting, distinguishing absent from undecryptable values
	pub async fn read_setting(&self, key: &str) -> SvResult<SettingState> {
		let row = self.adapter.read_setting(key).await.map_err(|err| {
			error!("Failed to read setting '{}': {}", key, err);
			Error::SettingsRetrievalError(err.cause())
		})?;

		match row {
			None => Ok(SettingState::Absent),
			Some(row) => match self.open_row(&row).await? {
				Some(value) => Ok(SettingState::Present(value)),
				None => Ok(SettingState::Undecryptable),
			},
		}
	}

	/// Plaintext of one setting. `None` if missing or undecryptable.
	pub async fn get_decrypted_setting(&self, key: &str) -> SvResult<Option<String>> {
		match self.read_setting(key).await? {
			SettingState::Present(value) => Ok(Some(value)),
			SettingState::Absent | SettingState::Undecryptable => Ok(None),
		}
	}

	// Writes
	//********

	pub async fn set_setting(&self, key: &str, value: &str, options: SetOptions) -> SvResult<()> {
		let write = self.prepare_write(key, value.to_string(), options).await?;

		self.adapter.upsert_setting(&write).await.map_err(|err| {
			error!("Failed to store setting '{}': {}", key, err);
			Error::SettingUpdateError(err.cause())
		})?;

		info!("Setting '{}' updated (encrypted: {})", key, write.encrypted);
		Ok(())
	}

	/// Apply several updates atomically. `None` values are skipped.
	pub async fn update_settings(
		&self,
		updates: BTreeMap<String, Option<String>>,
		actor: Option<&str>,
	) -> SvResult<()> {
		let pending: Vec<(String, String)> = updates
			.into_iter()
			.filter_map(|(key, value)| {
				if value.is_none() {
					debug!("Skipping setting '{}' without value", key);
				}
				value.map(|v| (key, v))
			})
			.collect();

		if pending.is_empty() {
			debug!("No settings to update");
			return Ok(());
		}

		let keys: Vec<String> = pending.iter().map(|(key, _)| key.clone()).collect();

		// Everything is validated and sealed before the transaction starts
		let writes = try_join_all(
			pending
				.into_iter()
				.map(|(key, value)| async move { self.prepare_write(&key, value, SetOptions::default()).await }),
		)
		.await
		.map_err(|err| bulk_error(&err))?;

		self.adapter.upsert_settings(&writes).await.map_err(|err| {
			error!("Failed to store settings {:?}: {}", keys, err);
			bulk_error(&err)
		})?;

		info!("Settings updated by {}: {:?}", actor.unwrap_or("system"), keys);
		Ok(())
	}

	pub async fn delete_setting(&self, key: &str, actor: Option<&str>) -> SvResult<()> {
		self.adapter.delete_setting(key).await.map_err(|err| {
			warn!("Failed to delete setting '{}': {}", key, err);
			match err {
				Error::NotFound => Error::SettingDeletionError(format!("setting '{}' not found", key)),
				err => Error::SettingDeletionError(err.cause()),
			}
		})?;

		info!("Setting '{}' deleted by {}", key, actor.unwrap_or("system"));
		Ok(())
	}

	// Setup status
	//**************

	/// Whether every required setup step is satisfied
	pub async fn check_setup(&self) -> SvResult<bool> {
		Ok(self.setup_status().await?.is_setup)
	}

	/// Like `check_setup`, but any failure reads as "not set up"
	pub async fn is_setup(&self) -> bool {
		match self.check_setup().await {
			Ok(is_setup) => is_setup,
			Err(err) => {
				warn!("Setup check failed, reporting not set up: {}", err);
				false
			}
		}
	}

	pub async fn setup_status(&self) -> SvResult<SetupStatus> {
		let rows: Vec<AppSetting> = self
			.list_rows()
			.await?
			.into_iter()
			.filter(|row| self.catalog.get(&row.key).is_some_and(|def| def.flag.is_some()))
			.collect();
		let opened = self.open_rows(&rows).await?;
		let plain: BTreeMap<String, Option<String>> =
			rows.iter().map(|row| row.key.to_string()).zip(opened).collect();

		let configured = self.configured_from(&plain);
		Ok(SetupStatusDeriver::new(&self.catalog).derive(&configured))
	}

	// Internals
	//***********

	async fn list_rows(&self) -> SvResult<Vec<AppSetting>> {
		self.adapter.list_settings().await.map_err(|err| {
			error!("Failed to list settings: {}", err);
			Error::SettingsRetrievalError(err.cause())
		})
	}

	/// Plaintext of a row. Decryption failures are logged and give `None`;
	/// configuration and worker failures propagate.
	async fn open_row(&self, row: &AppSetting) -> SvResult<Option<String>> {
		if !row.encrypted {
			return Ok(Some(row.value.to_string()));
		}

		let cipher = self.cipher.clone();
		let value = row.value.clone();
		match self.worker.try_run(move || cipher.decrypt_str(&value)).await {
			Ok(plaintext) => Ok(Some(plaintext)),
			Err(Error::DecryptionError(msg)) => {
				warn!("Failed to decrypt setting '{}': {}", row.key, msg);
				Ok(None)
			}
			Err(err) => Err(err),
		}
	}

	async fn open_rows(&self, rows: &[AppSetting]) -> SvResult<Vec<Option<String>>> {
		join_all(rows.iter().map(|row| self.open_row(row))).await.into_iter().collect()
	}

	/// One flag per catalog flag: true iff the backing value is readable and
	/// non-empty
	fn configured_from(&self, plain: &BTreeMap<String, Option<String>>) -> BTreeMap<String, bool> {
		let mut configured = BTreeMap::new();
		for def in self.catalog.list() {
			if let Some(flag) = &def.flag {
				let present = matches!(plain.get(&def.key), Some(Some(v)) if !v.is_empty());
				let entry = configured.entry(flag.clone()).or_insert(false);
				*entry = *entry || present;
			}
		}
		configured
	}

	/// Classify, validate and (if needed) encrypt a value into a row write
	async fn prepare_write(
		&self,
		key: &str,
		value: String,
		options: SetOptions,
	) -> SvResult<SettingWrite> {
		if key.is_empty() || key.len() > MAX_KEY_LEN {
			return Err(Error::ValidationError(format!(
				"Setting key must be 1 to {} bytes",
				MAX_KEY_LEN
			)));
		}

		let (encrypt, category, description) = match self.catalog.get(key) {
			Some(def) => {
				def.validate(&value)?;
				(
					options.encrypt.unwrap_or(def.encrypt),
					options.category.unwrap_or(def.category),
					Some(options.description.unwrap_or_else(|| def.description.clone())),
				)
			}
			None => {
				let encrypt = match (options.encrypt, self.unknown_keys) {
					(Some(encrypt), _) => encrypt,
					(None, UnknownKeyPolicy::AllowPlain) => false,
					(None, UnknownKeyPolicy::Reject) => {
						warn!("Rejected write to unknown setting '{}'", key);
						return Err(Error::ValidationError(format!("Unknown setting: {}", key)));
					}
				};
				(encrypt, options.category.unwrap_or(Category::Ui), options.description)
			}
		};

		let stored = if encrypt {
			let cipher = self.cipher.clone();
			self.worker.try_run(move || cipher.encrypt_to_string(&value)).await?
		} else {
			value
		};

		Ok(SettingWrite {
			key: key.into(),
			value: stored.into(),
			encrypted: encrypt,
			category,
			description: description.map(Into::into),
		})
	}
}

fn bulk_error(err: &Error) -> Error {
	match err {
		Error::ConfigurationError(_) => err.clone(),
		err => Error::BulkUpdateError(err.cause()),
	}
}

// vim: ts=4
