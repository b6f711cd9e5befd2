//! Shared builders for repository integration tests
//!
//! Every builder returns the `TempDir` alongside the repository so the
//! database lives until the end of the test.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use tempfile::TempDir;

use setvault::catalog::SettingsCatalog;
use setvault::crypto::{CipherEngine, MasterKey, MasterKeySource};
use setvault::prelude::*;
use setvault::settings_adapter::SettingsAdapter;
use setvault::types::{AppSetting, SettingWrite};
use setvault::worker::WorkerPool;
use setvault_settings_adapter_sqlite::SettingsAdapterSqlite;

pub const TEST_KEY: [u8; 32] = [7; 32];

pub fn setup_test_logging() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
		.try_init();
}

pub fn repository_with_key(adapter: Arc<dyn SettingsAdapter>, key: [u8; 32]) -> SettingsRepository {
	let catalog = Arc::new(SettingsCatalog::standard().unwrap());
	let keys = Arc::new(MasterKeySource::with_key(MasterKey::from_bytes(key)));
	let worker = Arc::new(WorkerPool::new(2));
	SettingsRepository::new(adapter, catalog, CipherEngine::new(keys), worker)
}

pub fn repository(adapter: Arc<dyn SettingsAdapter>) -> SettingsRepository {
	repository_with_key(adapter, TEST_KEY)
}

pub async fn sqlite_adapter() -> (Arc<SettingsAdapterSqlite>, TempDir) {
	setup_test_logging();
	let tmp_dir = TempDir::new().unwrap();
	let adapter = SettingsAdapterSqlite::new(tmp_dir.path().join("settings.db")).await.unwrap();
	(Arc::new(adapter), tmp_dir)
}

pub async fn sqlite_repository() -> (SettingsRepository, Arc<SettingsAdapterSqlite>, TempDir) {
	let (adapter, tmp_dir) = sqlite_adapter().await;
	(repository(adapter.clone()), adapter, tmp_dir)
}

/// Adapter whose storage is unreachable
#[derive(Debug)]
pub struct FailingAdapter;

fn unreachable_db() -> Error {
	Error::DbError("unable to open database file".into())
}

#[async_trait]
impl SettingsAdapter for FailingAdapter {
	async fn list_settings(&self) -> SvResult<Vec<AppSetting>> {
		Err(unreachable_db())
	}

	async fn read_setting(&self, _key: &str) -> SvResult<Option<AppSetting>> {
		Err(unreachable_db())
	}

	async fn upsert_setting(&self, _setting: &SettingWrite) -> SvResult<()> {
		Err(unreachable_db())
	}

	async fn upsert_settings(&self, _settings: &[SettingWrite]) -> SvResult<()> {
		Err(unreachable_db())
	}

	async fn delete_setting(&self, _key: &str) -> SvResult<()> {
		Err(unreachable_db())
	}
}

// vim: ts=4
