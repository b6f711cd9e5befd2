//! SQLite implementation of the setvault `SettingsAdapter`

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};
use std::path::Path;

use setvault::prelude::*;
use setvault::settings_adapter::SettingsAdapter;
use setvault::types::{AppSetting, SettingWrite};

mod schema;
mod setting;
mod utils;

use crate::utils::{db_err, inspect};

#[derive(Debug)]
pub struct SettingsAdapterSqlite {
	db: SqlitePool,
}

impl SettingsAdapterSqlite {
	/// Open (or create) the database at `path` and bring its schema up to date
	pub async fn new(path: impl AsRef<Path>) -> SvResult<Self> {
		if let Some(dir) = path.as_ref().parent().filter(|dir| !dir.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(dir)
				.await
				.map_err(|err| Error::DbError(format!("cannot create {}: {}", dir.display(), err)))?;
		}

		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path.as_ref())
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(inspect)
			.map_err(db_err)?;

		schema::init_db(&db).await.inspect_err(inspect).map_err(db_err)?;
		info!("Settings database ready at {}", path.as_ref().display());

		Ok(Self { db })
	}
}

#[async_trait]
impl SettingsAdapter for SettingsAdapterSqlite {
	async fn list_settings(&self) -> SvResult<Vec<AppSetting>> {
		setting::list(&self.db).await
	}

	async fn read_setting(&self, key: &str) -> SvResult<Option<AppSetting>> {
		setting::read(&self.db, key).await
	}

	async fn upsert_setting(&self, setting: &SettingWrite) -> SvResult<()> {
		setting::upsert(&self.db, setting).await
	}

	async fn upsert_settings(&self, settings: &[SettingWrite]) -> SvResult<()> {
		setting::upsert_many(&self.db, settings).await
	}

	async fn delete_setting(&self, key: &str) -> SvResult<()> {
		setting::delete(&self.db, key).await
	}
}

// vim: ts=4
