//! Settings rows
//!
//! Values are opaque here: encrypted rows arrive already sealed.

use sqlx::{Sqlite, SqlitePool};

use setvault::prelude::*;
use setvault::types::{AppSetting, SettingWrite};

use crate::utils::{collect_res, db_err, inspect, setting_from_row};

const UPSERT: &str = "INSERT INTO app_settings (key, value, encrypted, category, description) \
	VALUES (?1, ?2, ?3, ?4, ?5) \
	ON CONFLICT(key) DO UPDATE SET \
		value = excluded.value, \
		encrypted = excluded.encrypted, \
		category = excluded.category, \
		description = COALESCE(excluded.description, app_settings.description), \
		updated_at = unixepoch()";

/// List all settings ordered by key
pub(crate) async fn list(db: &SqlitePool) -> SvResult<Vec<AppSetting>> {
	let rows = sqlx::query(
		"SELECT key, value, encrypted, category, description, created_at, updated_at \
		FROM app_settings ORDER BY key",
	)
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.map_err(db_err)?;

	collect_res(rows.iter().map(setting_from_row))
}

/// Read a single setting by key
pub(crate) async fn read(db: &SqlitePool, key: &str) -> SvResult<Option<AppSetting>> {
	let row = sqlx::query(
		"SELECT key, value, encrypted, category, description, created_at, updated_at \
		FROM app_settings WHERE key = ?",
	)
	.bind(key)
	.fetch_optional(db)
	.await
	.inspect_err(inspect)
	.map_err(db_err)?;

	row.as_ref().map(setting_from_row).transpose().inspect_err(inspect).map_err(db_err)
}

async fn upsert_with<'e, E>(exec: E, setting: &SettingWrite) -> Result<(), sqlx::Error>
where
	E: sqlx::Executor<'e, Database = Sqlite>,
{
	sqlx::query(UPSERT)
		.bind(setting.key.as_ref())
		.bind(setting.value.as_ref())
		.bind(setting.encrypted)
		.bind(setting.category.as_str())
		.bind(setting.description.as_deref())
		.execute(exec)
		.await?;
	Ok(())
}

/// Insert or update a single setting
pub(crate) async fn upsert(db: &SqlitePool, setting: &SettingWrite) -> SvResult<()> {
	upsert_with(db, setting).await.inspect_err(inspect).map_err(db_err)
}

/// Insert or update several settings in one transaction
pub(crate) async fn upsert_many(db: &SqlitePool, settings: &[SettingWrite]) -> SvResult<()> {
	let mut tx = db.begin().await.inspect_err(inspect).map_err(db_err)?;

	for setting in settings {
		// Dropping the transaction on error rolls it back
		upsert_with(&mut *tx, setting).await.inspect_err(inspect).map_err(db_err)?;
	}

	tx.commit().await.inspect_err(inspect).map_err(db_err)?;
	debug!("Committed {} settings", settings.len());
	Ok(())
}

/// Delete a setting
pub(crate) async fn delete(db: &SqlitePool, key: &str) -> SvResult<()> {
	let res = sqlx::query("DELETE FROM app_settings WHERE key = ?")
		.bind(key)
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(db_err)?;

	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

// vim: ts=4
