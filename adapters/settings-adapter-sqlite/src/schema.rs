//! Database schema initialization and migrations

use sqlx::{Sqlite, SqlitePool, Transaction};

use setvault::prelude::*;

/// Get the current database version from vars table
async fn get_db_version(tx: &mut Transaction<'_, Sqlite>) -> i64 {
	sqlx::query_scalar::<_, String>("SELECT value FROM vars WHERE key = 'db_version'")
		.fetch_optional(&mut **tx)
		.await
		.ok()
		.flatten()
		.and_then(|v| v.parse().ok())
		.unwrap_or(0)
}

/// Set the database version in vars table
async fn set_db_version(tx: &mut Transaction<'_, Sqlite>, version: i64) -> Result<(), sqlx::Error> {
	sqlx::query("INSERT OR REPLACE INTO vars (key, value) VALUES ('db_version', ?)")
		.bind(version.to_string())
		.execute(&mut **tx)
		.await?;
	Ok(())
}

// Current schema version - update this when adding new migrations
pub(crate) const CURRENT_DB_VERSION: i64 = 1;

/// Initialize the database schema and run migrations
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Create vars table first (needed for version tracking)
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS vars (
		key text NOT NULL,
		value text NOT NULL,
		created_at INTEGER DEFAULT (unixepoch()),
		updated_at INTEGER DEFAULT (unixepoch()),
		PRIMARY KEY(key)
	)",
	)
	.execute(&mut *tx)
	.await?;

	let version = get_db_version(&mut tx).await;

	// Settings
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS app_settings (
		key text NOT NULL CHECK (length(key) BETWEEN 1 AND 128),
		value text NOT NULL,
		encrypted integer NOT NULL DEFAULT 0,
		category text NOT NULL DEFAULT 'ui'
			CHECK (category IN ('ai', 'auth', 'integration', 'ui')),
		description text,
		created_at INTEGER NOT NULL DEFAULT (unixepoch()),
		updated_at INTEGER NOT NULL DEFAULT (unixepoch()),
		PRIMARY KEY(key)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_app_settings_category ON app_settings(category)",
	)
	.execute(&mut *tx)
	.await?;

	// Fresh database: the statements above already create the latest schema
	if version == 0 {
		set_db_version(&mut tx, CURRENT_DB_VERSION).await?;
	} else if version > CURRENT_DB_VERSION {
		warn!("Settings database version {} is newer than {}", version, CURRENT_DB_VERSION);
	}

	tx.commit().await?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use sqlx::sqlite::SqlitePoolOptions;

	async fn memory_db() -> SqlitePool {
		SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await.unwrap()
	}

	async fn stored_version(db: &SqlitePool) -> i64 {
		let mut tx = db.begin().await.unwrap();
		get_db_version(&mut tx).await
	}

	#[tokio::test]
	async fn test_fresh_database_gets_current_version() {
		let db = memory_db().await;
		init_db(&db).await.unwrap();
		assert_eq!(stored_version(&db).await, CURRENT_DB_VERSION);

		// Running again on an up-to-date database changes nothing
		init_db(&db).await.unwrap();
		assert_eq!(stored_version(&db).await, CURRENT_DB_VERSION);
	}

	#[tokio::test]
	async fn test_newer_version_is_left_alone() {
		let db = memory_db().await;
		init_db(&db).await.unwrap();
		sqlx::query("UPDATE vars SET value = '7' WHERE key = 'db_version'")
			.execute(&db)
			.await
			.unwrap();

		init_db(&db).await.unwrap();
		assert_eq!(stored_version(&db).await, 7);
	}
}

// vim: ts=4
