//! Bulk upserts are all-or-nothing

#![allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]

use setvault::prelude::*;
use setvault::settings_adapter::SettingsAdapter;
use setvault::types::SettingWrite;
use setvault_settings_adapter_sqlite::SettingsAdapterSqlite;
use tempfile::TempDir;

fn write(key: &str, value: &str) -> SettingWrite {
	SettingWrite {
		key: key.into(),
		value: value.into(),
		encrypted: false,
		category: Category::Integration,
		description: None,
	}
}

#[tokio::test]
async fn test_bulk_upsert_commits_all() {
	let tmp_dir = TempDir::new().unwrap();
	let adapter = SettingsAdapterSqlite::new(tmp_dir.path().join("settings.db")).await.unwrap();

	let batch = [write("zotero_user_id", "42"), write("unpaywall_email", "me@example.org")];
	adapter.upsert_settings(&batch).await.unwrap();

	assert_eq!(adapter.list_settings().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_bulk_upsert_rolls_back_on_constraint_violation() {
	let tmp_dir = TempDir::new().unwrap();
	let adapter = SettingsAdapterSqlite::new(tmp_dir.path().join("settings.db")).await.unwrap();

	adapter.upsert_setting(&write("zotero_user_id", "1")).await.unwrap();

	// Second row violates the key length check after the first was written
	let batch = [write("zotero_user_id", "2"), write("", "broken"), write("theme", "dark")];
	let res = adapter.upsert_settings(&batch).await;
	assert!(matches!(res, Err(Error::DbError(_))));

	let rows = adapter.list_settings().await.unwrap();
	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].value.as_ref(), "1");
}

#[tokio::test]
async fn test_empty_batch_is_noop() {
	let tmp_dir = TempDir::new().unwrap();
	let adapter = SettingsAdapterSqlite::new(tmp_dir.path().join("settings.db")).await.unwrap();

	adapter.upsert_settings(&[]).await.unwrap();
	assert!(adapter.list_settings().await.unwrap().is_empty());
}

// vim: ts=4
