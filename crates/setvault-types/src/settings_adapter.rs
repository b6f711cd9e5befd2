//! Adapter that persists application settings rows.
//!
//! Adapters store opaque values: encryption happens above this layer, so an
//! adapter never sees plaintext of an encrypted setting nor the master key.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;
use crate::types::{AppSetting, SettingWrite};

#[async_trait]
pub trait SettingsAdapter: Debug + Send + Sync {
	/// List every stored row, ordered by key
	async fn list_settings(&self) -> SvResult<Vec<AppSetting>>;

	/// Read a single row
	async fn read_setting(&self, key: &str) -> SvResult<Option<AppSetting>>;

	/// Insert or update a single row. `created_at` survives updates.
	async fn upsert_setting(&self, setting: &SettingWrite) -> SvResult<()>;

	/// Insert or update several rows in one transaction: all of them are
	/// written or none is.
	async fn upsert_settings(&self, settings: &[SettingWrite]) -> SvResult<()>;

	/// Delete a row. Returns `Error::NotFound` if no row had this key.
	async fn delete_setting(&self, key: &str) -> SvResult<()>;
}

// vim: ts=4
