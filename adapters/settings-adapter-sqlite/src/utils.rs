//! Error mapping and row decoding helpers

use sqlx::{Row, sqlite::SqliteRow};

use setvault::prelude::*;
use setvault::types::AppSetting;

/// Log database error for debugging
pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Translate a sqlx error into the adapter error, keeping its message
pub(crate) fn db_err(err: sqlx::Error) -> Error {
	match err {
		sqlx::Error::RowNotFound => Error::NotFound,
		sqlx::Error::Database(db) => Error::DbError(db.message().to_string()),
		err => Error::DbError(err.to_string()),
	}
}

/// Decode one `app_settings` row
pub(crate) fn setting_from_row(row: &SqliteRow) -> Result<AppSetting, sqlx::Error> {
	let category: &str = row.try_get("category")?;
	let category = Category::parse(category).ok_or_else(|| sqlx::Error::ColumnDecode {
		index: "category".into(),
		source: format!("unknown category '{}'", category).into(),
	})?;

	Ok(AppSetting {
		key: row.try_get::<String, _>("key")?.into(),
		value: row.try_get::<String, _>("value")?.into(),
		encrypted: row.try_get("encrypted")?,
		category,
		description: row.try_get::<Option<String>, _>("description")?.map(Into::into),
		created_at: Timestamp(row.try_get("created_at")?),
		updated_at: Timestamp(row.try_get("updated_at")?),
	})
}

/// Collect an iterator of decoded rows, translating errors
pub(crate) fn collect_res<T>(
	iter: impl Iterator<Item = Result<T, sqlx::Error>>,
) -> SvResult<Vec<T>> {
	let mut items = Vec::new();
	for item in iter {
		items.push(item.inspect_err(inspect).map_err(db_err)?);
	}
	Ok(items)
}

// vim: ts=4
