//! Data model of the settings table

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

// Timestamp //
//***********//
/// Unix timestamp in seconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Timestamp {
		let res = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
		Timestamp(i64::try_from(res.as_secs()).unwrap_or(i64::MAX))
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

// Category //
//**********//
/// Display grouping of a setting. Not security relevant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
	Ai,
	Auth,
	Integration,
	Ui,
}

impl Category {
	pub fn as_str(self) -> &'static str {
		match self {
			Category::Ai => "ai",
			Category::Auth => "auth",
			Category::Integration => "integration",
			Category::Ui => "ui",
		}
	}

	pub fn parse(s: &str) -> Option<Category> {
		match s {
			"ai" => Some(Category::Ai),
			"auth" => Some(Category::Auth),
			"integration" => Some(Category::Integration),
			"ui" => Some(Category::Ui),
			_ => None,
		}
	}
}

impl std::fmt::Display for Category {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

// AppSetting //
//************//
/// One stored row. For encrypted rows `value` is the serialized envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppSetting {
	pub key: Box<str>,
	pub value: Box<str>,
	pub encrypted: bool,
	pub category: Category,
	pub description: Option<Box<str>>,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
}

/// Row content handed to the adapter for an upsert. Timestamps are store-managed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingWrite {
	pub key: Box<str>,
	pub value: Box<str>,
	pub encrypted: bool,
	pub category: Category,
	/// `None` keeps an already stored description
	pub description: Option<Box<str>>,
}


// vim: ts=4
