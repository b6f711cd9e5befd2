//! Error taxonomy shared by the repository and the storage adapters

pub type SvResult<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// Master key missing (production) or malformed
	ConfigurationError(String),
	/// Integrity or format failure on one encrypted value
	DecryptionError(String),
	/// Empty plaintext handed to the cipher
	InvalidPlaintext,
	/// Value or key rejected by the catalog
	ValidationError(String),

	// Repository-level storage failures, wrapping the underlying cause
	SettingsRetrievalError(String),
	SettingUpdateError(String),
	BulkUpdateError(String),
	SettingDeletionError(String),

	// Adapter-level
	NotFound,
	DbError(String),

	Internal(String),
}

impl Error {
	/// Storage-level message of the error, used when the repository wraps it
	pub fn cause(&self) -> String {
		match self {
			Error::DbError(msg) => msg.clone(),
			err => err.to_string(),
		}
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::ConfigurationError(msg) => write!(f, "configuration error: {}", msg),
			Error::DecryptionError(msg) => write!(f, "decryption failed: {}", msg),
			Error::InvalidPlaintext => write!(f, "invalid plaintext"),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::SettingsRetrievalError(msg) => write!(f, "failed to retrieve settings: {}", msg),
			Error::SettingUpdateError(msg) => write!(f, "failed to update setting: {}", msg),
			Error::BulkUpdateError(msg) => write!(f, "failed to update settings: {}", msg),
			Error::SettingDeletionError(msg) => write!(f, "failed to delete setting: {}", msg),
			Error::NotFound => write!(f, "not found"),
			Error::DbError(msg) => write!(f, "database error: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Internal(format!("json: {}", err))
	}
}


// vim: ts=4
