//! Master key resolution
//!
//! The master key never leaves process memory. It is resolved once per
//! `MasterKeySource` and reused until the process exits.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use parking_lot::Mutex;
use std::sync::Arc;
use zeroize::Zeroizing;

use setvault_types::prelude::*;

use super::KEY_LEN;
use crate::config::{MASTER_KEY_ENV, RuntimeMode, VaultConfig};

/// Root secret all per-value keys are derived from. Zeroized on drop.
pub struct MasterKey(Zeroizing<[u8; KEY_LEN]>);

impl MasterKey {
	pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
		Self(Zeroizing::new(bytes))
	}

	pub fn from_base64(encoded: &str) -> SvResult<Self> {
		let decoded = Zeroizing::new(BASE64.decode(encoded.trim()).map_err(|_| {
			Error::ConfigurationError(format!("{} is not valid base64", MASTER_KEY_ENV))
		})?);
		if decoded.len() != KEY_LEN {
			return Err(Error::ConfigurationError(format!(
				"{} must decode to {} bytes, got {}",
				MASTER_KEY_ENV,
				KEY_LEN,
				decoded.len()
			)));
		}

		let mut key = Zeroizing::new([0u8; KEY_LEN]);
		key.copy_from_slice(&decoded);
		Ok(Self(key))
	}

	/// Fresh random key from the thread-local CSPRNG
	pub fn generate() -> Self {
		let mut key = Zeroizing::new([0u8; KEY_LEN]);
		*key = rand::random();
		Self(key)
	}

	pub fn expose(&self) -> &[u8; KEY_LEN] {
		&self.0
	}
}

impl std::fmt::Debug for MasterKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("MasterKey(..)")
	}
}

/// Generate a new base64 master key for operators to provision.
/// Does not touch any process state.
pub fn generate_master_key() -> String {
	let key = MasterKey::generate();
	BASE64.encode(key.expose())
}

#[derive(Debug)]
struct Resolved {
	key: Arc<MasterKey>,
	ephemeral: bool,
}

/// Resolves the master key on first use and caches it.
pub struct MasterKeySource {
	configured: Option<Zeroizing<String>>,
	mode: RuntimeMode,
	resolved: Mutex<Option<Resolved>>,
}

impl std::fmt::Debug for MasterKeySource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MasterKeySource")
			.field("configured", &self.configured.is_some())
			.field("mode", &self.mode)
			.field("resolved", &self.resolved.try_lock().map(|r| r.is_some()))
			.finish()
	}
}

impl MasterKeySource {
	pub fn new(config: &VaultConfig) -> Self {
		Self {
			configured: config.master_key.clone().map(Zeroizing::new),
			mode: config.mode,
			resolved: Mutex::new(None),
		}
	}

	/// Source with an already known key
	pub fn with_key(key: MasterKey) -> Self {
		Self {
			configured: None,
			mode: RuntimeMode::Production,
			resolved: Mutex::new(Some(Resolved { key: Arc::new(key), ephemeral: false })),
		}
	}

	/// Resolve the master key. The first caller resolves (or generates), every
	/// later caller gets the cached key.
	pub fn master_key(&self) -> SvResult<Arc<MasterKey>> {
		let mut resolved = self.resolved.lock();
		if let Some(resolved) = resolved.as_ref() {
			return Ok(Arc::clone(&resolved.key));
		}

		let (key, ephemeral) = match (self.configured.as_ref(), self.mode) {
			(Some(encoded), _) => (MasterKey::from_base64(encoded)?, false),
			(None, RuntimeMode::Production) => {
				error!("{} is not set; refusing to handle encrypted settings", MASTER_KEY_ENV);
				return Err(Error::ConfigurationError(format!(
					"master key required: set {} to a base64-encoded {}-byte key",
					MASTER_KEY_ENV, KEY_LEN
				)));
			}
			(None, RuntimeMode::Development) => {
				warn!(
					"{} is not set, generated an EPHEMERAL master key. Settings encrypted now \
					 cannot be decrypted after a restart. Provision a key for anything you \
					 want to keep.",
					MASTER_KEY_ENV
				);
				(MasterKey::generate(), true)
			}
		};

		let key = Arc::new(key);
		*resolved = Some(Resolved { key: Arc::clone(&key), ephemeral });
		Ok(key)
	}

	/// True once an ephemeral development key has been generated
	pub fn is_ephemeral(&self) -> bool {
		self.resolved.lock().as_ref().is_some_and(|r| r.ephemeral)
	}
}


// vim: ts=4
