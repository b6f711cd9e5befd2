//! Per-value key derivation

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{KEY_LEN, MasterKey};

/// PBKDF2-HMAC-SHA256 rounds per derivation
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Derive the 256-bit key of one value from the master key and its salt.
///
/// Deterministic for a given `(master, salt)`; nothing is cached, so every
/// encryption and decryption pays the full derivation cost.
pub fn derive_key(master: &MasterKey, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
	let mut out = Zeroizing::new([0u8; KEY_LEN]);
	pbkdf2_hmac::<Sha256>(master.expose(), salt, PBKDF2_ITERATIONS, &mut out[..]);
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::SALT_LEN;

	#[test]
	fn test_derive_key_deterministic() {
		let master = MasterKey::from_bytes([1; KEY_LEN]);
		let salt = [2u8; SALT_LEN];
		assert_eq!(*derive_key(&master, &salt), *derive_key(&master, &salt));
	}

	#[test]
	fn test_derive_key_depends_on_salt_and_master() {
		let master = MasterKey::from_bytes([1; KEY_LEN]);
		let other_master = MasterKey::from_bytes([9; KEY_LEN]);
		let base = derive_key(&master, &[2u8; SALT_LEN]);
		assert_ne!(*base, *derive_key(&master, &[3u8; SALT_LEN]));
		assert_ne!(*base, *derive_key(&other_master, &[2u8; SALT_LEN]));
	}

	#[test]
	fn test_derive_key_is_not_the_master_key() {
		let master = MasterKey::from_bytes([5; KEY_LEN]);
		assert_ne!(*derive_key(&master, &[0u8; SALT_LEN]), *master.expose());
	}
}

// vim: ts=4
