//! Stored form of an encrypted value
//!
//! The variant is chosen when the value is encrypted and written out with an
//! explicit `alg` discriminator, so decoding never guesses the mode from the
//! shape of the string:
//!
//! ```text
//! {"alg":"aes-256-gcm","ct":"..","tag":"..","salt":"..","iv":".."}
//! {"alg":"aes-256-cbc","ct":"..","salt":"..","iv":".."}
//! ```

use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};

use setvault_types::prelude::*;

use super::{IV_LEN, SALT_LEN, TAG_LEN};

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "alg")]
pub enum Envelope {
	/// AES-256-GCM with a detached authentication tag
	#[serde(rename = "aes-256-gcm")]
	Aead {
		#[serde(rename = "ct")]
		#[serde_as(as = "Base64")]
		ciphertext: Vec<u8>,
		#[serde_as(as = "Base64")]
		tag: Vec<u8>,
		#[serde_as(as = "Base64")]
		salt: Vec<u8>,
		#[serde_as(as = "Base64")]
		iv: Vec<u8>,
	},
	/// AES-256-CBC with PKCS#7 padding. Not tamper-evident.
	#[serde(rename = "aes-256-cbc")]
	Cbc {
		#[serde(rename = "ct")]
		#[serde_as(as = "Base64")]
		ciphertext: Vec<u8>,
		#[serde_as(as = "Base64")]
		salt: Vec<u8>,
		#[serde_as(as = "Base64")]
		iv: Vec<u8>,
	},
}

impl Envelope {
	pub fn encode(&self) -> SvResult<String> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn decode(value: &str) -> SvResult<Envelope> {
		let envelope: Envelope = serde_json::from_str(value).map_err(|err| {
			Error::DecryptionError(format!("malformed envelope ({:?})", err.classify()))
		})?;
		envelope.validate()?;
		Ok(envelope)
	}

	pub fn salt(&self) -> &[u8] {
		match self {
			Envelope::Aead { salt, .. } | Envelope::Cbc { salt, .. } => salt,
		}
	}

	pub fn iv(&self) -> &[u8] {
		match self {
			Envelope::Aead { iv, .. } | Envelope::Cbc { iv, .. } => iv,
		}
	}

	pub fn is_authenticated(&self) -> bool {
		matches!(self, Envelope::Aead { .. })
	}

	/// Check field lengths. A row without a usable salt or IV is corrupt.
	pub fn validate(&self) -> SvResult<()> {
		if self.salt().len() != SALT_LEN {
			return Err(Error::DecryptionError(format!(
				"salt must be {} bytes, got {}",
				SALT_LEN,
				self.salt().len()
			)));
		}
		if self.iv().len() != IV_LEN {
			return Err(Error::DecryptionError(format!(
				"iv must be {} bytes, got {}",
				IV_LEN,
				self.iv().len()
			)));
		}
		match self {
			Envelope::Aead { tag, .. } if tag.len() != TAG_LEN => Err(Error::DecryptionError(
				format!("tag must be {} bytes, got {}", TAG_LEN, tag.len()),
			)),
			Envelope::Aead { ciphertext, .. } | Envelope::Cbc { ciphertext, .. }
				if ciphertext.is_empty() =>
			{
				Err(Error::DecryptionError("empty ciphertext".into()))
			}
			_ => Ok(()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn aead() -> Envelope {
		Envelope::Aead {
			ciphertext: vec![1, 2, 3],
			tag: vec![4; TAG_LEN],
			salt: vec![5; SALT_LEN],
			iv: vec![6; IV_LEN],
		}
	}

	#[test]
	fn test_encode_carries_alg_discriminator() {
		let encoded = aead().encode().unwrap();
		assert!(encoded.starts_with(r#"{"alg":"aes-256-gcm","ct":"AQID""#), "{}", encoded);

		let cbc = Envelope::Cbc { ciphertext: vec![1; 16], salt: vec![5; SALT_LEN], iv: vec![6; IV_LEN] };
		let encoded = cbc.encode().unwrap();
		assert!(encoded.contains(r#""alg":"aes-256-cbc""#));
		assert!(!encoded.contains("tag"));
		assert_eq!(Envelope::decode(&encoded).unwrap(), cbc);
	}

	#[test]
	fn test_decode_rejects_missing_salt_or_iv() {
		let no_salt = r#"{"alg":"aes-256-gcm","ct":"AQID","tag":"BAQEBAQEBAQEBAQEBAQEBA==","iv":"BgYGBgYGBgYGBgYGBgYGBg=="}"#;
		assert!(matches!(Envelope::decode(no_salt), Err(Error::DecryptionError(_))));

		let mut env = aead();
		if let Envelope::Aead { iv, .. } = &mut env {
			iv.clear();
		}
		let encoded = env.encode().unwrap();
		assert!(matches!(Envelope::decode(&encoded), Err(Error::DecryptionError(_))));
	}

	#[test]
	fn test_decode_rejects_plaintext_and_unknown_alg() {
		assert!(matches!(Envelope::decode("sk-ant-1234"), Err(Error::DecryptionError(_))));
		assert!(matches!(
			Envelope::decode(r#"{"alg":"rot13","ct":"AQID"}"#),
			Err(Error::DecryptionError(_))
		));
	}

	#[test]
	fn test_decode_rejects_short_tag() {
		let mut env = aead();
		if let Envelope::Aead { tag, .. } = &mut env {
			tag.truncate(8);
		}
		let encoded = env.encode().unwrap();
		assert!(matches!(Envelope::decode(&encoded), Err(Error::DecryptionError(_))));
	}
}

// vim: ts=4
