//! Authenticated encryption of single setting values

use aes::Aes256;
use aes_gcm::{
	AesGcm,
	aead::{AeadInPlace, KeyInit, consts::U16, generic_array::GenericArray},
};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use std::sync::Arc;
use zeroize::Zeroizing;

use setvault_types::prelude::*;

use super::{Envelope, IV_LEN, KEY_LEN, MasterKeySource, SALT_LEN, derive_key};

/// AES-256-GCM with a 16-byte nonce
type Aes256Gcm16 = AesGcm<Aes256, U16>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Mode new values are sealed with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CipherMode {
	/// AES-256-GCM, falling back to CBC only if the AEAD primitive fails
	Aead,
	/// AES-256-CBC only. For runtimes where AES-GCM cannot be used; loses
	/// tamper detection.
	Cbc,
}

#[derive(Clone, Debug)]
pub struct CipherEngine {
	keys: Arc<MasterKeySource>,
	mode: CipherMode,
}

impl CipherEngine {
	pub fn new(keys: Arc<MasterKeySource>) -> Self {
		Self { keys, mode: CipherMode::Aead }
	}

	pub fn with_mode(mut self, mode: CipherMode) -> Self {
		self.mode = mode;
		self
	}

	/// Encrypt one value under a fresh salt and IV.
	///
	/// Runs PBKDF2, so call it from a worker thread.
	pub fn encrypt(&self, plaintext: &str) -> SvResult<Envelope> {
		if plaintext.is_empty() {
			return Err(Error::InvalidPlaintext);
		}

		let master = self.keys.master_key()?;
		let salt: [u8; SALT_LEN] = rand::random();
		let key = derive_key(&master, &salt);

		if self.mode == CipherMode::Aead {
			let iv: [u8; IV_LEN] = rand::random();
			match seal_aead(&key, &iv, plaintext.as_bytes()) {
				Ok((ciphertext, tag)) => {
					return Ok(Envelope::Aead {
						ciphertext,
						tag,
						salt: salt.to_vec(),
						iv: iv.to_vec(),
					});
				}
				Err(err) => warn!("AES-256-GCM failed ({}), falling back to AES-256-CBC", err),
			}
		}

		let iv: [u8; IV_LEN] = rand::random();
		let ciphertext = seal_cbc(&key, &iv, plaintext.as_bytes())?;
		Ok(Envelope::Cbc { ciphertext, salt: salt.to_vec(), iv: iv.to_vec() })
	}

	/// Decrypt one value. Any integrity or format violation is a
	/// `DecryptionError`; unauthenticated plaintext is never returned.
	///
	/// Intermediate buffers are zeroized. The returned `String` belongs to
	/// the caller and is not.
	pub fn decrypt(&self, envelope: &Envelope) -> SvResult<String> {
		envelope.validate()?;

		let master = self.keys.master_key()?;
		let key = derive_key(&master, envelope.salt());

		let mut plaintext = match envelope {
			Envelope::Aead { ciphertext, tag, iv, .. } => open_aead(&key, iv, ciphertext, tag)?,
			Envelope::Cbc { ciphertext, iv, .. } => open_cbc(&key, iv, ciphertext)?,
		};

		// Checked in place so a rejected buffer is still zeroized on drop
		if std::str::from_utf8(&plaintext).is_err() {
			return Err(Error::DecryptionError("plaintext is not valid UTF-8".into()));
		}
		String::from_utf8(std::mem::take(&mut *plaintext))
			.map_err(|_| Error::DecryptionError("plaintext is not valid UTF-8".into()))
	}

	/// Encrypt and serialize into the stored form
	pub fn encrypt_to_string(&self, plaintext: &str) -> SvResult<String> {
		self.encrypt(plaintext)?.encode()
	}

	/// Parse the stored form and decrypt
	pub fn decrypt_str(&self, value: &str) -> SvResult<String> {
		self.decrypt(&Envelope::decode(value)?)
	}
}

fn seal_aead(
	key: &[u8; KEY_LEN],
	iv: &[u8; IV_LEN],
	plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), aes_gcm::Error> {
	let cipher = Aes256Gcm16::new(GenericArray::from_slice(&key[..]));
	let mut buffer = plaintext.to_vec();
	let tag = cipher.encrypt_in_place_detached(GenericArray::from_slice(&iv[..]), b"", &mut buffer)?;
	Ok((buffer, tag.to_vec()))
}

fn open_aead(
	key: &[u8; KEY_LEN],
	iv: &[u8],
	ciphertext: &[u8],
	tag: &[u8],
) -> SvResult<Zeroizing<Vec<u8>>> {
	let cipher = Aes256Gcm16::new(GenericArray::from_slice(&key[..]));
	let mut buffer = Zeroizing::new(ciphertext.to_vec());
	cipher
		.decrypt_in_place_detached(
			GenericArray::from_slice(iv),
			b"",
			buffer.as_mut_slice(),
			GenericArray::from_slice(tag),
		)
		.map_err(|_| Error::DecryptionError("authentication tag mismatch".into()))?;
	Ok(buffer)
}

fn seal_cbc(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], plaintext: &[u8]) -> SvResult<Vec<u8>> {
	let enc = Aes256CbcEnc::new_from_slices(key, iv)
		.map_err(|_| Error::Internal("invalid AES-256-CBC key or iv length".into()))?;
	Ok(enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn open_cbc(key: &[u8; KEY_LEN], iv: &[u8], ciphertext: &[u8]) -> SvResult<Zeroizing<Vec<u8>>> {
	let dec = Aes256CbcDec::new_from_slices(key, iv)
		.map_err(|_| Error::DecryptionError("invalid iv length".into()))?;
	dec.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
		.map(Zeroizing::new)
		.map_err(|_| Error::DecryptionError("invalid padding".into()))
}


// vim: ts=4
