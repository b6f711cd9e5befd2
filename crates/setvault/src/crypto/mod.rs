//! Encryption at rest for sensitive settings.
//!
//! Every encrypted value gets its own random salt; the per-value key is
//! derived from the process master key with PBKDF2-HMAC-SHA256 and the value
//! is sealed with AES-256-GCM (AES-256-CBC only where AEAD is unusable).

pub mod cipher;
pub mod envelope;
pub mod kdf;
pub mod master_key;

pub use cipher::{CipherEngine, CipherMode};
pub use envelope::Envelope;
pub use kdf::derive_key;
pub use master_key::{MasterKey, MasterKeySource, generate_master_key};

/// Salt length in bytes
pub const SALT_LEN: usize = 32;
/// IV length in bytes, used as GCM nonce and as CBC IV
pub const IV_LEN: usize = 16;
/// GCM authentication tag length in bytes
pub const TAG_LEN: usize = 16;
/// Derived and master key length in bytes
pub const KEY_LEN: usize = 32;

// vim: ts=4
