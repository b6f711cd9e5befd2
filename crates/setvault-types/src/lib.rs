//! Shared types, the storage adapter trait, and core utilities for setvault.
//!
//! The repository crate and every storage adapter depend on this crate, so an
//! adapter never has to pull in the crypto stack to implement storage.

pub mod error;
pub mod prelude;
pub mod settings_adapter;
pub mod types;
pub mod worker;

// vim: ts=4
