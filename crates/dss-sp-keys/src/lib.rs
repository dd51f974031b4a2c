#![forbid(unsafe_code)]

//! Key material for a DSS service provider.
//!
//! Loads the SP's private key and certificate chain from PEM, DER, PKCS#8
//! and password-protected PKCS#8 files, pairs them into a checked
//! [`PrivateKeyEntry`], and serves that entry through the
//! [`KeyMaterialProvider`] trait.

pub mod entry;
pub mod key;
pub mod keystore;
pub mod loader;
pub mod x509;

pub use entry::PrivateKeyEntry;
pub use key::{Key, KeyData};
pub use keystore::{FileKeyStore, InMemoryKeyStore, KeyMaterialProvider};
