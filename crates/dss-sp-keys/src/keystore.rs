#![forbid(unsafe_code)]

//! Key-material providers.
//!
//! A [`KeyMaterialProvider`] hands out the SP's [`PrivateKeyEntry`]. It is
//! read-only and reentrant: callers may ask for the entry from many threads
//! at once and every call yields an independent copy.

use crate::entry::PrivateKeyEntry;
use crate::loader::{load_certificate_chain_file, load_private_key_file};
use dss_sp_core::Error;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Source of the SP's private key entry.
pub trait KeyMaterialProvider: Send + Sync {
    fn private_key_entry(&self) -> Result<PrivateKeyEntry, Error>;
}

impl<P: KeyMaterialProvider + ?Sized> KeyMaterialProvider for Arc<P> {
    fn private_key_entry(&self) -> Result<PrivateKeyEntry, Error> {
        (**self).private_key_entry()
    }
}

impl<P: KeyMaterialProvider + ?Sized> KeyMaterialProvider for Box<P> {
    fn private_key_entry(&self) -> Result<PrivateKeyEntry, Error> {
        (**self).private_key_entry()
    }
}

/// Keystore backed by files on disk.
///
/// The key file may be PEM (PKCS#8, encrypted PKCS#8, PKCS#1, SEC1) or DER.
/// Certificates come from `chain_path` when set, otherwise from
/// `CERTIFICATE` blocks inside the key file itself.
///
/// Files are read on the first successful access and the parsed entry is
/// kept for later calls. A failed load is not remembered.
pub struct FileKeyStore {
    key_path: PathBuf,
    chain_path: Option<PathBuf>,
    password: Option<String>,
    alias: Option<String>,
    loaded: OnceLock<PrivateKeyEntry>,
}

impl std::fmt::Debug for FileKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKeyStore")
            .field("key_path", &self.key_path)
            .field("chain_path", &self.chain_path)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("alias", &self.alias)
            .field("loaded", &self.loaded.get().is_some())
            .finish()
    }
}

impl FileKeyStore {
    /// Keystore whose key file also carries the certificate chain.
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        Self {
            key_path: key_path.into(),
            chain_path: None,
            password: None,
            alias: None,
            loaded: OnceLock::new(),
        }
    }

    /// Read the certificate chain from a separate file.
    pub fn with_chain(mut self, chain_path: impl Into<PathBuf>) -> Self {
        self.chain_path = Some(chain_path.into());
        self
    }

    /// Password for an encrypted private key.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Name attached to the loaded entry.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    fn load(&self) -> Result<PrivateKeyEntry, Error> {
        tracing::debug!(key = %self.key_path.display(), "loading SP keystore");
        let mut key = load_private_key_file(&self.key_path, self.password.as_deref())?;

        if let Some(chain_path) = &self.chain_path {
            key.x509_chain = load_certificate_chain_file(chain_path)?;
        }
        if key.x509_chain.is_empty() {
            return Err(Error::Certificate(format!(
                "no certificate chain for key {}",
                self.key_path.display()
            )));
        }
        if let Some(alias) = &self.alias {
            key = key.with_name(alias.clone());
        }

        let entry = PrivateKeyEntry::from_key(key)?;
        tracing::debug!(
            algorithm = entry.private_key().algorithm_name(),
            chain_len = entry.certificate_chain().len(),
            "SP keystore loaded"
        );
        Ok(entry)
    }
}

impl KeyMaterialProvider for FileKeyStore {
    fn private_key_entry(&self) -> Result<PrivateKeyEntry, Error> {
        if let Some(entry) = self.loaded.get() {
            return Ok(entry.clone());
        }
        let entry = self.load()?;
        // A concurrent loader may have won; either value is equivalent.
        Ok(self.loaded.get_or_init(|| entry).clone())
    }
}

/// Keystore holding an entry already in memory.
#[derive(Debug, Clone)]
pub struct InMemoryKeyStore {
    entry: PrivateKeyEntry,
}

impl InMemoryKeyStore {
    pub fn new(entry: PrivateKeyEntry) -> Self {
        Self { entry }
    }
}

impl KeyMaterialProvider for InMemoryKeyStore {
    fn private_key_entry(&self) -> Result<PrivateKeyEntry, Error> {
        Ok(self.entry.clone())
    }
}
