#![forbid(unsafe_code)]

//! A private key paired with its certificate chain.

use crate::key::{Key, KeyData};
use crate::loader::load_x509_cert_der;
use dss_sp_core::Error;

/// The SP's private key together with its certificate chain.
///
/// An entry can only be built when the chain is non-empty and the leaf
/// certificate carries the public half of the private key.
#[derive(Clone)]
pub struct PrivateKeyEntry {
    alias: Option<String>,
    private_key: KeyData,
    certificate_chain: Vec<Vec<u8>>,
}

impl std::fmt::Debug for PrivateKeyEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKeyEntry")
            .field("alias", &self.alias)
            .field("private_key", &self.private_key)
            .field("chain_len", &self.certificate_chain.len())
            .finish()
    }
}

impl PrivateKeyEntry {
    /// Pair a private key with its DER certificate chain (leaf first).
    pub fn new(private_key: KeyData, certificate_chain: Vec<Vec<u8>>) -> Result<Self, Error> {
        // The stored `public` field is caller-supplied; only the private half counts.
        let derived = private_key.derived_public_key().ok_or_else(|| {
            Error::KeyNotFound(format!(
                "{} key has no private component",
                private_key.algorithm_name()
            ))
        })?;
        if !derived.same_public_key(&private_key) {
            return Err(Error::KeyMismatch(format!(
                "{} key data holds a public key from another key pair",
                private_key.algorithm_name()
            )));
        }
        let leaf = certificate_chain
            .first()
            .ok_or_else(|| Error::Certificate("certificate chain is empty".into()))?;
        let leaf_key = load_x509_cert_der(leaf)?;
        if !derived.same_public_key(&leaf_key.data) {
            return Err(Error::KeyMismatch(format!(
                "{} private key vs {} certificate {}",
                private_key.algorithm_name(),
                leaf_key.data.algorithm_name(),
                crate::x509::subject(leaf).unwrap_or_else(|_| "<unreadable subject>".into())
            )));
        }
        Ok(Self {
            alias: None,
            private_key,
            certificate_chain,
        })
    }

    /// Build an entry from a loaded key whose `x509_chain` is already populated.
    pub fn from_key(key: Key) -> Result<Self, Error> {
        let alias = key.name;
        let mut entry = Self::new(key.data, key.x509_chain)?;
        entry.alias = alias;
        Ok(entry)
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn private_key(&self) -> &KeyData {
        &self.private_key
    }

    /// DER certificates, leaf first.
    pub fn certificate_chain(&self) -> &[Vec<u8>] {
        &self.certificate_chain
    }

    pub fn leaf_certificate(&self) -> &[u8] {
        // Non-empty by construction.
        &self.certificate_chain[0]
    }
}
