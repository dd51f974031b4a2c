#![forbid(unsafe_code)]

//! The SP's signing identity as handed to the protocol engine.

use dss_sp_core::Error;
use dss_sp_keys::loader::load_x509_cert_der;
use dss_sp_keys::{KeyData, PrivateKeyEntry};

/// Private key plus certificate chain the SP authenticates its request with.
///
/// Always a consistent pair: the leaf certificate holds the public half of
/// the private key.
#[derive(Debug, Clone)]
pub struct SigningIdentity {
    entry: PrivateKeyEntry,
}

impl SigningIdentity {
    /// Pair a private key with its chain, rejecting mismatches.
    pub fn new(private_key: KeyData, certificate_chain: Vec<Vec<u8>>) -> Result<Self, Error> {
        PrivateKeyEntry::new(private_key, certificate_chain).map(Self::from)
    }

    pub fn private_key(&self) -> &KeyData {
        self.entry.private_key()
    }

    /// DER certificates, leaf first.
    pub fn certificate_chain(&self) -> &[Vec<u8>] {
        self.entry.certificate_chain()
    }

    pub fn leaf_certificate(&self) -> &[u8] {
        self.entry.leaf_certificate()
    }

    /// Number of certificates the engine announces alongside the request.
    pub fn certificate_chain_size(&self) -> usize {
        self.entry.certificate_chain().len()
    }

    pub fn subject(&self) -> Result<String, Error> {
        dss_sp_keys::x509::subject(self.leaf_certificate())
    }

    pub fn fingerprint_sha256(&self) -> String {
        dss_sp_keys::x509::fingerprint_sha256(self.leaf_certificate())
    }

    /// The algorithm used when the engine has no preference.
    pub fn default_algorithm(&self) -> &'static str {
        self.private_key().to_signing_key().default_algorithm()
    }

    /// Sign `data` with the private key.
    pub fn sign(&self, algorithm_uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
        let algo = dss_sp_crypto::from_uri(algorithm_uri)?;
        algo.sign(&self.private_key().to_signing_key(), data)
    }

    /// Verify `signature` with the public key taken from the leaf certificate,
    /// the way the DSS would.
    pub fn verify(&self, algorithm_uri: &str, data: &[u8], signature: &[u8]) -> Result<bool, Error> {
        let algo = dss_sp_crypto::from_uri(algorithm_uri)?;
        let cert_key = load_x509_cert_der(self.leaf_certificate())?;
        algo.verify(&cert_key.data.to_signing_key(), data, signature)
    }
}

impl From<PrivateKeyEntry> for SigningIdentity {
    fn from(entry: PrivateKeyEntry) -> Self {
        Self { entry }
    }
}
