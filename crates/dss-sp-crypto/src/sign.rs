#![forbid(unsafe_code)]

//! Signature algorithm implementations (RSA PKCS#1 v1.5, ECDSA).

use dss_sp_core::{algorithm, Error};
use signature::SignatureEncoding;

/// Key material for signature operations.
pub enum SigningKey {
    Rsa(rsa::RsaPrivateKey),
    RsaPublic(rsa::RsaPublicKey),
    EcP256(p256::ecdsa::SigningKey),
    EcP256Public(p256::ecdsa::VerifyingKey),
    EcP384(p384::ecdsa::SigningKey),
    EcP384Public(p384::ecdsa::VerifyingKey),
}

impl SigningKey {
    /// Whether this key can produce signatures.
    pub fn is_private(&self) -> bool {
        matches!(self, Self::Rsa(_) | Self::EcP256(_) | Self::EcP384(_))
    }

    /// The algorithm URI used when the caller does not pick one.
    pub fn default_algorithm(&self) -> &'static str {
        match self {
            Self::Rsa(_) | Self::RsaPublic(_) => algorithm::RSA_SHA256,
            Self::EcP256(_) | Self::EcP256Public(_) => algorithm::ECDSA_SHA256,
            Self::EcP384(_) | Self::EcP384Public(_) => algorithm::ECDSA_SHA384,
        }
    }
}

/// Trait for signature algorithms.
pub trait SignatureAlgorithm: Send + Sync {
    fn uri(&self) -> &'static str;
    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error>;
    fn verify(&self, key: &SigningKey, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

/// Create a signature algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    match uri {
        algorithm::RSA_SHA1 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA1, hash: HashType::Sha1 })),
        algorithm::RSA_SHA256 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA256, hash: HashType::Sha256 })),
        algorithm::RSA_SHA384 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA384, hash: HashType::Sha384 })),
        algorithm::RSA_SHA512 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA512, hash: HashType::Sha512 })),

        algorithm::ECDSA_SHA256 => Ok(Box::new(EcdsaP256)),
        algorithm::ECDSA_SHA384 => Ok(Box::new(EcdsaP384)),

        _ => Err(Error::UnsupportedAlgorithm(format!("signature algorithm: {uri}"))),
    }
}

#[derive(Debug, Clone, Copy)]
enum HashType { Sha1, Sha256, Sha384, Sha512 }

// ── RSA PKCS#1 v1.5 ─────────────────────────────────────────────────

struct RsaPkcs1v15 { uri: &'static str, hash: HashType }

impl SignatureAlgorithm for RsaPkcs1v15 {
    fn uri(&self) -> &'static str { self.uri }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::Signer;
        let SigningKey::Rsa(private_key) = key else {
            return Err(Error::Key("RSA private key required".into()));
        };
        macro_rules! do_sign {
            ($hasher:ty) => {{
                let sk = rsa::pkcs1v15::SigningKey::<$hasher>::new(private_key.clone());
                sk.try_sign(data)
                    .map(|sig| sig.to_vec())
                    .map_err(|e| Error::Crypto(format!("RSA signing failed: {e}")))
            }};
        }
        match self.hash {
            HashType::Sha1 => do_sign!(sha1::Sha1),
            HashType::Sha256 => do_sign!(sha2::Sha256),
            HashType::Sha384 => do_sign!(sha2::Sha384),
            HashType::Sha512 => do_sign!(sha2::Sha512),
        }
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;
        let public_key = match key {
            SigningKey::Rsa(pk) => pk.to_public_key(),
            SigningKey::RsaPublic(pk) => pk.clone(),
            _ => return Err(Error::Key("RSA key required".into())),
        };
        let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Crypto(format!("invalid RSA signature: {e}")))?;
        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(public_key);
                Ok(vk.verify(data, &sig).is_ok())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_verify!(sha1::Sha1),
            HashType::Sha256 => do_verify!(sha2::Sha256),
            HashType::Sha384 => do_verify!(sha2::Sha384),
            HashType::Sha512 => do_verify!(sha2::Sha512),
        }
    }
}

// ── ECDSA ────────────────────────────────────────────────────────────
//
// Signatures are carried as the fixed-width r||s concatenation.

struct EcdsaP256;

fn p256_from_rs(rs: &[u8]) -> Result<p256::ecdsa::Signature, Error> {
    if rs.len() != 64 {
        return Err(Error::Crypto(format!("P-256 signature must be 64 bytes, got {}", rs.len())));
    }
    p256::ecdsa::Signature::from_slice(rs)
        .map_err(|e| Error::Crypto(format!("invalid P-256 signature: {e}")))
}

impl SignatureAlgorithm for EcdsaP256 {
    fn uri(&self) -> &'static str { algorithm::ECDSA_SHA256 }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::Signer;
        let SigningKey::EcP256(sk) = key else {
            return Err(Error::Key("P-256 signing key required".into()));
        };
        let sig: p256::ecdsa::Signature = sk
            .try_sign(data)
            .map_err(|e| Error::Crypto(format!("P-256 signing failed: {e}")))?;
        Ok(sig.to_bytes().to_vec())
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;
        let vk = match key {
            SigningKey::EcP256(sk) => *sk.verifying_key(),
            SigningKey::EcP256Public(vk) => *vk,
            _ => return Err(Error::Key("P-256 key required".into())),
        };
        let sig = p256_from_rs(sig_bytes)?;
        Ok(vk.verify(data, &sig).is_ok())
    }
}

struct EcdsaP384;

fn p384_from_rs(rs: &[u8]) -> Result<p384::ecdsa::Signature, Error> {
    if rs.len() != 96 {
        return Err(Error::Crypto(format!("P-384 signature must be 96 bytes, got {}", rs.len())));
    }
    p384::ecdsa::Signature::from_slice(rs)
        .map_err(|e| Error::Crypto(format!("invalid P-384 signature: {e}")))
}

impl SignatureAlgorithm for EcdsaP384 {
    fn uri(&self) -> &'static str { algorithm::ECDSA_SHA384 }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::Signer;
        let SigningKey::EcP384(sk) = key else {
            return Err(Error::Key("P-384 signing key required".into()));
        };
        let sig: p384::ecdsa::Signature = sk
            .try_sign(data)
            .map_err(|e| Error::Crypto(format!("P-384 signing failed: {e}")))?;
        Ok(sig.to_bytes().to_vec())
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;
        let vk = match key {
            SigningKey::EcP384(sk) => *sk.verifying_key(),
            SigningKey::EcP384Public(vk) => *vk,
            _ => return Err(Error::Key("P-384 key required".into())),
        };
        let sig = p384_from_rs(sig_bytes)?;
        Ok(vk.verify(data, &sig).is_ok())
    }
}
