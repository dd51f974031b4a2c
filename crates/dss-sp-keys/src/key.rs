#![forbid(unsafe_code)]

//! Key types and data structures.

use dss_sp_crypto::SigningKey;

/// The underlying asymmetric key data.
#[derive(Clone)]
pub enum KeyData {
    Rsa {
        private: Option<rsa::RsaPrivateKey>,
        public: rsa::RsaPublicKey,
    },
    EcP256 {
        private: Option<p256::ecdsa::SigningKey>,
        public: p256::ecdsa::VerifyingKey,
    },
    EcP384 {
        private: Option<p384::ecdsa::SigningKey>,
        public: p384::ecdsa::VerifyingKey,
    },
}

impl std::fmt::Debug for KeyData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.has_private_key() {
            "private+public key"
        } else {
            "public key"
        };
        write!(f, "{} {kind}", self.algorithm_name())
    }
}

impl KeyData {
    /// Human-readable algorithm name.
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            Self::Rsa { .. } => "RSA",
            Self::EcP256 { .. } => "EC P-256",
            Self::EcP384 { .. } => "EC P-384",
        }
    }

    /// Whether the private half is present.
    pub fn has_private_key(&self) -> bool {
        match self {
            Self::Rsa { private, .. } => private.is_some(),
            Self::EcP256 { private, .. } => private.is_some(),
            Self::EcP384 { private, .. } => private.is_some(),
        }
    }

    /// Whether both keys have the same public half (and therefore belong to
    /// the same key pair).
    pub fn same_public_key(&self, other: &KeyData) -> bool {
        match (self, other) {
            (Self::Rsa { public: a, .. }, Self::Rsa { public: b, .. }) => a == b,
            (Self::EcP256 { public: a, .. }, Self::EcP256 { public: b, .. }) => a == b,
            (Self::EcP384 { public: a, .. }, Self::EcP384 { public: b, .. }) => a == b,
            _ => false,
        }
    }

    /// The public key computed from the private half, ignoring the stored
    /// `public` field. `None` for public-only key data.
    pub fn derived_public_key(&self) -> Option<KeyData> {
        match self {
            Self::Rsa { private: Some(pk), .. } => Some(Self::Rsa {
                private: None,
                public: pk.to_public_key(),
            }),
            Self::EcP256 { private: Some(sk), .. } => Some(Self::EcP256 {
                private: None,
                public: *sk.verifying_key(),
            }),
            Self::EcP384 { private: Some(sk), .. } => Some(Self::EcP384 {
                private: None,
                public: *sk.verifying_key(),
            }),
            _ => None,
        }
    }

    /// Convert to a `SigningKey` for use with crypto algorithms.
    ///
    /// Yields the private variant when the private half is present.
    pub fn to_signing_key(&self) -> SigningKey {
        match self {
            Self::Rsa { private: Some(pk), .. } => SigningKey::Rsa(pk.clone()),
            Self::Rsa { public, .. } => SigningKey::RsaPublic(public.clone()),
            Self::EcP256 { private: Some(sk), .. } => SigningKey::EcP256(sk.clone()),
            Self::EcP256 { public, .. } => SigningKey::EcP256Public(*public),
            Self::EcP384 { private: Some(sk), .. } => SigningKey::EcP384(sk.clone()),
            Self::EcP384 { public, .. } => SigningKey::EcP384Public(*public),
        }
    }
}

/// A named key with associated data.
#[derive(Debug, Clone)]
pub struct Key {
    /// Optional name (alias) for key lookup.
    pub name: Option<String>,
    /// The key data.
    pub data: KeyData,
    /// Optional X.509 certificate chain (DER-encoded, leaf first).
    pub x509_chain: Vec<Vec<u8>>,
}

impl Key {
    /// Create a new key.
    pub fn new(data: KeyData) -> Self {
        Self {
            name: None,
            data,
            x509_chain: Vec::new(),
        }
    }

    /// Set the key name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p256_pair() -> KeyData {
        let sk = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let vk = *sk.verifying_key();
        KeyData::EcP256 {
            private: Some(sk),
            public: vk,
        }
    }

    #[test]
    fn test_derived_public_key_matches_pair() {
        let pair = p256_pair();
        let public = pair.derived_public_key().unwrap();
        assert!(pair.has_private_key());
        assert!(!public.has_private_key());
        assert!(pair.same_public_key(&public));
        assert!(!public.to_signing_key().is_private());
        assert!(public.derived_public_key().is_none());
    }

    #[test]
    fn test_derived_public_key_ignores_stored_public() {
        let KeyData::EcP256 { private, .. } = p256_pair() else { unreachable!() };
        let KeyData::EcP256 { public: foreign, .. } = p256_pair() else { unreachable!() };
        let forged = KeyData::EcP256 {
            private,
            public: foreign,
        };
        let derived = forged.derived_public_key().unwrap();
        assert!(!derived.same_public_key(&forged));
    }

    #[test]
    fn test_different_pairs_do_not_match() {
        assert!(!p256_pair().same_public_key(&p256_pair()));
    }

    #[test]
    fn test_debug_hides_key_material() {
        let dbg = format!("{:?}", p256_pair());
        assert_eq!(dbg, "EC P-256 private+public key");
    }

    #[test]
    fn test_with_name() {
        let key = Key::new(p256_pair()).with_name("sp");
        assert_eq!(key.name.as_deref(), Some("sp"));
        assert!(key.x509_chain.is_empty());
    }
}
