#![forbid(unsafe_code)]

//! Key and certificate loading (PEM, DER, PKCS#1, PKCS#8, encrypted PKCS#8, SEC1).

use crate::key::{Key, KeyData};
use dss_sp_core::Error;
use std::path::Path;

const PEM_BEGIN: &str = "-----BEGIN ";
const PEM_END: &str = "-----END ";

/// A single decoded PEM block.
pub struct PemBlock {
    pub label: String,
    pub der: Vec<u8>,
}

/// Split PEM text into its decoded blocks, in file order.
///
/// Text outside `BEGIN`/`END` markers (OpenSSL "Bag Attributes" and the like)
/// is ignored.
pub fn decode_pem_blocks(pem_data: &[u8]) -> Result<Vec<PemBlock>, Error> {
    let text = std::str::from_utf8(pem_data)
        .map_err(|e| Error::Key(format!("invalid PEM encoding: {e}")))?;

    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(PEM_BEGIN) {
        let after_begin = &rest[start..];
        let end_marker = after_begin
            .find(PEM_END)
            .ok_or_else(|| Error::Key("unterminated PEM block".into()))?;
        let label_start = end_marker + PEM_END.len();
        let close = after_begin[label_start..]
            .find("-----")
            .map(|i| label_start + i + "-----".len())
            .ok_or_else(|| Error::Key("malformed PEM END line".into()))?;

        let block = after_begin[..close].trim();
        let (label, der) = pem_rfc7468::decode_vec(block.as_bytes())
            .map_err(|e| Error::Key(format!("failed to decode PEM block: {e}")))?;
        blocks.push(PemBlock {
            label: label.to_owned(),
            der,
        });
        rest = &after_begin[close..];
    }

    if blocks.is_empty() {
        return Err(Error::Key("no PEM blocks found".into()));
    }
    Ok(blocks)
}

fn rsa_private(pk: rsa::RsaPrivateKey) -> Key {
    let public = pk.to_public_key();
    Key::new(KeyData::Rsa {
        private: Some(pk),
        public,
    })
}

fn p256_private(sk: p256::ecdsa::SigningKey) -> Key {
    let vk = *sk.verifying_key();
    Key::new(KeyData::EcP256 {
        private: Some(sk),
        public: vk,
    })
}

fn p384_private(sk: p384::ecdsa::SigningKey) -> Key {
    let vk = *sk.verifying_key();
    Key::new(KeyData::EcP384 {
        private: Some(sk),
        public: vk,
    })
}

/// Load a private key from PKCS#8 DER bytes.
///
/// Tries RSA, then EC P-256, then P-384.
pub fn load_private_key_pkcs8_der(der: &[u8]) -> Result<Key, Error> {
    use pkcs8::DecodePrivateKey;

    if let Ok(pk) = rsa::RsaPrivateKey::from_pkcs8_der(der) {
        return Ok(rsa_private(pk));
    }
    if let Ok(sk) = p256::ecdsa::SigningKey::from_pkcs8_der(der) {
        return Ok(p256_private(sk));
    }
    if let Ok(sk) = p384::ecdsa::SigningKey::from_pkcs8_der(der) {
        return Ok(p384_private(sk));
    }

    Err(Error::Key(
        "unable to parse PKCS#8 DER private key (tried RSA, P-256, P-384)".into(),
    ))
}

/// Decrypt an `EncryptedPrivateKeyInfo` DER structure and load the key inside.
pub fn load_encrypted_pkcs8_der(der: &[u8], password: &str) -> Result<Key, Error> {
    use pkcs8::der::Decode;

    let enc_pki = pkcs8::EncryptedPrivateKeyInfo::from_der(der)
        .map_err(|e| Error::Key(format!("invalid encrypted PKCS#8 structure: {e}")))?;
    let doc = enc_pki
        .decrypt(password)
        .map_err(|e| Error::Key(format!("failed to decrypt private key (wrong password?): {e}")))?;
    load_private_key_pkcs8_der(doc.as_bytes())
}

/// Load a SEC1 (`EC PRIVATE KEY`) DER key.
fn load_sec1_der(der: &[u8]) -> Result<Key, Error> {
    if let Ok(secret) = p256::SecretKey::from_sec1_der(der) {
        return Ok(p256_private(p256::ecdsa::SigningKey::from(secret)));
    }
    if let Ok(secret) = p384::SecretKey::from_sec1_der(der) {
        return Ok(p384_private(p384::ecdsa::SigningKey::from(secret)));
    }
    Err(Error::Key("unable to parse SEC1 EC private key (tried P-256, P-384)".into()))
}

/// Load a private key from one decoded PEM block.
fn load_private_key_block(block: &PemBlock, password: Option<&str>) -> Result<Key, Error> {
    match block.label.as_str() {
        "PRIVATE KEY" => load_private_key_pkcs8_der(&block.der),
        "ENCRYPTED PRIVATE KEY" => {
            let pwd = password.ok_or_else(|| {
                Error::Key("private key is encrypted but no password was supplied".into())
            })?;
            load_encrypted_pkcs8_der(&block.der, pwd)
        }
        "RSA PRIVATE KEY" => {
            use pkcs1::DecodeRsaPrivateKey;
            rsa::RsaPrivateKey::from_pkcs1_der(&block.der)
                .map(rsa_private)
                .map_err(|e| Error::Key(format!("failed to parse RSA private key: {e}")))
        }
        "EC PRIVATE KEY" => load_sec1_der(&block.der),
        other => Err(Error::Key(format!("not a private key PEM label: {other}"))),
    }
}

fn is_private_key_label(label: &str) -> bool {
    matches!(
        label,
        "PRIVATE KEY" | "ENCRYPTED PRIVATE KEY" | "RSA PRIVATE KEY" | "EC PRIVATE KEY"
    )
}

/// Load the first private key found in PEM data.
///
/// The PEM data may also contain certificates; they are attached to the
/// returned key's `x509_chain` in file order.
pub fn load_private_key_pem(pem_data: &[u8], password: Option<&str>) -> Result<Key, Error> {
    let blocks = decode_pem_blocks(pem_data)?;

    let key_block = blocks
        .iter()
        .find(|b| is_private_key_label(&b.label))
        .ok_or_else(|| Error::KeyNotFound("no private key in PEM data".into()))?;
    let mut key = load_private_key_block(key_block, password)?;

    key.x509_chain = blocks
        .into_iter()
        .filter(|b| b.label == "CERTIFICATE")
        .map(|b| b.der)
        .collect();
    Ok(key)
}

/// Load a private key from DER bytes (PKCS#8, encrypted PKCS#8, PKCS#1, SEC1).
pub fn load_private_key_der(data: &[u8], password: Option<&str>) -> Result<Key, Error> {
    if let Ok(key) = load_private_key_pkcs8_der(data) {
        return Ok(key);
    }
    if let Some(pwd) = password {
        if let Ok(key) = load_encrypted_pkcs8_der(data, pwd) {
            return Ok(key);
        }
    }
    use pkcs1::DecodeRsaPrivateKey;
    if let Ok(pk) = rsa::RsaPrivateKey::from_pkcs1_der(data) {
        return Ok(rsa_private(pk));
    }
    if let Ok(key) = load_sec1_der(data) {
        return Ok(key);
    }
    Err(Error::Key(
        "unable to parse DER private key (tried PKCS#8, encrypted PKCS#8, PKCS#1, SEC1)".into(),
    ))
}

/// Load a private key file, PEM or DER auto-detected.
pub fn load_private_key_file(path: &Path, password: Option<&str>) -> Result<Key, Error> {
    let data = std::fs::read(path)?;
    if looks_like_pem(&data) {
        load_private_key_pem(&data, password)
    } else {
        load_private_key_der(&data, password)
    }
}

/// Load all certificates from PEM data, in file order (leaf first by convention).
pub fn load_certificate_chain_pem(pem_data: &[u8]) -> Result<Vec<Vec<u8>>, Error> {
    let chain: Vec<Vec<u8>> = decode_pem_blocks(pem_data)?
        .into_iter()
        .filter(|b| b.label == "CERTIFICATE")
        .map(|b| b.der)
        .collect();
    if chain.is_empty() {
        return Err(Error::Certificate("no CERTIFICATE blocks in PEM data".into()));
    }
    for der in &chain {
        crate::x509::parse_certificate(der)?;
    }
    Ok(chain)
}

/// Load a certificate chain file. PEM may hold several certificates; DER holds one.
pub fn load_certificate_chain_file(path: &Path) -> Result<Vec<Vec<u8>>, Error> {
    let data = std::fs::read(path)?;
    if looks_like_pem(&data) {
        return load_certificate_chain_pem(&data);
    }
    crate::x509::parse_certificate(&data)?;
    Ok(vec![data])
}

fn looks_like_pem(data: &[u8]) -> bool {
    let marker = PEM_BEGIN.as_bytes();
    data.windows(marker.len()).any(|w| w == marker)
}

/// Load a public key from a DER-encoded X.509 certificate.
pub fn load_x509_cert_der(data: &[u8]) -> Result<Key, Error> {
    use der::Encode;
    use spki::DecodePublicKey;

    let cert = crate::x509::parse_certificate(data)?;
    let spki_der = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| Error::Certificate(format!("failed to encode SPKI: {e}")))?;

    let key_data = if let Ok(pk) = rsa::RsaPublicKey::from_public_key_der(&spki_der) {
        KeyData::Rsa {
            private: None,
            public: pk,
        }
    } else if let Ok(vk) = p256::ecdsa::VerifyingKey::from_public_key_der(&spki_der) {
        KeyData::EcP256 {
            private: None,
            public: vk,
        }
    } else if let Ok(vk) = p384::ecdsa::VerifyingKey::from_public_key_der(&spki_der) {
        KeyData::EcP384 {
            private: None,
            public: vk,
        }
    } else {
        return Err(Error::Certificate(
            "unsupported public key algorithm in X.509 certificate".into(),
        ));
    };

    let mut key = Key::new(key_data);
    key.x509_chain = vec![data.to_vec()];
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../test-data/keys")
            .join(name)
    }

    #[test]
    fn test_load_encrypted_pem_rsa() {
        let path = fixture("sp-rsa-key.pem");
        let key = load_private_key_file(&path, Some("secret123")).expect("load encrypted PEM");
        assert!(matches!(
            key.data,
            KeyData::Rsa {
                private: Some(_),
                ..
            }
        ));
        assert!(key.x509_chain.is_empty());
    }

    #[test]
    fn test_load_encrypted_pem_wrong_password() {
        let path = fixture("sp-rsa-key.pem");
        let err = load_private_key_file(&path, Some("wrong")).unwrap_err();
        assert!(matches!(err, Error::Key(_)), "got {err:?}");
    }

    #[test]
    fn test_load_encrypted_pem_no_password() {
        let path = fixture("sp-rsa-key.pem");
        let err = load_private_key_file(&path, None).unwrap_err();
        assert!(err.to_string().contains("no password"), "got {err}");
    }

    #[test]
    fn test_load_unencrypted_rsa_matches_encrypted() {
        let plain = fixture("sp-rsa-key-unencrypted.pem");
        let enc = fixture("sp-rsa-key.pem");
        let a = load_private_key_file(&plain, None).unwrap();
        let b = load_private_key_file(&enc, Some("secret123")).unwrap();
        assert!(a.data.same_public_key(&b.data));
    }

    #[test]
    fn test_load_ec_p256_pkcs8() {
        let path = fixture("sp-ec-p256-key.pem");
        let key = load_private_key_file(&path, None).unwrap();
        assert_eq!(key.data.algorithm_name(), "EC P-256");
        assert!(key.data.has_private_key());
    }

    #[test]
    fn test_load_corrupt_key() {
        let path = fixture("corrupt-key.pem");
        assert!(load_private_key_file(&path, None).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_private_key_file(&fixture("absent.pem"), None)
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_load_chain_leaf_first() {
        let path = fixture("sp-rsa-chain.pem");
        let chain = load_certificate_chain_file(&path).unwrap();
        assert_eq!(chain.len(), 2);
        let leaf = crate::x509::subject(&chain[0]).unwrap();
        assert!(leaf.contains("DSS Test Service Provider"), "leaf subject: {leaf}");
    }

    #[test]
    fn test_combined_key_and_chain_file() {
        let key_path = fixture("sp-ec-p256-key.pem");
        let chain_path = fixture("sp-ec-p256-cert.pem");
        let mut combined = std::fs::read(&key_path).unwrap();
        combined.extend_from_slice(b"Bag Attributes: ignored\n");
        combined.extend_from_slice(&std::fs::read(&chain_path).unwrap());

        let key = load_private_key_pem(&combined, None).unwrap();
        assert_eq!(key.x509_chain.len(), 1);
        let cert_key = load_x509_cert_der(&key.x509_chain[0]).unwrap();
        assert!(key.data.same_public_key(&cert_key.data));
    }

    #[test]
    fn test_certificate_only_pem_has_no_private_key() {
        let path = fixture("sp-rsa-cert.pem");
        let data = std::fs::read(path).unwrap();
        let err = load_private_key_pem(&data, None).unwrap_err();
        assert!(matches!(err, Error::KeyNotFound(_)));
    }

    #[test]
    fn test_decode_pem_blocks_rejects_plain_text() {
        assert!(decode_pem_blocks(b"not pem at all").is_err());
    }

    #[test]
    fn test_generated_p384_pkcs8_roundtrip() {
        use pkcs8::EncodePrivateKey;
        let sk = p384::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let der = sk.to_pkcs8_der().unwrap();
        let key = load_private_key_der(der.as_bytes(), None).unwrap();
        assert_eq!(key.data.algorithm_name(), "EC P-384");
    }
}
