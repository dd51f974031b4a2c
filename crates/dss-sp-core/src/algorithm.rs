#![forbid(unsafe_code)]

//! Signature algorithm identifiers.
//!
//! The simple DSS protocol names algorithms with the XML-DSig URIs, so the
//! same strings are used here.

// ── RSA PKCS#1 v1.5 ──────────────────────────────────────────────────

pub const RSA_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#rsa-sha1";
pub const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
pub const RSA_SHA384: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384";
pub const RSA_SHA512: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512";

// ── ECDSA ────────────────────────────────────────────────────────────

pub const ECDSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256";
pub const ECDSA_SHA384: &str = "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha384";

/// Every signature algorithm URI the crypto crate can resolve.
pub const SIGNATURE_ALGORITHMS: &[&str] = &[
    RSA_SHA1,
    RSA_SHA256,
    RSA_SHA384,
    RSA_SHA512,
    ECDSA_SHA256,
    ECDSA_SHA384,
];
