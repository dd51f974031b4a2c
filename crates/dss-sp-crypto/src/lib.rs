#![forbid(unsafe_code)]

//! Signature algorithms for the DSS service-provider crates.
//!
//! The service provider signs its outbound request with its own identity and
//! the same code verifies such signatures against a certificate's public key.

pub mod sign;

pub use sign::{from_uri, SignatureAlgorithm, SigningKey};
