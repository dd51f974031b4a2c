#![forbid(unsafe_code)]

/// Errors produced by the DSS service-provider crates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("certificate error: {0}")]
    Certificate(String),

    /// The private key does not belong to the leaf certificate.
    #[error("private key does not match certificate: {0}")]
    KeyMismatch(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
