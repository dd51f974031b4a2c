#![forbid(unsafe_code)]

//! X.509 certificate helpers.
//!
//! Parsing, subject/issuer rendering, fingerprints, chain ordering and
//! validity-period checks for the SP's own certificate chain. Trust-path
//! validation of the chain is the relying party's (the DSS's) job.

use dss_sp_core::Error;
use der::Decode;
use sha2::{Digest, Sha256};
use x509_cert::Certificate;

/// Parse a DER-encoded certificate.
pub fn parse_certificate(der: &[u8]) -> Result<Certificate, Error> {
    Certificate::from_der(der)
        .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {e}")))
}

/// RFC 4514 rendering of the certificate subject.
pub fn subject(der: &[u8]) -> Result<String, Error> {
    Ok(parse_certificate(der)?.tbs_certificate.subject.to_string())
}

/// RFC 4514 rendering of the certificate issuer.
pub fn issuer(der: &[u8]) -> Result<String, Error> {
    Ok(parse_certificate(der)?.tbs_certificate.issuer.to_string())
}

/// Lowercase hex SHA-256 over the DER encoding.
pub fn fingerprint_sha256(der: &[u8]) -> String {
    hex::encode(Sha256::digest(der))
}

/// Check that each certificate was issued by the one that follows it.
///
/// Only names are compared; signatures are not verified here.
pub fn check_chain_order(chain: &[Vec<u8>]) -> Result<(), Error> {
    let certs = chain
        .iter()
        .map(|der| parse_certificate(der))
        .collect::<Result<Vec<_>, _>>()?;

    for (i, pair) in certs.windows(2).enumerate() {
        let (child, parent) = (&pair[0], &pair[1]);
        if child.tbs_certificate.issuer != parent.tbs_certificate.subject {
            return Err(Error::Certificate(format!(
                "certificate {i} was not issued by certificate {}: issuer {} != subject {}",
                i + 1,
                child.tbs_certificate.issuer,
                parent.tbs_certificate.subject
            )));
        }
    }
    Ok(())
}

/// Check that `der` is inside its validity period.
///
/// `at` overrides the current time (format: "YYYY-MM-DD+HH:MM:SS").
pub fn check_time_validity(der: &[u8], at: Option<&str>) -> Result<(), Error> {
    let cert = parse_certificate(der)?;
    let now = resolve_verification_time(at)?;
    let validity = &cert.tbs_certificate.validity;

    let not_before = validity.not_before.to_date_time();
    let not_after = validity.not_after.to_date_time();

    if now < not_before {
        return Err(Error::Certificate(format!(
            "certificate is not yet valid (notBefore {not_before})"
        )));
    }
    if now > not_after {
        return Err(Error::Certificate(format!(
            "certificate has expired (notAfter {not_after})"
        )));
    }
    Ok(())
}

/// Parse a verification time string into a `der::DateTime`.
/// Format: "YYYY-MM-DD+HH:MM:SS" (the separator may also be 'T').
fn parse_verification_time(s: &str) -> Result<der::DateTime, Error> {
    let s = s.trim();
    let bad = || Error::Certificate(format!("invalid verification time: {s}"));
    if s.len() < 19 || !s.is_ascii() {
        return Err(bad());
    }

    let field = |range: std::ops::Range<usize>| s[range].parse::<u16>().map_err(|_| bad());
    let year = field(0..4)?;
    let month = field(5..7)? as u8;
    let day = field(8..10)? as u8;
    let hour = field(11..13)? as u8;
    let min = field(14..16)? as u8;
    let sec = field(17..19)? as u8;

    der::DateTime::new(year, month, day, hour, min, sec)
        .map_err(|e| Error::Certificate(format!("invalid verification time: {e}")))
}

/// Get the current time as a `der::DateTime`, or use the override.
fn resolve_verification_time(override_time: Option<&str>) -> Result<der::DateTime, Error> {
    if let Some(time_str) = override_time {
        return parse_verification_time(time_str);
    }

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| Error::Certificate(format!("system time error: {e}")))?;

    der::DateTime::from_unix_duration(now)
        .map_err(|e| Error::Certificate(format!("time conversion error: {e}")))
}
