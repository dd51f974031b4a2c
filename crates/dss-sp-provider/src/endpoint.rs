#![forbid(unsafe_code)]

//! Endpoint references for the DSS destination and the SP return target.

use dss_sp_core::Error;
use url::Url;

/// Where the DSS protocol is served, or where its response is delivered.
///
/// Usually a path relative to the SP's own base URL, e.g.
/// `../eid-dss/protocol/simple`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointReference(pub(crate) String);

impl EndpointReference {
    /// Validate and wrap an endpoint string.
    pub fn new(reference: impl Into<String>) -> Result<Self, Error> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(Error::Config("endpoint reference must not be empty".into()));
        }
        if reference.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!(
                "endpoint reference must not contain whitespace: {reference:?}"
            )));
        }
        Ok(Self(reference))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the reference is already an absolute URL.
    pub fn is_absolute(&self) -> bool {
        Url::parse(&self.0).is_ok()
    }

    /// Resolve against the SP's base URL (RFC 3986 reference resolution).
    pub fn resolve(&self, base: &Url) -> Result<Url, Error> {
        base.join(&self.0)
            .map_err(|e| Error::Config(format!("cannot resolve {} against {base}: {e}", self.0)))
    }
}

impl std::fmt::Display for EndpointReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EndpointReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_to_sp_base() {
        let base = Url::parse("https://sp.example.be/eid-dss-sp/sign").unwrap();
        let dest = EndpointReference::new("../eid-dss/protocol/simple").unwrap();
        assert_eq!(
            dest.resolve(&base).unwrap().as_str(),
            "https://sp.example.be/eid-dss/protocol/simple"
        );
        let target = EndpointReference::new("../eid-dss-sp/dss-response").unwrap();
        assert_eq!(
            target.resolve(&base).unwrap().as_str(),
            "https://sp.example.be/eid-dss-sp/dss-response"
        );
    }

    #[test]
    fn test_absolute_reference_kept() {
        let base = Url::parse("https://sp.example.be/app/").unwrap();
        let dest = EndpointReference::new("https://dss.example.be/protocol/simple").unwrap();
        assert!(dest.is_absolute());
        assert_eq!(
            dest.resolve(&base).unwrap().as_str(),
            "https://dss.example.be/protocol/simple"
        );
    }

    #[test]
    fn test_rejects_empty_and_whitespace() {
        assert!(EndpointReference::new("").is_err());
        assert!(EndpointReference::new("   ").is_err());
        assert!(EndpointReference::new("../a b").is_err());
    }

    #[test]
    fn test_display() {
        let e = EndpointReference::new("../x").unwrap();
        assert_eq!(e.to_string(), "../x");
        assert!(!e.is_absolute());
    }
}
