#![forbid(unsafe_code)]

//! Deployment configuration: DSS destination, SP return target, UI language.

use crate::endpoint::EndpointReference;
use dss_sp_core::Error;

/// Relative path of the DSS simple-protocol endpoint.
pub const DEFAULT_DESTINATION: &str = "../eid-dss/protocol/simple";
/// Relative path where the DSS posts its response back to the SP.
pub const DEFAULT_TARGET: &str = "../eid-dss-sp/dss-response";
/// Language the DSS is asked to render its pages in.
pub const DEFAULT_LANGUAGE: &str = "fr";

pub const ENV_DESTINATION: &str = "DSS_SP_DESTINATION";
pub const ENV_TARGET: &str = "DSS_SP_TARGET";
pub const ENV_LANGUAGE: &str = "DSS_SP_LANGUAGE";

/// Two-letter ISO 639-1 language tag, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag(String);

impl LanguageTag {
    pub fn new(tag: &str) -> Result<Self, Error> {
        if tag.len() != 2 || !tag.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::Config(format!(
                "language must be a two-letter ISO 639-1 code, got {tag:?}"
            )));
        }
        Ok(Self(tag.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed per-deployment settings of the SP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub destination: EndpointReference,
    pub target: EndpointReference,
    pub language: LanguageTag,
}

impl ServiceConfig {
    /// Build a validated configuration.
    pub fn new(destination: &str, target: &str, language: &str) -> Result<Self, Error> {
        Ok(Self {
            destination: EndpointReference::new(destination)?,
            target: EndpointReference::new(target)?,
            language: LanguageTag::new(language)?,
        })
    }

    /// Defaults overridden by `DSS_SP_DESTINATION`, `DSS_SP_TARGET` and
    /// `DSS_SP_LANGUAGE` when set.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let destination = lookup(ENV_DESTINATION).unwrap_or_else(|| DEFAULT_DESTINATION.into());
        let target = lookup(ENV_TARGET).unwrap_or_else(|| DEFAULT_TARGET.into());
        let language = lookup(ENV_LANGUAGE).unwrap_or_else(|| DEFAULT_LANGUAGE.into());
        Self::new(&destination, &target, &language)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            destination: EndpointReference(DEFAULT_DESTINATION.into()),
            target: EndpointReference(DEFAULT_TARGET.into()),
            language: LanguageTag(DEFAULT_LANGUAGE.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let def = ServiceConfig::default();
        let built = ServiceConfig::new(DEFAULT_DESTINATION, DEFAULT_TARGET, DEFAULT_LANGUAGE).unwrap();
        assert_eq!(def, built);
        assert_eq!(def.language.as_str(), "fr");
    }

    #[test]
    fn test_language_validation() {
        assert_eq!(LanguageTag::new("NL").unwrap().as_str(), "nl");
        assert!(LanguageTag::new("fra").is_err());
        assert!(LanguageTag::new("f1").is_err());
        assert!(LanguageTag::new("").is_err());
        assert!(LanguageTag::new("é").is_err());
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> =
            [(ENV_LANGUAGE, "de"), (ENV_TARGET, "/sp/response")].into();
        let cfg = ServiceConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.destination.as_str(), DEFAULT_DESTINATION);
        assert_eq!(cfg.target.as_str(), "/sp/response");
        assert_eq!(cfg.language.as_str(), "de");
    }

    #[test]
    fn test_lookup_rejects_bad_values() {
        let err = ServiceConfig::from_lookup(|k| (k == ENV_DESTINATION).then(String::new));
        assert!(matches!(err, Err(Error::Config(_))));
    }
}
