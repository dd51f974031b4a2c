#![forbid(unsafe_code)]

//! Relay state (correlation token) minting.

use dss_sp_core::Error;
use uuid::Uuid;

/// Opaque token round-tripped through the DSS to match its response with
/// the request that caused it.
///
/// A random (version 4) UUID in canonical lowercase form. It carries no
/// session data and is not tracked here; matching it against the returned
/// value is up to the protocol engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelayState(String);

impl RelayState {
    /// Mint a fresh token from the operating system's CSPRNG.
    pub fn generate() -> Self {
        let token = Uuid::new_v4().hyphenated().to_string();
        tracing::trace!(relay_state = %token, "minted relay state");
        Self(token)
    }

    /// Accept a token echoed back by the DSS, if it has the minted shape.
    pub fn parse(value: &str) -> Result<Self, Error> {
        let uuid = Uuid::try_parse(value)
            .map_err(|e| Error::Config(format!("malformed relay state: {e}")))?;
        if uuid.get_version_num() != 4 || uuid.get_variant() != uuid::Variant::RFC4122 {
            return Err(Error::Config(format!("relay state is not a random UUID: {value}")));
        }
        Ok(Self(uuid.hyphenated().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RelayState> for String {
    fn from(value: RelayState) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_canonical(s: &str) -> bool {
        let groups: Vec<&str> = s.split('-').collect();
        let lens: Vec<usize> = groups.iter().map(|g| g.len()).collect();
        lens == [8, 4, 4, 4, 12]
            && groups
                .iter()
                .all(|g| g.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')))
    }

    #[test]
    fn test_generated_shape() {
        let token = RelayState::generate();
        let s = token.as_str();
        assert_eq!(s.len(), 36);
        assert!(is_canonical(s), "not canonical: {s}");
        // version nibble
        assert_eq!(&s[14..15], "4");
        // variant bits 10xx
        assert!(matches!(&s[19..20], "8" | "9" | "a" | "b"));
    }

    #[test]
    fn test_parse_roundtrip_and_case() {
        let token = RelayState::generate();
        assert_eq!(RelayState::parse(token.as_str()).unwrap(), token);
        let upper = token.as_str().to_uppercase();
        assert_eq!(RelayState::parse(&upper).unwrap(), token);
    }

    #[test]
    fn test_parse_rejects_non_random_uuids() {
        assert!(RelayState::parse("00000000-0000-0000-0000-000000000000").is_err());
        // version 1
        assert!(RelayState::parse("c232ab00-9414-11ec-b3c8-9f6bdeced846").is_err());
        assert!(RelayState::parse("not-a-token").is_err());
    }

    #[test]
    fn test_into_string() {
        let token = RelayState::generate();
        let copy = token.to_string();
        assert_eq!(String::from(token), copy);
    }
}
