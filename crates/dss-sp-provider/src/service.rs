#![forbid(unsafe_code)]

//! The identity and routing provider consulted by the protocol engine.

use crate::config::{LanguageTag, ServiceConfig};
use crate::endpoint::EndpointReference;
use crate::error::IdentityError;
use crate::identity::SigningIdentity;
use crate::relay_state::RelayState;
use dss_sp_keys::KeyMaterialProvider;
use std::collections::HashMap;

/// Form or query parameters of the request that triggers a signature request.
pub type RequestParameters = HashMap<String, Vec<String>>;

/// Everything the protocol engine needs from the SP to address a signature
/// request to the DSS.
///
/// Implementations are shared between concurrent request flows.
pub trait SignatureRequestService: Send + Sync {
    /// DSS endpoint that receives the signature request.
    fn request_destination(&self) -> EndpointReference;

    /// SP endpoint the DSS returns its response to.
    fn response_target(&self) -> EndpointReference;

    /// Fresh correlation token for one outbound request.
    ///
    /// The parameters are available for implementations that bind the token
    /// to request context.
    fn relay_state(&self, parameters: &RequestParameters) -> RelayState;

    /// The SP's private key and certificate chain.
    fn sp_identity(&self) -> Result<SigningIdentity, IdentityError>;

    /// Language the DSS should render its pages in.
    fn language(&self) -> LanguageTag;
}

/// Provider with fixed routing and language, drawing its identity from an
/// injected key-material provider.
pub struct StaticSignatureRequestService<P> {
    config: ServiceConfig,
    key_material: P,
}

impl<P: KeyMaterialProvider> StaticSignatureRequestService<P> {
    pub fn new(config: ServiceConfig, key_material: P) -> Self {
        Self {
            config,
            key_material,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn key_material(&self) -> &P {
        &self.key_material
    }
}

impl<P: KeyMaterialProvider> SignatureRequestService for StaticSignatureRequestService<P> {
    fn request_destination(&self) -> EndpointReference {
        self.config.destination.clone()
    }

    fn response_target(&self) -> EndpointReference {
        self.config.target.clone()
    }

    fn relay_state(&self, _parameters: &RequestParameters) -> RelayState {
        RelayState::generate()
    }

    fn sp_identity(&self) -> Result<SigningIdentity, IdentityError> {
        tracing::debug!("get SP identity");
        match self.key_material.private_key_entry() {
            Ok(entry) => {
                let identity = SigningIdentity::from(entry);
                let fingerprint = identity.fingerprint_sha256();
                match identity.subject() {
                    Ok(subject) => {
                        tracing::debug!(subject = %subject, fingerprint = %fingerprint, "SP certificate")
                    }
                    Err(e) => tracing::warn!(
                        error = %e,
                        fingerprint = %fingerprint,
                        "SP certificate subject unreadable"
                    ),
                }
                Ok(identity)
            }
            Err(e) => {
                tracing::error!(error = %e, "SP identity unavailable");
                Err(IdentityError::new(e))
            }
        }
    }

    fn language(&self) -> LanguageTag {
        self.config.language.clone()
    }
}

impl<P> std::fmt::Debug for StaticSignatureRequestService<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSignatureRequestService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dss_sp_core::Error;
    use dss_sp_keys::loader::load_private_key_pem;
    use dss_sp_keys::{InMemoryKeyStore, PrivateKeyEntry};
    use std::sync::{Arc, Mutex};

    const EC_KEY_AND_CERT: [&[u8]; 2] = [
        include_bytes!("../../../test-data/keys/sp-ec-p256-key.pem"),
        include_bytes!("../../../test-data/keys/sp-ec-p256-cert.pem"),
    ];

    struct Unavailable;

    impl KeyMaterialProvider for Unavailable {
        fn private_key_entry(&self) -> Result<PrivateKeyEntry, Error> {
            Err(Error::KeyNotFound("no alias".into()))
        }
    }

    #[test]
    fn test_static_values() {
        let svc = StaticSignatureRequestService::new(ServiceConfig::default(), Unavailable);
        assert_eq!(svc.request_destination().as_str(), "../eid-dss/protocol/simple");
        assert_eq!(svc.response_target().as_str(), "../eid-dss-sp/dss-response");
        assert_eq!(svc.language().as_str(), "fr");
    }

    #[test]
    fn test_identity_failure_is_typed() {
        let svc = StaticSignatureRequestService::new(ServiceConfig::default(), Unavailable);
        let err = svc.sp_identity().unwrap_err();
        assert!(matches!(err.cause(), Error::KeyNotFound(_)));
    }

    /// Captures formatted log output for the duration of `f`.
    fn capture_logs(f: impl FnOnce()) -> String {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buf);
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || LogSink(Arc::clone(&sink)))
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    struct LogSink(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogSink {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_identity_logs_certificate_subject() {
        let entry = PrivateKeyEntry::from_key(
            load_private_key_pem(EC_KEY_AND_CERT.concat().as_slice(), None).unwrap(),
        )
        .unwrap();
        let svc =
            StaticSignatureRequestService::new(ServiceConfig::default(), InMemoryKeyStore::new(entry));
        let logs = capture_logs(|| {
            svc.sp_identity().unwrap();
        });
        assert!(logs.contains("SP certificate"), "logs: {logs}");
        assert!(logs.contains("CN=DSS Test EC Service Provider"), "logs: {logs}");
        assert!(logs.contains("fingerprint="), "logs: {logs}");
    }

    #[test]
    fn test_identity_failure_logs_cause() {
        let svc = StaticSignatureRequestService::new(ServiceConfig::default(), Unavailable);
        let logs = capture_logs(|| {
            assert!(svc.sp_identity().is_err());
        });
        assert!(logs.contains("SP identity unavailable"), "logs: {logs}");
        assert!(logs.contains("key not found: no alias"), "logs: {logs}");
    }

    #[test]
    fn test_usable_as_trait_object() {
        let svc: Box<dyn SignatureRequestService> = Box::new(StaticSignatureRequestService::new(
            ServiceConfig::default(),
            Unavailable,
        ));
        let a = svc.relay_state(&RequestParameters::new());
        let b = svc.relay_state(&RequestParameters::new());
        assert_ne!(a, b);
    }
}
