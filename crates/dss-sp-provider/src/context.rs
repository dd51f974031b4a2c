#![forbid(unsafe_code)]

//! One outbound signature request's worth of provider answers.

use crate::config::LanguageTag;
use crate::endpoint::EndpointReference;
use crate::error::IdentityError;
use crate::identity::SigningIdentity;
use crate::relay_state::RelayState;
use crate::service::{RequestParameters, SignatureRequestService};

/// The values a protocol engine collects before building a signature request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub destination: EndpointReference,
    pub target: EndpointReference,
    pub relay_state: RelayState,
    pub language: LanguageTag,
    /// `None` only when assembled with [`RequestContext::assemble_unauthenticated`].
    pub identity: Option<SigningIdentity>,
}

impl RequestContext {
    /// Collect everything for an authenticated request.
    ///
    /// A missing SP identity aborts the request.
    pub fn assemble(
        service: &dyn SignatureRequestService,
        parameters: &RequestParameters,
    ) -> Result<Self, IdentityError> {
        let identity = service.sp_identity()?;
        Ok(Self::collect(service, parameters, Some(identity)))
    }

    /// Collect routing and correlation values for a request that is sent
    /// without an SP signature.
    pub fn assemble_unauthenticated(
        service: &dyn SignatureRequestService,
        parameters: &RequestParameters,
    ) -> Self {
        Self::collect(service, parameters, None)
    }

    fn collect(
        service: &dyn SignatureRequestService,
        parameters: &RequestParameters,
        identity: Option<SigningIdentity>,
    ) -> Self {
        Self {
            destination: service.request_destination(),
            target: service.response_target(),
            relay_state: service.relay_state(parameters),
            language: service.language(),
            identity,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::service::StaticSignatureRequestService;
    use dss_sp_core::Error;
    use dss_sp_keys::{KeyMaterialProvider, PrivateKeyEntry};

    struct Broken;

    impl KeyMaterialProvider for Broken {
        fn private_key_entry(&self) -> Result<PrivateKeyEntry, Error> {
            Err(Error::Key("keystore corrupt".into()))
        }
    }

    #[test]
    fn test_assemble_fails_without_identity() {
        let svc = StaticSignatureRequestService::new(ServiceConfig::default(), Broken);
        let err = RequestContext::assemble(&svc, &RequestParameters::new()).unwrap_err();
        assert!(matches!(err.cause(), Error::Key(_)));
    }

    #[test]
    fn test_unauthenticated_context() {
        let svc = StaticSignatureRequestService::new(ServiceConfig::default(), Broken);
        let ctx = RequestContext::assemble_unauthenticated(&svc, &RequestParameters::new());
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.language.as_str(), "fr");
        assert_eq!(ctx.destination, svc.request_destination());
    }
}
