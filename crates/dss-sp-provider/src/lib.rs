#![forbid(unsafe_code)]

//! Service-provider side of the simple DSS signature protocol.
//!
//! A protocol engine asks a [`SignatureRequestService`] for everything it
//! needs to address a signature request to the Digital Signature Service:
//! - the DSS endpoint and the SP's return address
//! - a fresh relay state to correlate the response
//! - the SP's signing identity
//! - the language the DSS should render its UI in

pub mod config;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod identity;
pub mod relay_state;
pub mod service;

pub use config::{LanguageTag, ServiceConfig};
pub use context::RequestContext;
pub use endpoint::EndpointReference;
pub use error::IdentityError;
pub use identity::SigningIdentity;
pub use relay_state::RelayState;
pub use service::{RequestParameters, SignatureRequestService, StaticSignatureRequestService};
