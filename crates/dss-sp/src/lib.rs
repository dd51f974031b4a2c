#![forbid(unsafe_code)]

//! DSS service-provider identity and routing.
//!
//! Facade over the workspace crates: `provider` answers the protocol engine,
//! `keys` loads the SP's key material, `crypto` signs and verifies.

pub use dss_sp_core::{algorithm, Error, Result};
pub use dss_sp_crypto as crypto;
pub use dss_sp_keys as keys;
pub use dss_sp_provider as provider;
