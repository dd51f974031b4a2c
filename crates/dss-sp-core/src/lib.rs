#![forbid(unsafe_code)]

//! Core types shared by the DSS service-provider crates.

pub mod algorithm;
pub mod error;

pub use error::{Error, Result};
