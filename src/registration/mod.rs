//! Registration authority adapter
//!
//! Before a connection can receive routed payloads it must obtain a
//! broadcaster identity from an external authority. This module holds the
//! [`Registrar`] seam and its production HTTP implementation.

pub mod client;
pub mod config;
pub mod error;

pub use client::{HttpRegistrar, Registrar};
pub use config::RegistrarConfig;
pub use error::RegistrationError;
