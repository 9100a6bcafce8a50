//! Domain layer — pure types, parsing and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod certificate;
pub mod error;
pub mod properties;
pub mod registration;

pub use certificate::{Certificate, CertificateEntry, RegistrationResult};
pub use error::{CertificateError, RegistrationError, StoreError, TransportError};
pub use properties::AutoRegistrationProperties;
pub use registration::{InvalidationOutcome, RegistrationState};
