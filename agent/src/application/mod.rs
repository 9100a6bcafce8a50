//! Application layer — port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain` — never on `crate::infra`
//! or the CLI front end.

pub mod ports;
pub mod services;

pub use ports::{
    AgentRegistry, CertificateStore, HttpResponse, HttpTransport, IdentityMarker,
    RegistrationProperties, RegistrationRequester, Sleeper, SystemInfo,
};
pub use services::registration::{REGISTER_RETRY_INTERVAL, RegistrationCoordinator};
pub use services::registration_transport::RemoteRegistrationRequester;
