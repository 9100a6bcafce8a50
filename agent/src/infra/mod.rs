//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: the encrypted certificate
//! stores, the HTTP client, identity and properties files, and host facts.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from the CLI front end are forbidden.

pub mod cert_store;
pub mod config;
pub mod guid;
pub mod properties;
pub mod sleeper;
pub mod system;
pub mod transport;

pub use cert_store::{FileCertificateStore, KdfParams};
pub use config::AgentConfig;
pub use guid::GuidFile;
pub use properties::AutoRegisterFile;
pub use sleeper::ThreadSleeper;
pub use system::{HostSystem, local_hostname};
pub use transport::UreqTransport;
