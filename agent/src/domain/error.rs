//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `std::fs` or `std::net`. All error types implement
//! `thiserror::Error` and convert to `anyhow::Error` via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

// ── Certificate errors ────────────────────────────────────────────────────────

/// A single chain element could not be decoded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CertificateError {
    #[error("no PEM certificate block found")]
    Missing,

    #[error("expected exactly one certificate per chain element, found {0}")]
    Multiple(usize),

    #[error("invalid PEM: {0}")]
    InvalidPem(String),
}

// ── Transport errors ──────────────────────────────────────────────────────────

/// Network-level faults of a single registration attempt.
///
/// Never retried by the registration layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("coordinator unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("coordinator answered {url} with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("coordinator sent an empty registration response")]
    EmptyBody,

    #[error("malformed registration response: {0}")]
    MalformedResponse(String),

    #[error("agent identity unavailable: {0}")]
    Identity(String),
}

// ── Store errors ──────────────────────────────────────────────────────────────

/// Failures of the password-protected certificate store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("certificate store {path} I/O failure: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("certificate store {path} is corrupted: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("wrong password for certificate store {path}")]
    PasswordMismatch { path: PathBuf },

    #[error("refusing to store an empty certificate chain under alias '{alias}'")]
    EmptyChain { alias: String },

    #[error("certificate store {path} crypto failure: {reason}")]
    Crypto { path: PathBuf, reason: String },
}

impl StoreError {
    /// True when the backing file exists but cannot be trusted.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

// ── Registration errors ───────────────────────────────────────────────────────

/// Errors surfaced by `RegistrationCoordinator::register_if_necessary`.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("agent registration failed: {0}")]
    Transport(#[from] TransportError),

    #[error("couldn't save agent certificate into store: {0}")]
    StoreWrite(#[source] StoreError),

    #[error("certificate store misconfigured: {0}")]
    Configuration(#[source] StoreError),

    #[error("couldn't initialise certificate stores: {0}")]
    Infrastructure(#[source] StoreError),

    #[error("couldn't scrub auto-registration properties: {0:#}")]
    Scrub(anyhow::Error),
}
