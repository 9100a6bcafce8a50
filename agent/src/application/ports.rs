//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`
//! or the CLI front end.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{
    AutoRegistrationProperties, CertificateEntry, RegistrationResult, StoreError, TransportError,
};

// ── Certificate Store Port ────────────────────────────────────────────────────

/// Password-protected, file-backed repository of certificate chains by alias.
///
/// Every operation on one instance uses the same password.
pub trait CertificateStore {
    /// Location of the backing file.
    fn path(&self) -> &Path;

    /// Ensure the backing file exists, creating an empty store if absent.
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::PasswordMismatch` if an existing file was written
    /// with another password, or an I/O / corruption error.
    fn ensure_initialized(&self) -> Result<(), StoreError>;

    /// True iff a non-empty chain is stored under `alias`. Any failure to
    /// read the store counts as absent.
    fn has_entry(&self, alias: &str) -> bool;

    /// Read back the entry stored under `alias`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or authenticated.
    fn load(&self, alias: &str) -> Result<Option<CertificateEntry>, StoreError>;

    /// Persist `result` under `alias`, replacing any prior entry.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EmptyChain` for an empty result, or the write
    /// failure.
    fn store(&self, alias: &str, result: &RegistrationResult) -> Result<(), StoreError>;

    /// Remove the entry for `alias`; a missing entry is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or rewritten.
    fn delete(&self, alias: &str) -> Result<(), StoreError>;

    /// Open and authenticate the store without changing it. A missing file
    /// is healthy.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Corrupt` or `StoreError::PasswordMismatch`.
    fn check(&self) -> Result<(), StoreError>;

    /// Physically remove the backing file. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    fn wipe(&self) -> Result<(), StoreError>;
}

impl<T: CertificateStore + ?Sized> CertificateStore for &T {
    fn path(&self) -> &Path {
        (**self).path()
    }
    fn ensure_initialized(&self) -> Result<(), StoreError> {
        (**self).ensure_initialized()
    }
    fn has_entry(&self, alias: &str) -> bool {
        (**self).has_entry(alias)
    }
    fn load(&self, alias: &str) -> Result<Option<CertificateEntry>, StoreError> {
        (**self).load(alias)
    }
    fn store(&self, alias: &str, result: &RegistrationResult) -> Result<(), StoreError> {
        (**self).store(alias, result)
    }
    fn delete(&self, alias: &str) -> Result<(), StoreError> {
        (**self).delete(alias)
    }
    fn check(&self) -> Result<(), StoreError> {
        (**self).check()
    }
    fn wipe(&self) -> Result<(), StoreError> {
        (**self).wipe()
    }
}

// ── HTTP Transport Port ───────────────────────────────────────────────────────

/// Response of a single HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// `None` when the response carried no entity.
    pub body: Option<String>,
}

/// Underlying HTTP client shared by registration and later agent traffic.
pub trait HttpTransport {
    /// POST `form` as `application/x-www-form-urlencoded` to `url`.
    ///
    /// Non-2xx statuses are returned, not raised. Connection resources are
    /// released before this returns, on every path.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Unreachable` for connection or I/O faults.
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse, TransportError>;

    /// Drop pooled connections so later requests use the current identity.
    fn reset(&self);
}

impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        (**self).post_form(url, form)
    }
    fn reset(&self) {
        (**self).reset();
    }
}

impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        (**self).post_form(url, form)
    }
    fn reset(&self) {
        (**self).reset();
    }
}

// ── Registration Port ─────────────────────────────────────────────────────────

/// One registration round trip with the coordinator.
pub trait RegistrationRequester {
    /// # Errors
    ///
    /// Returns a `TransportError` for network faults and unusable responses.
    /// A coordinator that has not admitted the agent yet yields an empty
    /// `RegistrationResult`, not an error.
    fn request_registration(
        &self,
        hostname: &str,
        props: &AutoRegistrationProperties,
    ) -> Result<RegistrationResult, TransportError>;
}

impl<T: RegistrationRequester + ?Sized> RegistrationRequester for &T {
    fn request_registration(
        &self,
        hostname: &str,
        props: &AutoRegistrationProperties,
    ) -> Result<RegistrationResult, TransportError> {
        (**self).request_registration(hostname, props)
    }
}

// ── Identity Ports ────────────────────────────────────────────────────────────

/// Supplies the stable agent UUID.
pub trait AgentRegistry {
    /// # Errors
    ///
    /// Returns an error if the identity cannot be read or created.
    fn uuid(&self) -> Result<String>;
}

/// The durable identity marker maintained outside the registration core.
pub trait IdentityMarker {
    fn is_present(&self) -> bool;
}

impl<T: AgentRegistry + ?Sized> AgentRegistry for Arc<T> {
    fn uuid(&self) -> Result<String> {
        (**self).uuid()
    }
}

impl<T: IdentityMarker + ?Sized> IdentityMarker for Arc<T> {
    fn is_present(&self) -> bool {
        (**self).is_present()
    }
}

// ── Host Port ─────────────────────────────────────────────────────────────────

/// Facts about the agent machine reported at registration.
pub trait SystemInfo {
    /// Current working directory of the agent process.
    fn working_dir(&self) -> PathBuf;

    /// Bytes available to the agent at `path`; 0 when unknown.
    fn usable_space(&self, path: &Path) -> u64;

    fn operating_system(&self) -> String;
}

// ── Scheduling Port ───────────────────────────────────────────────────────────

/// Blocking delay between registration attempts, injectable for tests.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

impl<T: Sleeper + ?Sized> Sleeper for &T {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

// ── Registration Properties Port ──────────────────────────────────────────────

/// Source of auto-registration properties with a one-way scrub.
pub trait RegistrationProperties {
    fn properties(&self) -> &AutoRegistrationProperties;

    /// Irreversibly clear the registration secrets. Safe to call twice.
    ///
    /// # Errors
    ///
    /// Returns an error if a persisted copy cannot be rewritten.
    fn scrub(&mut self) -> Result<()>;
}

impl RegistrationProperties for AutoRegistrationProperties {
    fn properties(&self) -> &AutoRegistrationProperties {
        self
    }

    fn scrub(&mut self) -> Result<()> {
        AutoRegistrationProperties::scrub(self);
        Ok(())
    }
}
