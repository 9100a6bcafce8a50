//! Application service — agent registration and certificate lifecycle.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.
//!
//! The in-memory `RegistrationState` is a cache. The agent certificate store
//! and the durable identity marker are the source of truth and are consulted
//! again on every `register_if_necessary` call.

use std::time::Duration;

use fleet_common::aliases;

use crate::application::ports::{
    CertificateStore, HttpTransport, IdentityMarker, RegistrationProperties,
    RegistrationRequester, Sleeper,
};
use crate::domain::{
    InvalidationOutcome, RegistrationError, RegistrationResult, RegistrationState, StoreError,
};

/// Delay between attempts while the coordinator has not issued a chain.
pub const REGISTER_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Drives registration against the coordinator and owns both certificate
/// stores for the lifetime of the agent process.
pub struct RegistrationCoordinator<S, R, H, M, Z> {
    agent_store: S,
    trust_store: S,
    requester: R,
    http: H,
    marker: M,
    sleeper: Z,
    hostname: String,
    retry_interval: Duration,
    state: RegistrationState,
}

impl<S, R, H, M, Z> RegistrationCoordinator<S, R, H, M, Z>
where
    S: CertificateStore,
    R: RegistrationRequester,
    H: HttpTransport,
    M: IdentityMarker,
    Z: Sleeper,
{
    pub fn new(
        agent_store: S,
        trust_store: S,
        requester: R,
        http: H,
        marker: M,
        sleeper: Z,
        hostname: impl Into<String>,
    ) -> Self {
        Self {
            agent_store,
            trust_store,
            requester,
            http,
            marker,
            sleeper,
            hostname: hostname.into(),
            retry_interval: REGISTER_RETRY_INTERVAL,
            state: RegistrationState::Unregistered,
        }
    }

    #[must_use]
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Last computed registration state; does not touch the stores.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.state.is_registered()
    }

    #[must_use]
    pub fn agent_store(&self) -> &S {
        &self.agent_store
    }

    /// Recompute the registration state from the stores.
    pub fn refresh_state(&mut self) -> RegistrationState {
        self.state = RegistrationState::from_evidence(
            self.agent_store.has_entry(aliases::AGENT),
            self.marker.is_present(),
        );
        self.state
    }

    /// Register with the coordinator unless a usable identity already exists.
    ///
    /// Blocks until the coordinator issues a chain. An empty result is
    /// retried after a fixed delay without limit; a transport fault aborts
    /// the whole call immediately.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::Transport` for any network fault,
    /// `StoreWrite` if the issued chain cannot be persisted, `Configuration`
    /// on an agent store password mismatch, and `Scrub` if the consumed
    /// secrets cannot be cleared.
    pub fn register_if_necessary(
        &mut self,
        props: &mut impl RegistrationProperties,
    ) -> Result<RegistrationState, RegistrationError> {
        if self.refresh_state().is_registered() {
            tracing::debug!("agent already registered");
            return Ok(self.state);
        }

        self.recover_corrupted_stores()?;

        tracing::info!(hostname = %self.hostname, "starting to register agent");
        self.register(props)?;
        self.create_ssl_infrastructure()?;
        self.state = RegistrationState::Registered;
        tracing::info!("successfully registered agent");
        Ok(self.state)
    }

    /// Re-initialise outward-facing transport state from the stores.
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::Infrastructure` if a store cannot be
    /// initialised.
    pub fn create_ssl_infrastructure(&self) -> Result<(), RegistrationError> {
        self.agent_store
            .ensure_initialized()
            .map_err(RegistrationError::Infrastructure)?;
        self.trust_store
            .ensure_initialized()
            .map_err(RegistrationError::Infrastructure)?;
        self.http.reset();
        Ok(())
    }

    /// Forget the agent identity and the pinned coordinator certificate.
    ///
    /// Never fails: when deletion through the store is impossible the
    /// backing files are removed instead, so the next registration starts
    /// from an empty store.
    pub fn invalidate_agent_certificate(&mut self) -> InvalidationOutcome {
        self.http.reset();
        self.state = RegistrationState::Unregistered;

        let deleted = self
            .agent_store
            .delete(aliases::AGENT)
            .and_then(|()| self.trust_store.delete(aliases::COORDINATOR));

        match deleted {
            Ok(()) => {
                tracing::info!("agent certificate invalidated");
                InvalidationOutcome::Clean
            }
            Err(e) => {
                tracing::error!(error = %e, "error while deleting key from certificate store, removing stores");
                self.wipe_stores();
                InvalidationOutcome::Wiped {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn wipe_stores(&self) {
        for store in [&self.agent_store, &self.trust_store] {
            if let Err(e) = store.wipe() {
                tracing::error!(
                    path = %store.path().display(),
                    error = %e,
                    "failed to remove certificate store"
                );
            }
        }
    }

    /// A corrupted store cannot take a new chain; start from scratch.
    fn recover_corrupted_stores(&mut self) -> Result<(), RegistrationError> {
        let mut corrupted = false;
        for store in [&self.agent_store, &self.trust_store] {
            match store.check() {
                Ok(()) => {}
                Err(e) if e.is_corruption() => {
                    tracing::error!(error = %e, "certificate store unreadable");
                    corrupted = true;
                }
                Err(e @ StoreError::PasswordMismatch { .. }) => {
                    return Err(RegistrationError::Configuration(e));
                }
                Err(e) => tracing::warn!(error = %e, "certificate store check failed"),
            }
        }
        if corrupted {
            self.invalidate_agent_certificate();
        }
        Ok(())
    }

    fn register(
        &mut self,
        props: &mut impl RegistrationProperties,
    ) -> Result<(), RegistrationError> {
        let registration = self.await_registration(&*props)?;
        tracing::info!("retrieved registration from coordinator");
        self.store_chain(&registration)?;
        props.scrub().map_err(RegistrationError::Scrub)?;
        Ok(())
    }

    fn await_registration(
        &self,
        props: &impl RegistrationProperties,
    ) -> Result<RegistrationResult, RegistrationError> {
        let mut attempt: u64 = 1;
        loop {
            let registration = self
                .requester
                .request_registration(&self.hostname, props.properties())
                .inspect_err(|e| {
                    tracing::error!(attempt, error = %e, "there was a problem registering with the coordinator");
                })?;

            if !registration.is_empty() {
                return Ok(registration);
            }

            tracing::info!(
                attempt,
                retry_in_secs = self.retry_interval.as_secs(),
                "coordinator has not issued a certificate yet"
            );
            self.sleeper.sleep(self.retry_interval);
            attempt += 1;
        }
    }

    /// Pin the coordinator root before the agent chain, so a stored agent
    /// alias always has its pin beside it.
    fn store_chain(&self, registration: &RegistrationResult) -> Result<(), RegistrationError> {
        if let Some(anchor) = registration.trust_anchor() {
            self.trust_store
                .store(aliases::COORDINATOR, &anchor)
                .map_err(RegistrationError::StoreWrite)?;
        }

        self.agent_store
            .store(aliases::AGENT, registration)
            .map_err(RegistrationError::StoreWrite)?;

        let fingerprint = registration.fingerprint().unwrap_or_default();
        tracing::info!(
            %fingerprint,
            not_before = ?registration.not_before(),
            "stored registration"
        );
        Ok(())
    }
}
