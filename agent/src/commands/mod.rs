//! Command implementations

pub mod invalidate;
pub mod register;
pub mod status;

use std::sync::Arc;

use crate::application::{RegistrationCoordinator, RemoteRegistrationRequester};
use crate::infra::{
    AgentConfig, FileCertificateStore, GuidFile, HostSystem, ThreadSleeper, UreqTransport,
    local_hostname,
};

/// Coordinator wired to the production adapters.
pub type AgentCoordinator = RegistrationCoordinator<
    FileCertificateStore,
    RemoteRegistrationRequester<Arc<UreqTransport>, Arc<GuidFile>, HostSystem>,
    Arc<UreqTransport>,
    Arc<GuidFile>,
    ThreadSleeper,
>;

/// Build a coordinator over the stores and identity files named by `config`.
///
/// Nothing is created on disk here.
#[must_use]
pub fn build_coordinator(config: &AgentConfig) -> AgentCoordinator {
    let http = Arc::new(UreqTransport::new(
        config.connect_timeout(),
        config.read_timeout(),
    ));
    let guid = Arc::new(GuidFile::new(config.guid_path()));
    let requester = RemoteRegistrationRequester::new(
        config.registration_url(),
        Arc::clone(&http),
        Arc::clone(&guid),
        HostSystem,
    );

    RegistrationCoordinator::new(
        FileCertificateStore::new(config.agent_store_path(), config.store_password()),
        FileCertificateStore::new(config.trust_store_path(), config.trust_store_password()),
        requester,
        http,
        guid,
        ThreadSleeper,
        local_hostname(),
    )
    .with_retry_interval(config.retry_interval())
}
