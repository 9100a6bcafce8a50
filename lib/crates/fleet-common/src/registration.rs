use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Form parameter names of the agent registration request
pub mod form {
    /// Local hostname of the agent machine
    pub const HOSTNAME: &str = "hostname";

    /// Stable agent identity (GUID), unrelated to certificate content
    pub const UUID: &str = "uuid";

    /// Working directory of the agent process
    pub const LOCATION: &str = "location";

    /// Usable disk space in bytes at `location`
    pub const USABLE_SPACE: &str = "usablespace";

    /// Operating system name
    pub const OPERATING_SYSTEM: &str = "operatingSystem";

    /// Shared auto-registration secret
    pub const AUTO_REGISTER_KEY: &str = "agentAutoRegisterKey";

    /// Comma separated resource tags
    pub const AUTO_REGISTER_RESOURCES: &str = "agentAutoRegisterResources";

    /// Comma separated environment tags
    pub const AUTO_REGISTER_ENVIRONMENTS: &str = "agentAutoRegisterEnvironments";

    /// Hostname the coordinator should display instead of `hostname`
    pub const AUTO_REGISTER_HOSTNAME: &str = "agentAutoRegisterHostname";

    /// Elastic agent identifier (elastic agents only)
    pub const ELASTIC_AGENT_ID: &str = "elasticAgentId";

    /// Elastic plugin identifier (elastic agents only)
    pub const ELASTIC_PLUGIN_ID: &str = "elasticPluginId";
}

/// Certificate store aliases
pub mod aliases {
    /// The agent's own identity chain
    pub const AGENT: &str = "agent";

    /// The coordinator's trusted certificate
    pub const COORDINATOR: &str = "coordinator";
}

/// Body returned by the coordinator registration endpoint.
///
/// A coordinator that has not admitted the agent yet answers with an empty
/// (or missing) `certificateChain`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    /// PEM encoded certificates, leaf first
    #[serde(default)]
    pub certificate_chain: Vec<String>,
    /// Start of the leaf certificate validity period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,
    /// PEM encoded private key matching the leaf certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_private_key: Option<String>,
}

impl RegistrationResponse {
    /// True when the coordinator has not issued a certificate yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.certificate_chain.is_empty()
    }
}
