//! Auto-registration properties and their `autoregister.properties` syntax.
//!
//! Pure parsing and rendering; reading and rewriting the file lives in
//! `crate::infra::properties`.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

pub const KEY: &str = "agent.auto.register.key";
pub const RESOURCES: &str = "agent.auto.register.resources";
pub const ENVIRONMENTS: &str = "agent.auto.register.environments";
pub const HOSTNAME: &str = "agent.auto.register.hostname";
pub const ELASTIC_AGENT_ID: &str = "agent.auto.register.elasticAgent.agentId";
pub const ELASTIC_PLUGIN_ID: &str = "agent.auto.register.elasticAgent.pluginId";

const ALL_KEYS: [&str; 6] = [
    KEY,
    RESOURCES,
    ENVIRONMENTS,
    HOSTNAME,
    ELASTIC_AGENT_ID,
    ELASTIC_PLUGIN_ID,
];

/// Registration secrets and tags sent once to the coordinator.
///
/// `scrub` clears every field; there is no way to restore them.
#[derive(Clone, Default)]
pub struct AutoRegistrationProperties {
    key: Option<Zeroizing<String>>,
    resources: Option<String>,
    environments: Option<String>,
    hostname: Option<String>,
    elastic_agent_id: Option<String>,
    elastic_plugin_id: Option<String>,
}

impl AutoRegistrationProperties {
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(Zeroizing::new(key.into()));
        self
    }

    #[must_use]
    pub fn with_resources(mut self, resources: impl Into<String>) -> Self {
        self.resources = Some(resources.into());
        self
    }

    #[must_use]
    pub fn with_environments(mut self, environments: impl Into<String>) -> Self {
        self.environments = Some(environments.into());
        self
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    #[must_use]
    pub fn with_elastic_agent_id(mut self, id: impl Into<String>) -> Self {
        self.elastic_agent_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_elastic_plugin_id(mut self, id: impl Into<String>) -> Self {
        self.elastic_plugin_id = Some(id.into());
        self
    }

    /// Parse `key=value` / `key: value` lines; `#` and `!` start comments.
    /// Unknown keys are ignored and empty values count as absent.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut props = Self::default();
        for (key, value) in entries(content) {
            if value.is_empty() {
                continue;
            }
            let value = value.to_string();
            match key {
                KEY => props.key = Some(Zeroizing::new(value)),
                RESOURCES => props.resources = Some(value),
                ENVIRONMENTS => props.environments = Some(value),
                HOSTNAME => props.hostname = Some(value),
                ELASTIC_AGENT_ID => props.elastic_agent_id = Some(value),
                ELASTIC_PLUGIN_ID => props.elastic_plugin_id = Some(value),
                _ => {}
            }
        }
        props
    }

    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_ref().map_or("", |k| k.as_str())
    }

    #[must_use]
    pub fn resources(&self) -> &str {
        self.resources.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn environments(&self) -> &str {
        self.environments.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn hostname(&self) -> &str {
        self.hostname.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn elastic_agent_id(&self) -> &str {
        self.elastic_agent_id.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn elastic_plugin_id(&self) -> &str {
        self.elastic_plugin_id.as_deref().unwrap_or_default()
    }

    /// Clear all registration fields. Idempotent.
    pub fn scrub(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn is_scrubbed(&self) -> bool {
        self.key.is_none()
            && self.resources.is_none()
            && self.environments.is_none()
            && self.hostname.is_none()
            && self.elastic_agent_id.is_none()
            && self.elastic_plugin_id.is_none()
    }
}

impl fmt::Debug for AutoRegistrationProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoRegistrationProperties")
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("resources", &self.resources)
            .field("environments", &self.environments)
            .field("hostname", &self.hostname)
            .field("elastic_agent_id", &self.elastic_agent_id)
            .field("elastic_plugin_id", &self.elastic_plugin_id)
            .finish()
    }
}

/// Rewrite a properties file with every registration key removed.
///
/// Comments and unrelated keys are kept; a header records when the scrub
/// happened so an operator can tell the file was consumed.
#[must_use]
pub fn render_scrubbed(original: &str, scrubbed_at: DateTime<Utc>) -> String {
    let mut out = format!(
        "# Auto-registration details were consumed by a successful registration on {}\n",
        scrubbed_at.to_rfc3339()
    );
    for line in original.lines() {
        let is_registration_key =
            split_entry(line).is_some_and(|(key, _)| ALL_KEYS.contains(&key));
        let is_old_header = line.starts_with("# Auto-registration details were consumed");
        if !is_registration_key && !is_old_header {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

fn entries(content: &str) -> impl Iterator<Item = (&str, &str)> {
    content.lines().filter_map(split_entry)
}

fn split_entry(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
        return None;
    }
    let idx = line.find(['=', ':'])?;
    Some((line[..idx].trim(), line[idx + 1..].trim()))
}
