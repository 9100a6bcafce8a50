//! Application service — one registration round trip with the coordinator.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use fleet_common::{RegistrationResponse, form};

use crate::application::ports::{
    AgentRegistry, HttpTransport, RegistrationRequester, SystemInfo,
};
use crate::domain::{AutoRegistrationProperties, RegistrationResult, TransportError};

/// Submits the agent's identity to the coordinator registration endpoint.
pub struct RemoteRegistrationRequester<H, A, S> {
    url: String,
    http: H,
    registry: A,
    system: S,
}

impl<H, A, S> RemoteRegistrationRequester<H, A, S>
where
    H: HttpTransport,
    A: AgentRegistry,
    S: SystemInfo,
{
    pub fn new(url: impl Into<String>, http: H, registry: A, system: S) -> Self {
        Self {
            url: url.into(),
            http,
            registry,
            system,
        }
    }
}

impl<H, A, S> RegistrationRequester for RemoteRegistrationRequester<H, A, S>
where
    H: HttpTransport,
    A: AgentRegistry,
    S: SystemInfo,
{
    fn request_registration(
        &self,
        hostname: &str,
        props: &AutoRegistrationProperties,
    ) -> Result<RegistrationResult, TransportError> {
        tracing::debug!(url = %self.url, "using registration URL");

        let uuid = self
            .registry
            .uuid()
            .map_err(|e| TransportError::Identity(format!("{e:#}")))?;
        let location = self.system.working_dir();
        let usable_space = self.system.usable_space(&location);
        let host = HostReport {
            hostname,
            uuid: &uuid,
            location: &location.to_string_lossy(),
            usable_space,
            operating_system: &self.system.operating_system(),
        };

        let params = build_form(&host, props);
        let pairs: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let response = self.http.post_form(&self.url, &pairs)?;

        if !(200..300).contains(&response.status) {
            return Err(TransportError::Status {
                url: self.url.clone(),
                status: response.status,
            });
        }
        parse_registration(response.body.as_deref())
    }
}

/// Host facts sent alongside the auto-registration properties.
pub struct HostReport<'a> {
    pub hostname: &'a str,
    pub uuid: &'a str,
    pub location: &'a str,
    pub usable_space: u64,
    pub operating_system: &'a str,
}

/// Build the registration form. Absent properties are sent as empty values.
#[must_use]
pub fn build_form(
    host: &HostReport<'_>,
    props: &AutoRegistrationProperties,
) -> Vec<(&'static str, String)> {
    vec![
        (form::HOSTNAME, host.hostname.to_string()),
        (form::UUID, host.uuid.to_string()),
        (form::LOCATION, host.location.to_string()),
        (form::USABLE_SPACE, host.usable_space.to_string()),
        (form::OPERATING_SYSTEM, host.operating_system.to_string()),
        (form::AUTO_REGISTER_KEY, props.key().to_string()),
        (form::AUTO_REGISTER_RESOURCES, props.resources().to_string()),
        (
            form::AUTO_REGISTER_ENVIRONMENTS,
            props.environments().to_string(),
        ),
        (form::AUTO_REGISTER_HOSTNAME, props.hostname().to_string()),
        (form::ELASTIC_AGENT_ID, props.elastic_agent_id().to_string()),
        (form::ELASTIC_PLUGIN_ID, props.elastic_plugin_id().to_string()),
    ]
}

/// Decode a registration response body.
///
/// # Errors
///
/// An absent or blank body is `TransportError::EmptyBody`; anything that is
/// not a registration response is `TransportError::MalformedResponse`.
pub fn parse_registration(body: Option<&str>) -> Result<RegistrationResult, TransportError> {
    let body = body
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .ok_or(TransportError::EmptyBody)?;
    let response: RegistrationResponse = serde_json::from_str(body)
        .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;
    RegistrationResult::from_response(response)
}
