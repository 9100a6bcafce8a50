//! Status command

use fleet_common::aliases;
use serde::Serialize;

use crate::application::ports::CertificateStore;
use crate::domain::CertificateEntry;
use crate::infra::AgentConfig;

use super::build_coordinator;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    not_before: Option<String>,
}

/// Print registration state and the stored agent certificate, if any.
///
/// # Errors
///
/// Returns an error if the report cannot be serialized.
pub fn run(config: &AgentConfig, json: bool) -> anyhow::Result<()> {
    let mut coordinator = build_coordinator(config);
    let state = coordinator.refresh_state();

    let entry = match coordinator.agent_store().load(aliases::AGENT) {
        Ok(entry) => entry,
        Err(e) => {
            tracing::warn!(error = %e, "cannot read agent certificate store");
            None
        }
    };
    let report = StatusReport {
        state: state.to_string(),
        fingerprint: entry.as_ref().and_then(CertificateEntry::fingerprint),
        not_before: entry
            .as_ref()
            .and_then(|e| e.not_before)
            .map(|t| t.to_rfc3339()),
    };

    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{}", report.state);
        if let Some(fingerprint) = &report.fingerprint {
            println!("  fingerprint: {fingerprint}");
        }
        if let Some(not_before) = &report.not_before {
            println!("  not before:  {not_before}");
        }
    }
    Ok(())
}
