//! Invalidate command

use crate::domain::InvalidationOutcome;
use crate::infra::AgentConfig;

use super::build_coordinator;

/// Drop the agent certificate and the pinned coordinator certificate.
pub fn run(config: &AgentConfig, json: bool) {
    let outcome = build_coordinator(config).invalidate_agent_certificate();
    if json {
        let reason = match &outcome {
            InvalidationOutcome::Wiped { reason } => Some(reason.as_str()),
            InvalidationOutcome::Clean => None,
        };
        println!(
            "{}",
            serde_json::json!({ "outcome": outcome.to_string(), "reason": reason })
        );
    } else {
        println!("{outcome}");
    }
}
