//! Register command

use anyhow::{Context, Result};

use crate::application::ports::RegistrationProperties;
use crate::infra::{AgentConfig, AutoRegisterFile};

use super::build_coordinator;

/// Register with the coordinator if needed, then bring the stores and the
/// HTTP client up to date.
///
/// Blocks until the coordinator issues a certificate chain.
///
/// # Errors
///
/// Returns an error if the properties file is unreadable or registration
/// fails.
pub fn run(config: &AgentConfig) -> Result<()> {
    let mut props = AutoRegisterFile::load(config.autoregister_path())?;
    let mut coordinator = build_coordinator(config);

    tracing::debug!(
        url = %config.registration_url(),
        auto_register = !props.properties().is_scrubbed(),
        "registration configured"
    );

    let state = coordinator
        .register_if_necessary(&mut props)
        .context("registration did not complete")?;
    coordinator
        .create_ssl_infrastructure()
        .context("cannot initialise SSL infrastructure")?;

    println!("{state}");
    Ok(())
}
