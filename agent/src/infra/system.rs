//! Host facts: hostname, working directory, free space, OS name.

use std::path::{Path, PathBuf};

use rand::RngCore;
use rand::rngs::OsRng;

use crate::application::ports::SystemInfo;
use crate::domain::certificate::hex_encode;

pub struct HostSystem;

impl SystemInfo for HostSystem {
    fn working_dir(&self) -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    fn usable_space(&self, path: &Path) -> u64 {
        fs2::available_space(path).unwrap_or_else(|e| {
            tracing::debug!(path = %path.display(), error = %e, "free space unknown");
            0
        })
    }

    fn operating_system(&self) -> String {
        std::env::consts::OS.to_string()
    }
}

/// Name this machine reports to the coordinator.
///
/// Falls back to a random `agent-<hex>` name when the OS hostname is
/// unavailable or not valid UTF-8.
#[must_use]
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| {
            let mut suffix = [0u8; 4];
            OsRng.fill_bytes(&mut suffix);
            let name = format!("agent-{}", hex_encode(&suffix));
            tracing::warn!(%name, "hostname unavailable, using generated name");
            name
        })
}
