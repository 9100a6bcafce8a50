//! File-backed auto-registration properties.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::application::ports::RegistrationProperties;
use crate::domain::AutoRegistrationProperties;
use crate::domain::properties::render_scrubbed;

/// `autoregister.properties` on disk plus its parsed view.
///
/// Scrubbing clears the in-memory values and rewrites the file without the
/// registration keys.
pub struct AutoRegisterFile {
    path: PathBuf,
    properties: AutoRegistrationProperties,
}

impl AutoRegisterFile {
    /// Read the file; a missing file yields empty properties.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let properties = match std::fs::read_to_string(&path) {
            Ok(content) => AutoRegistrationProperties::parse(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => AutoRegistrationProperties::default(),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        Ok(Self { path, properties })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegistrationProperties for AutoRegisterFile {
    fn properties(&self) -> &AutoRegistrationProperties {
        &self.properties
    }

    fn scrub(&mut self) -> Result<()> {
        self.properties.scrub();

        let original = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        std::fs::write(&self.path, render_scrubbed(&original, Utc::now()))
            .with_context(|| format!("rewriting {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), "auto-registration properties scrubbed");
        Ok(())
    }
}
