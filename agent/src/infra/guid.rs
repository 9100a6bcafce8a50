//! The agent GUID file: stable identity reported at registration and the
//! durable marker consulted when deriving registration state.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{AgentRegistry, IdentityMarker};

pub struct GuidFile {
    path: PathBuf,
}

impl GuidFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content.trim().to_string()).filter(|g| !g.is_empty())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    fn generate(&self) -> Result<String> {
        let guid = uuid::Uuid::new_v4().to_string();
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        std::fs::write(&self.path, &guid)
            .with_context(|| format!("writing {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), %guid, "generated agent GUID");
        Ok(guid)
    }
}

impl AgentRegistry for GuidFile {
    fn uuid(&self) -> Result<String> {
        match self.read()? {
            Some(guid) => Ok(guid),
            None => self.generate(),
        }
    }
}

impl IdentityMarker for GuidFile {
    fn is_present(&self) -> bool {
        matches!(self.read(), Ok(Some(_)))
    }
}
