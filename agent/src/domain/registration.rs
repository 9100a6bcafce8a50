//! Registration state machine values.

use std::fmt;

/// Whether the agent holds a usable identity.
///
/// Derived from the certificate store plus the durable identity marker; the
/// in-memory value is only a cache of that derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationState {
    #[default]
    Unregistered,
    Registered,
}

impl RegistrationState {
    #[must_use]
    pub fn from_evidence(has_agent_chain: bool, identity_present: bool) -> Self {
        if has_agent_chain && identity_present {
            Self::Registered
        } else {
            Self::Unregistered
        }
    }

    #[must_use]
    pub fn is_registered(self) -> bool {
        self == Self::Registered
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unregistered => f.write_str("unregistered"),
            Self::Registered => f.write_str("registered"),
        }
    }
}

/// How `invalidate_agent_certificate` left the certificate stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationOutcome {
    /// Both aliases were deleted through the store.
    Clean,
    /// Deletion failed and both backing files were removed instead.
    Wiped { reason: String },
}

impl InvalidationOutcome {
    #[must_use]
    pub fn is_wiped(&self) -> bool {
        matches!(self, Self::Wiped { .. })
    }
}

impl fmt::Display for InvalidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => f.write_str("clean"),
            Self::Wiped { .. } => f.write_str("wiped"),
        }
    }
}
