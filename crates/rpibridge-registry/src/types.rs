//! Registry record types.

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// A registered resource provider: a name and the URL its API listens on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpiInfo {
    pub name: String,
    pub url: String,
}

impl RpiInfo {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Reject records with no name or no url.
    pub fn validate(&self) -> RegistryResult<()> {
        if self.name.trim().is_empty() || self.url.trim().is_empty() {
            return Err(RegistryError::Invalid(format!(
                "cannot accept provider {:?} with no name or url",
                self.name
            )));
        }
        Ok(())
    }
}
