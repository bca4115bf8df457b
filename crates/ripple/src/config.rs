//! Configuration for propagation engines.
//!
//! Engines default to breadth-first propagation. The settings can be
//! supplied in code or loaded from a YAML file:
//!
//! ```yaml
//! propagation-order: topological
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Order in which affected dependents are notified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropagationOrder {
    /// Visit dependents by distance from the changed property.
    ///
    /// Each dependent fires once. With fan-in over paths of different
    /// lengths a dependent may fire before one of its own dependencies.
    #[default]
    BreadthFirst,

    /// Fire every dependent after all of its dependencies that were also
    /// affected by the change. Cycles are broken in breadth-first order.
    Topological,
}

impl fmt::Display for PropagationOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BreadthFirst => write!(f, "breadth-first"),
            Self::Topological => write!(f, "topological"),
        }
    }
}

/// Settings for a [`PropagationEngine`](crate::engine::PropagationEngine).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EngineConfig {
    /// Notification order for dependents of a changed property
    pub propagation_order: PropagationOrder,
}

impl EngineConfig {
    /// Create a configuration with the given propagation order
    pub fn new(propagation_order: PropagationOrder) -> Self {
        Self { propagation_order }
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the text is not a valid configuration.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read, or `Error::Config` if
    /// its contents do not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if serialization fails, or `Error::Io` if the
    /// file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content)?;
        Ok(())
    }
}
