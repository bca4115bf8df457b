//! Declaration manifests.
//!
//! A manifest describes the dependency declarations of several host types
//! in one file, so graphs can be inspected and checked without compiling the
//! hosts. YAML is the primary format; files ending in `.json` are read as
//! JSON.
//!
//! ```yaml
//! types:
//!   Invoice:
//!     - name: Subtotal
//!     - name: Tax
//!     - name: Total
//!       depends-on: [Subtotal, Tax]
//! ```

use crate::domain::Declarations;
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Declarations for a set of named host types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Declarations keyed by host type name
    #[serde(default)]
    pub types: BTreeMap<String, Declarations>,
}

impl Manifest {
    /// Parse a manifest from YAML text
    ///
    /// # Errors
    ///
    /// Returns `Error::Manifest` if the text is not a valid manifest.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::Manifest(e.to_string()))
    }

    /// Parse a manifest from JSON text
    ///
    /// # Errors
    ///
    /// Returns `Error::Manifest` if the text is not a valid manifest.
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::Manifest(e.to_string()))
    }

    /// Load a manifest, choosing the format from the file extension.
    ///
    /// Files ending in `.json` are read as JSON, everything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read, or `Error::Manifest`
    /// if its contents do not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let manifest = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };
        debug!(path = %path.display(), types = manifest.types.len(), "Loaded manifest");
        Ok(manifest)
    }

    /// Type names in sorted order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Declarations for one type
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownType` if the manifest has no such type.
    pub fn declarations(&self, type_name: &str) -> Result<&Declarations> {
        self.types
            .get(type_name)
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))
    }

    /// Build the graph for one type
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownType` if the manifest has no such type, or the
    /// construction error from [`DependencyGraph::build`].
    pub fn build_graph(&self, type_name: &str) -> Result<DependencyGraph> {
        DependencyGraph::build(self.declarations(type_name)?)
    }

    /// Build every type's graph, in type-name order.
    pub fn build_all(&self) -> Vec<(&str, Result<DependencyGraph>)> {
        self.types
            .iter()
            .map(|(name, decls)| (name.as_str(), DependencyGraph::build(decls)))
            .collect()
    }
}
