//! Error types for ripple operations.

use std::io;
use std::sync::Arc;
use thiserror::Error;

/// The error type for ripple operations.
///
/// `Error` is `Clone` so that a failed graph build can be cached by the
/// registry and handed back to every later caller for the same type.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A property's dependency declaration resolves to the property itself.
    #[error("A property cannot be dependent on itself: {property}")]
    SelfDependency {
        /// Name of the offending property.
        property: String,
    },

    /// A property was declared with an empty name.
    #[error("Property names must not be empty")]
    EmptyPropertyName,

    /// A property name was not found in a dependency graph.
    #[error("Property not found: {0}")]
    UnknownProperty(String),

    /// A host type name was not found in a manifest.
    #[error("Type not found in manifest: {0}")]
    UnknownType(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(Arc<io::Error>),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Declaration manifest could not be parsed.
    #[error("Manifest error: {0}")]
    Manifest(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

/// A specialized Result type for ripple operations.
pub type Result<T> = std::result::Result<T, Error>;
