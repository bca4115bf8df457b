//! Domain types for dependency declarations.
//!
//! A host type describes its derived properties with a [`Declarations`]
//! table: every property it exposes, each with the ordered list of property
//! names it is derived from. The table is what the graph builder consumes;
//! nothing here inspects the host at runtime.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

/// Name of an observable property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyName(pub String);

impl PropertyName {
    /// Create a new property name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name is the empty string
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PropertyName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PropertyName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&PropertyName> for PropertyName {
    fn from(name: &PropertyName) -> Self {
        name.clone()
    }
}

impl Borrow<str> for PropertyName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PropertyName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One declared property and the properties it is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDecl {
    /// Property name
    pub name: PropertyName,

    /// Parent properties, in declaration order.
    ///
    /// Names that match no declared property are tolerated and ignored when
    /// the graph is built. Repeated names collapse to a single edge.
    #[serde(rename = "depends-on", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<PropertyName>,
}

impl PropertyDecl {
    /// Declare a property with no dependencies
    pub fn new(name: impl Into<PropertyName>) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
        }
    }

    /// Declare a property derived from `parents`
    pub fn derived<I, P>(name: impl Into<PropertyName>, parents: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PropertyName>,
    {
        Self {
            name: name.into(),
            depends_on: parents.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this property declares at least one dependency
    pub fn has_dependencies(&self) -> bool {
        !self.depends_on.is_empty()
    }
}

/// Declaration table for one host type.
///
/// Properties keep their declaration order. Declaring a name a second time
/// appends the new parents to the existing entry instead of adding a second
/// entry, so lookups by name are unambiguous.
///
/// # Example
///
/// ```
/// use ripple::domain::Declarations;
///
/// let decls = Declarations::new()
///     .property("Subtotal")
///     .property("Tax")
///     .derived("Total", ["Subtotal", "Tax"]);
///
/// assert_eq!(decls.len(), 3);
/// assert_eq!(decls.get("Total").map(|d| d.depends_on.len()), Some(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PropertyDecl>", into = "Vec<PropertyDecl>")]
pub struct Declarations {
    properties: Vec<PropertyDecl>,
    index: HashMap<PropertyName, usize>,
}

impl Declarations {
    /// Create an empty declaration table
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`declare`](Self::declare) for a property with no dependencies
    #[must_use]
    pub fn property(mut self, name: impl Into<PropertyName>) -> Self {
        self.declare(PropertyDecl::new(name));
        self
    }

    /// Builder form of [`declare`](Self::declare) for a derived property
    #[must_use]
    pub fn derived<I, P>(mut self, name: impl Into<PropertyName>, parents: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PropertyName>,
    {
        self.declare(PropertyDecl::derived(name, parents));
        self
    }

    /// Add a declaration, merging with an earlier one of the same name.
    pub fn declare(&mut self, decl: PropertyDecl) {
        if let Some(&pos) = self.index.get(decl.name.as_str()) {
            self.properties[pos].depends_on.extend(decl.depends_on);
            return;
        }
        self.index.insert(decl.name.clone(), self.properties.len());
        self.properties.push(decl);
    }

    /// Look up a declared property by name
    pub fn get(&self, name: &str) -> Option<&PropertyDecl> {
        self.index.get(name).map(|&pos| &self.properties[pos])
    }

    /// Whether a property with this name is declared
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate declarations in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &PropertyDecl> {
        self.properties.iter()
    }

    /// Number of declared properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether no properties are declared
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl FromIterator<PropertyDecl> for Declarations {
    fn from_iter<T: IntoIterator<Item = PropertyDecl>>(iter: T) -> Self {
        let mut decls = Self::new();
        decls.extend(iter);
        decls
    }
}

impl Extend<PropertyDecl> for Declarations {
    fn extend<T: IntoIterator<Item = PropertyDecl>>(&mut self, iter: T) {
        for decl in iter {
            self.declare(decl);
        }
    }
}

impl From<Vec<PropertyDecl>> for Declarations {
    fn from(decls: Vec<PropertyDecl>) -> Self {
        decls.into_iter().collect()
    }
}

impl From<Declarations> for Vec<PropertyDecl> {
    fn from(decls: Declarations) -> Self {
        decls.properties
    }
}

/// A host type that publishes dependency metadata for its properties.
///
/// This is the registration table a type hands to the graph builder in
/// place of per-property annotations. It is queried once per type, the first
/// time a [`GraphRegistry`](crate::registry::GraphRegistry) needs the graph.
pub trait DeclaresDependencies: 'static {
    /// Enumerate every property of the type with its dependency list.
    fn declare_dependencies() -> Declarations;
}
