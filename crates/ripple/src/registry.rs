//! Per-type cache of dependency graphs.
//!
//! A graph is built the first time a type is asked for and shared by every
//! engine for that type afterwards. Entries are never evicted or rebuilt.
//!
//! # Thread Safety
//!
//! The map lock is held only long enough to fetch or insert the per-type
//! cell. The build itself runs inside the cell's one-time initialisation, so
//! threads racing on the first use of a type build the graph exactly once
//! and builds for different types do not block each other.
//!
//! A failed build is cached too: later requests for the same type get the
//! same error back without the declarations being queried again.

use crate::domain::{Declarations, DeclaresDependencies};
use crate::error::Result;
use crate::graph::DependencyGraph;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::{debug, debug_span, warn};

type GraphCell = Arc<OnceLock<Result<Arc<DependencyGraph>>>>;

/// Cache from host type to its built [`DependencyGraph`].
///
/// Pass a registry to [`PropagationEngine::create`](crate::engine::PropagationEngine::create);
/// use [`GraphRegistry::shared`] for a process-wide one.
#[derive(Debug, Default)]
pub struct GraphRegistry {
    graphs: Mutex<HashMap<TypeId, GraphCell>>,
}

impl GraphRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, created on first use.
    pub fn shared() -> &'static Self {
        static SHARED: OnceLock<GraphRegistry> = OnceLock::new();
        SHARED.get_or_init(Self::new)
    }

    /// Get the graph for `T`, building it from `T::declare_dependencies()` if needed.
    ///
    /// # Errors
    ///
    /// Returns the construction error of the first build (for example
    /// `Error::SelfDependency`) on this and every later call for `T`.
    pub fn graph_for<T: DeclaresDependencies>(&self) -> Result<Arc<DependencyGraph>> {
        debug_span!("graph_for", host = type_name::<T>())
            .in_scope(|| self.get_or_build(TypeId::of::<T>(), T::declare_dependencies))
    }

    /// Get the graph cached under `key`, building it from `declare()` if absent.
    ///
    /// `declare` runs at most once per key for the lifetime of the registry.
    ///
    /// # Errors
    ///
    /// Returns the construction error of the first build for `key`.
    pub fn get_or_build<F>(&self, key: TypeId, declare: F) -> Result<Arc<DependencyGraph>>
    where
        F: FnOnce() -> Declarations,
    {
        let cell = Arc::clone(self.lock().entry(key).or_default());

        cell.get_or_init(|| {
            let decls = declare();
            debug!(properties = decls.len(), "Building dependency graph");
            DependencyGraph::build(&decls).map(Arc::new).inspect_err(|e| {
                warn!(error = %e, "Dependency graph construction failed");
            })
        })
        .clone()
    }

    /// Whether a graph (or a construction error) is cached under `key`
    pub fn contains(&self, key: TypeId) -> bool {
        self.lock().get(&key).is_some_and(|cell| cell.get().is_some())
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    /// Whether nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TypeId, GraphCell>> {
        // The map holds no invariant a panicking holder could break.
        self.graphs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
