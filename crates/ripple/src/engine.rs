//! Propagation engine: re-raises change notifications for derived properties.
//!
//! One engine is bound to one host object. It subscribes to the host's
//! [`NotifySource`], and for every "property X changed" announcement it walks
//! the host type's shared [`DependencyGraph`] and invokes the caller's
//! callback once for every property derived, directly or transitively, from
//! X. The callback normally re-raises the host's own notification for that
//! name, which is delivered straight back to the engine; the re-entrancy
//! guard turns those echoes into no-ops.
//!
//! # States
//!
//! An engine is either idle or propagating. A notification that arrives while
//! propagating is ignored, as is one with an empty name or a name that has no
//! node in the graph. The guard is released on every exit path, including a
//! panicking callback; the panic then continues to the caller.
//!
//! # Ownership
//!
//! The engine holds its source weakly and the handler it subscribes holds
//! the engine state weakly, so neither keeps the other alive. Dropping the
//! engine unsubscribes it. A callback that needs the host should capture a
//! `Weak` as well.
//!
//! # Example
//!
//! ```
//! use ripple::domain::{Declarations, DeclaresDependencies};
//! use ripple::engine::PropagationEngine;
//! use ripple::notify::{ChangeHandler, ChangeNotifier, NotifySource, SubscriptionId};
//! use ripple::registry::GraphRegistry;
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Invoice {
//!     notifier: ChangeNotifier,
//! }
//!
//! impl DeclaresDependencies for Invoice {
//!     fn declare_dependencies() -> Declarations {
//!         Declarations::new()
//!             .property("Subtotal")
//!             .derived("Total", ["Subtotal"])
//!     }
//! }
//!
//! impl NotifySource for Invoice {
//!     fn subscribe(&self, handler: ChangeHandler) -> SubscriptionId {
//!         self.notifier.subscribe(handler)
//!     }
//!
//!     fn unsubscribe(&self, id: SubscriptionId) -> bool {
//!         self.notifier.unsubscribe(id)
//!     }
//! }
//!
//! let registry = GraphRegistry::new();
//! let invoice = Arc::new(Invoice::default());
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! let engine = PropagationEngine::create(&registry, &invoice, move |name: &str| {
//!     sink.lock().unwrap().push(name.to_string());
//! })
//! .unwrap();
//!
//! invoice.notifier.raise("Subtotal");
//! assert_eq!(*seen.lock().unwrap(), vec!["Total"]);
//!
//! engine.dispose();
//! ```

use crate::config::{EngineConfig, PropagationOrder};
use crate::domain::DeclaresDependencies;
use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::notify::{ChangeHandler, NotifySource, SubscriptionId};
use crate::registry::GraphRegistry;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::{debug, trace};

type Callback = Box<dyn Fn(&str) + Send + Sync>;

/// State shared between the engine handle and its subscribed handler.
struct EngineState {
    graph: Arc<DependencyGraph>,
    on_changed: Callback,
    order: PropagationOrder,
    propagating: AtomicBool,
}

impl EngineState {
    fn on_source_changed(&self, name: &str) {
        if name.is_empty() {
            return;
        }
        let Some(_guard) = PropagationGuard::acquire(&self.propagating) else {
            trace!(property = name, "Ignoring notification raised during propagation");
            return;
        };

        self.graph.visit_affected(name, self.order, |dependent| {
            trace!(trigger = name, property = %dependent, "Propagating change");
            (self.on_changed)(dependent.as_str());
        });
    }
}

/// Holds the re-entrancy flag for the duration of one propagation pass.
struct PropagationGuard<'a>(&'a AtomicBool);

impl<'a> PropagationGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for PropagationGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Handle for an engine bound to one host.
///
/// Dropping the handle, or calling [`dispose`](Self::dispose), unsubscribes
/// it from the host.
pub struct PropagationEngine {
    state: Arc<EngineState>,
    source: Weak<dyn NotifySource>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl PropagationEngine {
    /// Bind an engine to `host` using the default [`EngineConfig`].
    ///
    /// The graph for `H` comes from `registry`, built on first use.
    ///
    /// # Errors
    ///
    /// Returns `Error::SelfDependency` (or another construction error) if
    /// `H`'s declarations cannot form a graph. The error repeats for every
    /// host of that type.
    pub fn create<H, F>(registry: &GraphRegistry, host: &Arc<H>, on_changed: F) -> Result<Self>
    where
        H: DeclaresDependencies + NotifySource,
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self::create_with_config(registry, host, on_changed, EngineConfig::default())
    }

    /// Bind an engine to `host` with explicit settings.
    ///
    /// # Errors
    ///
    /// Same as [`create`](Self::create).
    pub fn create_with_config<H, F>(
        registry: &GraphRegistry,
        host: &Arc<H>,
        on_changed: F,
        config: EngineConfig,
    ) -> Result<Self>
    where
        H: DeclaresDependencies + NotifySource,
        F: Fn(&str) + Send + Sync + 'static,
    {
        let graph = registry.graph_for::<H>()?;
        Ok(Self::attach(graph, host, on_changed, config))
    }

    /// Bind an engine with a prebuilt graph to any notification source.
    pub fn attach<S, F>(
        graph: Arc<DependencyGraph>,
        source: &Arc<S>,
        on_changed: F,
        config: EngineConfig,
    ) -> Self
    where
        S: NotifySource + 'static,
        F: Fn(&str) + Send + Sync + 'static,
    {
        let state = Arc::new(EngineState {
            graph,
            on_changed: Box::new(on_changed),
            order: config.propagation_order,
            propagating: AtomicBool::new(false),
        });

        let weak_state = Arc::downgrade(&state);
        let handler: ChangeHandler = Arc::new(move |name: &str| {
            if let Some(state) = weak_state.upgrade() {
                state.on_source_changed(name);
            }
        });
        let subscription = source.subscribe(handler);

        debug!(
            subscription = %subscription,
            nodes = state.graph.len(),
            order = %state.order,
            "Attached propagation engine"
        );

        let source: Weak<S> = Arc::downgrade(source);
        let source: Weak<dyn NotifySource> = source;
        Self {
            state,
            source,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    /// Handle a "property changed" announcement.
    ///
    /// This is what the subscribed handler calls; hosts that deliver
    /// notifications some other way may call it directly.
    pub fn on_source_changed(&self, name: &str) {
        self.state.on_source_changed(name);
    }

    /// Unsubscribe from the host.
    ///
    /// Safe to call more than once, and after the host has been dropped.
    pub fn dispose(&self) {
        let taken = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(id) = taken else {
            return;
        };

        match self.source.upgrade() {
            Some(source) => {
                let removed = source.unsubscribe(id);
                debug!(subscription = %id, removed, "Disposed propagation engine");
            }
            None => debug!(subscription = %id, "Disposed propagation engine after source dropped"),
        }
    }

    /// Whether [`dispose`](Self::dispose) has run
    pub fn is_disposed(&self) -> bool {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Whether a propagation pass is currently running
    pub fn is_propagating(&self) -> bool {
        self.state.propagating.load(Ordering::Acquire)
    }

    /// The shared graph this engine walks
    pub fn graph(&self) -> &Arc<DependencyGraph> {
        &self.state.graph
    }

    /// Notification order in use
    pub fn order(&self) -> PropagationOrder {
        self.state.order
    }
}

impl Drop for PropagationEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for PropagationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropagationEngine")
            .field("nodes", &self.state.graph.len())
            .field("order", &self.state.order)
            .field("propagating", &self.is_propagating())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
