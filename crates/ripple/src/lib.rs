//! Ripple - derived-property change propagation.
//!
//! A host object with named, observable properties declares which of its
//! properties are derived from others. Ripple builds a dependency graph for
//! each host type once, and a [`PropagationEngine`](engine::PropagationEngine)
//! bound to each host re-raises a change notification exactly once for every
//! derived property whenever a property it depends on changes, cycles
//! included.
//!
//! - [`domain`]: declarations a host type publishes
//! - [`graph`]: the per-type dependency graph
//! - [`registry`]: the per-type graph cache
//! - [`notify`]: the subscribe/unsubscribe capability a host exposes
//! - [`engine`]: propagation with exactly-once delivery and re-entrancy protection

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod notify;
pub mod registry;

// Public CLI module (needed by binary)
pub mod cli;

// Text and JSON rendering for the CLI
pub mod output;
