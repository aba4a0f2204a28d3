//! Normalize live cloud-resource state for declarative config emission
//!
//! Resources arrive from a listing source as seed attributes plus an
//! identifier, are refreshed into a dynamically typed state tree, fixed up
//! by per-service hooks, and filtered before emission.
//!
//! # Module Structure
//!
//! - [`value`] - Dynamic state tree with unification and conversion
//! - [`resource`] - Resource entity and state attribute accessors
//! - [`refresh`] - Refresh capability and batch refresh
//! - [`filter`] - Inclusion filters over resource state
//! - [`hooks`] - Per-service post-convert fixups
//! - [`seed`] - Seed resources loaded from disk
//! - [`config`] - Persistent user configuration

pub mod config;
pub mod document;
pub mod filter;
pub mod hooks;
pub mod refresh;
pub mod resource;
pub mod seed;
pub mod value;

pub use filter::ResourceFilter;
pub use refresh::{refresh_all, Refresher, SnapshotRefresher};
pub use resource::{Address, Resource};
pub use value::{list_to_value, Type, Value};
