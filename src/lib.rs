//! # codenav-query
//!
//! Code-navigation query resolution over precomputed code-intelligence
//! bundles, with cross-bundle federation through package monikers.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide     → Query operations (ranges, definitions, references, hover, diagnostics)
//!   ↓
//! store   → Collaborator traits and in-memory implementations
//!   ↓
//! model   → Bundles, locations, monikers, diagnostics
//!   ↓
//! base    → Primitives (BundleId, RepositoryId, Position, Range)
//! ```
//!
//! `config` and `error` are shared by every layer.

/// Foundation types: identifiers, positions and ranges
pub mod base;

/// Resolver budgets and thresholds
pub mod config;

pub mod error;

/// Query operations: ranges, definitions, references, hover, diagnostics
pub mod ide;

/// Data model: bundles, locations, monikers, diagnostics
pub mod model;

/// Collaborator contracts and in-memory implementations
pub mod store;

pub use base::{BundleId, Position, Range, RepositoryId};
pub use config::ResolverConfig;
pub use error::{Error, Result};
pub use ide::{
    DiagnosticsResult, HoverResult, QueryResolver, QueryTarget, ReferenceCursor, ReferencesPage,
};
pub use store::Collaborators;
