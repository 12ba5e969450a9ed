//! Foundation types for code-navigation queries.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`BundleId`], [`RepositoryId`] - Identifiers
//! - [`Position`], [`Range`] - Zero-based source coordinates
//!
//! This module has NO dependencies on other codenav modules.

mod ids;
mod span;

pub use ids::{BundleId, RepositoryId};
pub use span::{Position, Range};
