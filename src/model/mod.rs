//! Data model: bundles, locations, monikers and diagnostics.
//!
//! ## Key Types
//!
//! - [`Bundle`]: One indexed snapshot (repository, commit, root)
//! - [`BundleSet`]: The ordered, fixed set of bundles a request is answered from
//! - [`Location`] / [`ResolvedLocation`] / [`AdjustedLocation`]: A location in
//!   bundle, repository and requested-commit frames
//! - [`Moniker`]: Cross-bundle symbol identifier
//! - [`Diagnostic`]: Indexer-reported error or warning
//!
//! ## Frames
//!
//! ```text
//! Location           ← read from a bundle, path relative to bundle root
//!     │ resolve_locations (prepend root)
//!     ▼
//! ResolvedLocation   ← repository-relative, still on the indexed commit
//!     │ adjustment (position adjuster, reverse)
//!     ▼
//! AdjustedLocation   ← on the requested commit when coverable
//! ```

mod bundle;
mod diagnostics;
mod location;
mod moniker;

pub use bundle::{Bundle, BundleSet};
pub use diagnostics::{AdjustedDiagnostic, Diagnostic, Severity};
pub use location::{
    AdjustedCodeIntelligenceRange, AdjustedLocation, CodeIntelligenceRange, Location,
    ResolvedLocation, resolve_locations,
};
pub use moniker::{
    Moniker, MonikerKind, MonikerTable, PackageInformation, linked_monikers,
};

/// One slice of a paginated collaborator result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    /// The results in this slice.
    pub items: Vec<T>,
    /// Total number of matching results, across all slices.
    pub total: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: usize) -> Self {
        Self { items, total }
    }

    /// An empty page with no matches.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }

    /// Slice `offset..offset + limit` out of a full result list.
    pub fn slice(all: &[T], offset: usize, limit: usize) -> Self
    where
        T: Clone,
    {
        let items = all.iter().skip(offset).take(limit).cloned().collect();
        Self {
            items,
            total: all.len(),
        }
    }
}
