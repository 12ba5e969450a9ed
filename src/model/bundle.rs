//! Indexed bundles and the active bundle set of a request.

use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::rayon::ParValues;

use crate::base::{BundleId, RepositoryId};

/// One indexed snapshot of a repository.
///
/// Paths stored inside the bundle are relative to `root`; a path becomes
/// repository-relative once the root is prepended.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Bundle {
    pub id: BundleId,
    pub repository_id: RepositoryId,
    /// The commit this bundle was indexed at.
    pub commit: Arc<str>,
    /// Path prefix of the indexed project within the repository (e.g. `"lib/"`).
    pub root: Arc<str>,
}

impl Bundle {
    /// Create a bundle indexed at the repository root.
    pub fn new(id: u32, repository_id: u32, commit: impl Into<Arc<str>>) -> Self {
        Self {
            id: BundleId::new(id),
            repository_id: RepositoryId::new(repository_id),
            commit: commit.into(),
            root: Arc::from(""),
        }
    }

    /// Set the root prefix.
    pub fn with_root(mut self, root: impl Into<Arc<str>>) -> Self {
        self.root = root.into();
        self
    }

    /// Convert a repository-relative path into this bundle's coordinate space.
    ///
    /// Paths outside the root are returned unchanged.
    pub fn relative_path<'a>(&self, path: &'a str) -> &'a str {
        path.strip_prefix(self.root.as_ref()).unwrap_or(path)
    }

    /// Convert a bundle-relative path into a repository-relative one.
    pub fn qualify(&self, path: &str) -> String {
        format!("{}{}", self.root, path)
    }
}

/// The fixed, ordered set of bundles a request is answered from.
///
/// Declaration order is significant: it decides which bundle wins for
/// first-match operations and the order in which results are concatenated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BundleSet {
    /// Map from BundleId to bundle, in declaration order
    bundles: IndexMap<BundleId, Bundle>,
}

impl BundleSet {
    /// Create a new empty bundle set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bundle. A bundle whose ID is already present is ignored.
    pub fn insert(&mut self, bundle: Bundle) {
        self.bundles.entry(bundle.id).or_insert(bundle);
    }

    /// Get a bundle by ID.
    pub fn get(&self, id: BundleId) -> Option<&Bundle> {
        self.bundles.get(&id)
    }

    /// Check if a bundle is part of the set.
    pub fn contains(&self, id: BundleId) -> bool {
        self.bundles.contains_key(&id)
    }

    /// Iterate over all bundles in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Bundle> + '_ {
        self.bundles.values()
    }

    /// Parallel iterator over all bundles; collecting it preserves declaration order.
    pub fn par_iter(&self) -> ParValues<'_, BundleId, Bundle> {
        self.bundles.par_values()
    }

    /// IDs of all bundles in declaration order.
    pub fn ids(&self) -> Vec<BundleId> {
        self.bundles.keys().copied().collect()
    }

    /// Get the number of bundles.
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

impl FromIterator<Bundle> for BundleSet {
    fn from_iter<I: IntoIterator<Item = Bundle>>(iter: I) -> Self {
        let mut set = Self::new();
        for bundle in iter {
            set.insert(bundle);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_bundle_paths() {
        let bundle = Bundle::new(1, 1, "deadbeef").with_root("lib/");

        assert_eq!(bundle.relative_path("lib/a.go"), "a.go");
        assert_eq!(bundle.relative_path("cmd/main.go"), "cmd/main.go");
        assert_eq!(bundle.qualify("a.go"), "lib/a.go");
    }

    #[test]
    fn test_bundle_set_keeps_declaration_order() {
        let set: BundleSet = [
            Bundle::new(3, 1, "c"),
            Bundle::new(1, 1, "a"),
            Bundle::new(2, 1, "b"),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.ids(), vec![BundleId::new(3), BundleId::new(1), BundleId::new(2)]);
    }

    #[test]
    fn test_bundle_set_first_duplicate_wins() {
        let set: BundleSet = [Bundle::new(1, 1, "first"), Bundle::new(1, 1, "second")]
            .into_iter()
            .collect();

        assert_eq!(set.len(), 1);
        assert_eq!(set.get(BundleId::new(1)).map(|b| b.commit.as_ref()), Some("first"));
    }

    #[test]
    fn test_bundle_set_parallel_collect_is_ordered() {
        let set: BundleSet = (0..64).map(|i| Bundle::new(i, 1, "c")).collect();
        let ids: Vec<BundleId> = set.par_iter().map(|b| b.id).collect();
        assert_eq!(ids, set.ids());
    }
}
