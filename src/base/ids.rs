//! Identifiers for bundles and repositories.

use std::fmt;

/// Identifier of one indexed bundle.
///
/// `BundleId` is a lightweight handle (just a u32). The bundle's commit,
/// root and owning repository live on [`crate::model::Bundle`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct BundleId(pub u32);

impl BundleId {
    /// Create a new BundleId from a raw value.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw value.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BundleId({})", self.0)
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bundle#{}", self.0)
    }
}

impl From<u32> for BundleId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<BundleId> for u32 {
    #[inline]
    fn from(id: BundleId) -> Self {
        id.0
    }
}

/// Identifier of a repository.
///
/// Two locations can only be translated between commits when they belong
/// to the same repository.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RepositoryId(pub u32);

impl RepositoryId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Debug for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RepositoryId({})", self.0)
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "repo#{}", self.0)
    }
}

impl From<u32> for RepositoryId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_id_equality() {
        let a = BundleId::new(1);
        let b = BundleId::new(1);
        let c = BundleId::new(2);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_bundle_id_display() {
        assert_eq!(BundleId::new(7).to_string(), "bundle#7");
        assert_eq!(RepositoryId::new(3).to_string(), "repo#3");
    }

    #[test]
    fn test_bundle_id_serializes_as_number() {
        let json = serde_json::to_string(&BundleId::new(42)).unwrap();
        assert_eq!(json, "42");

        let back: BundleId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BundleId::new(42));
    }

    #[test]
    fn test_bundle_id_size() {
        assert_eq!(std::mem::size_of::<BundleId>(), 4);
    }
}
