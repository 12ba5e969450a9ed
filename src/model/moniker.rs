//! Monikers: symbol identifiers that link bundles together.

use smol_str::SmolStr;

/// Whether a moniker names a symbol defined here, elsewhere, or only locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonikerKind {
    /// The symbol is defined in another package.
    Import,
    /// The symbol is defined here and published for other packages.
    Export,
    /// The symbol is private to the bundle.
    Local,
}

/// A named symbol identifier attached to a range.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Moniker {
    pub kind: MonikerKind,
    pub scheme: SmolStr,
    pub identifier: SmolStr,
    /// Key of the bundle-local package information record, if linked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_information_id: Option<SmolStr>,
}

impl Moniker {
    pub fn new(
        kind: MonikerKind,
        scheme: impl Into<SmolStr>,
        identifier: impl Into<SmolStr>,
    ) -> Self {
        Self {
            kind,
            scheme: scheme.into(),
            identifier: identifier.into(),
            package_information_id: None,
        }
    }

    /// Link the moniker to a package information record.
    pub fn with_package(mut self, package_information_id: impl Into<SmolStr>) -> Self {
        self.package_information_id = Some(package_information_id.into());
        self
    }

    /// Whether this moniker can be followed into another bundle.
    pub fn has_package(&self) -> bool {
        self.package_information_id.is_some()
    }
}

/// Name and version of the package a moniker belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PackageInformation {
    pub name: SmolStr,
    pub version: SmolStr,
}

impl PackageInformation {
    pub fn new(name: impl Into<SmolStr>, version: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Which moniker-indexed result table to read from a bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MonikerTable {
    Definitions,
    References,
}

/// Keep the monikers of `kind` that carry package linkage, dropping
/// duplicates while preserving discovery order.
pub fn linked_monikers(
    monikers: impl IntoIterator<Item = Moniker>,
    kind: MonikerKind,
) -> Vec<Moniker> {
    monikers
        .into_iter()
        .filter(|moniker| moniker.kind == kind && moniker.has_package())
        .collect::<indexmap::IndexSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linked_monikers_filters_and_dedups() {
        let monikers = vec![
            Moniker::new(MonikerKind::Import, "npm", "lodash:map").with_package("p1"),
            Moniker::new(MonikerKind::Import, "npm", "lodash:filter"),
            Moniker::new(MonikerKind::Export, "npm", "app:main").with_package("p2"),
            Moniker::new(MonikerKind::Import, "npm", "lodash:reduce").with_package("p1"),
            Moniker::new(MonikerKind::Import, "npm", "lodash:map").with_package("p1"),
        ];

        let imports = linked_monikers(monikers, MonikerKind::Import);
        let identifiers: Vec<&str> = imports.iter().map(|m| m.identifier.as_str()).collect();

        assert_eq!(identifiers, vec!["lodash:map", "lodash:reduce"]);
    }

    #[test]
    fn test_moniker_kind_serializes_lowercase() {
        let json = serde_json::to_string(&MonikerKind::Export).unwrap();
        assert_eq!(json, "\"export\"");
    }
}
