//! Locations in the three frames they pass through: bundle-relative,
//! repository-relative on the indexed commit, and adjusted to the
//! requested commit.

use std::sync::Arc;

use super::Bundle;
use crate::base::Range;

/// A location as stored in a bundle. `path` is relative to the bundle root.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub path: String,
    pub range: Range,
}

impl Location {
    pub fn new(path: impl Into<String>, range: Range) -> Self {
        Self {
            path: path.into(),
            range,
        }
    }
}

/// A location attached to the bundle that produced it, with the bundle root
/// prepended so `path` is repository-relative on the indexed commit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedLocation {
    pub bundle: Bundle,
    pub path: String,
    pub range: Range,
}

/// A location translated to the requested commit where possible.
///
/// `adjusted_commit` is the requested commit when translation succeeded and
/// the bundle's indexed commit otherwise.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AdjustedLocation {
    /// Provenance: the bundle the location was read from.
    pub bundle: Bundle,
    pub path: String,
    pub adjusted_commit: Arc<str>,
    pub adjusted_range: Range,
}

/// Everything a bundle knows about one range of a document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeIntelligenceRange {
    pub range: Range,
    pub definitions: Vec<Location>,
    pub references: Vec<Location>,
    pub hover_text: String,
}

/// A [`CodeIntelligenceRange`] with its range and nested locations adjusted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdjustedCodeIntelligenceRange {
    pub range: Range,
    pub definitions: Vec<AdjustedLocation>,
    pub references: Vec<AdjustedLocation>,
    pub hover_text: String,
}

/// Attach locations read from `bundle` to that bundle, prefixing its root.
pub fn resolve_locations(
    bundle: &Bundle,
    locations: impl IntoIterator<Item = Location>,
) -> Vec<ResolvedLocation> {
    locations
        .into_iter()
        .map(|location| ResolvedLocation {
            bundle: bundle.clone(),
            path: bundle.qualify(&location.path),
            range: location.range,
        })
        .collect()
}
