//! Collaborator contracts: the external services queries are answered from.
//!
//! Each collaborator is a capability trait. Production code plugs in
//! implementations backed by real storage; [`memory`] provides in-memory
//! implementations used as test doubles.
//!
//! Every method takes the caller's [`CancellationToken`]. Implementations
//! should return [`Error::Cancelled`](crate::Error::Cancelled) once it fires
//! and wrap their own failures with [`Error::collaborator`](crate::Error::collaborator).
//!
//! Paths passed to [`BundleIndex`] are relative to the bundle root. Paths
//! passed to [`PositionAdjuster`] are repository-relative.

pub mod memory;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::base::{BundleId, Position, Range, RepositoryId};
use crate::error::{Error, Result};
use crate::model::{
    Bundle, CodeIntelligenceRange, Diagnostic, Location, Moniker, MonikerTable,
    PackageInformation, Page,
};

/// Fail with [`Error::Cancelled`] once the caller has given up.
pub fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

/// Translates coordinates between the requested commit and indexed commits.
///
/// An adjuster is scoped to one repository and one requested commit. With
/// `reverse == false` the input is on the requested commit and is mapped onto
/// `commit`; with `reverse == true` the input is on `commit` and is mapped
/// back onto the requested commit. `None` means the path or position has no
/// counterpart on the other side.
pub trait PositionAdjuster: Send + Sync {
    fn adjust_path(
        &self,
        cancel: &CancellationToken,
        commit: &str,
        path: &str,
        reverse: bool,
    ) -> Result<Option<String>>;

    fn adjust_position(
        &self,
        cancel: &CancellationToken,
        commit: &str,
        path: &str,
        position: Position,
        reverse: bool,
    ) -> Result<Option<(String, Position)>>;

    /// Returns the commit the adjusted range belongs to along with the range.
    fn adjust_range(
        &self,
        cancel: &CancellationToken,
        commit: &str,
        path: &str,
        range: Range,
        reverse: bool,
    ) -> Result<Option<(Arc<str>, Range)>>;
}

/// Answers position-scoped queries against a single bundle's data.
pub trait BundleIndex: Send + Sync {
    /// Ranges of the document intersecting `[start_line, end_line]`.
    fn ranges(
        &self,
        cancel: &CancellationToken,
        bundle: BundleId,
        path: &str,
        start_line: u32,
        end_line: u32,
    ) -> Result<Vec<CodeIntelligenceRange>>;

    fn definitions(
        &self,
        cancel: &CancellationToken,
        bundle: BundleId,
        path: &str,
        position: Position,
    ) -> Result<Vec<Location>>;

    fn references(
        &self,
        cancel: &CancellationToken,
        bundle: BundleId,
        path: &str,
        position: Position,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Location>>;

    /// Hover text and the range it applies to.
    fn hover(
        &self,
        cancel: &CancellationToken,
        bundle: BundleId,
        path: &str,
        position: Position,
    ) -> Result<Option<(String, Range)>>;

    /// Diagnostics of every document whose path starts with `path_prefix`.
    fn diagnostics(
        &self,
        cancel: &CancellationToken,
        bundle: BundleId,
        path_prefix: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Diagnostic>>;

    /// Monikers of every range enclosing the position, one group per range,
    /// innermost range first.
    fn monikers_by_position(
        &self,
        cancel: &CancellationToken,
        bundle: BundleId,
        path: &str,
        position: Position,
    ) -> Result<Vec<Vec<Moniker>>>;

    /// Locations recorded in a moniker-indexed table of the bundle.
    #[allow(clippy::too_many_arguments)]
    fn moniker_results(
        &self,
        cancel: &CancellationToken,
        bundle: BundleId,
        table: MonikerTable,
        scheme: &str,
        identifier: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Location>>;

    fn package_information(
        &self,
        cancel: &CancellationToken,
        bundle: BundleId,
        path: &str,
        package_information_id: &str,
    ) -> Result<Option<PackageInformation>>;
}

/// Maps published packages to the bundles that provide and consume them.
pub trait PackageIndex: Send + Sync {
    /// The bundle exporting `package` under `scheme`, if one is known.
    fn resolve_export(
        &self,
        cancel: &CancellationToken,
        scheme: &str,
        package: &PackageInformation,
    ) -> Result<Option<Bundle>>;

    /// Bundles importing `package`, in a stable order.
    fn package_references(
        &self,
        cancel: &CancellationToken,
        scheme: &str,
        package: &PackageInformation,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Bundle>>;
}

/// Read-only view of the repositories bundles were indexed from.
pub trait SourceControl: Send + Sync {
    fn commit_exists(
        &self,
        cancel: &CancellationToken,
        repository: RepositoryId,
        commit: &str,
    ) -> Result<bool>;
}

/// Shared handles to every collaborator a resolver needs.
#[derive(Clone)]
pub struct Collaborators {
    pub adjuster: Arc<dyn PositionAdjuster>,
    pub index: Arc<dyn BundleIndex>,
    pub packages: Arc<dyn PackageIndex>,
    pub source: Arc<dyn SourceControl>,
}

impl Collaborators {
    pub fn new(
        adjuster: Arc<dyn PositionAdjuster>,
        index: Arc<dyn BundleIndex>,
        packages: Arc<dyn PackageIndex>,
        source: Arc<dyn SourceControl>,
    ) -> Self {
        Self {
            adjuster,
            index,
            packages,
            source,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
