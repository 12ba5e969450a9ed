//! In-memory collaborators.
//!
//! These back the test suite and make the collaborator contracts concrete.
//! Each one counts the calls it receives so tests can assert which
//! collaborators were touched, and can be told to fail.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tokio_util::sync::CancellationToken;

use super::{BundleIndex, PackageIndex, PositionAdjuster, SourceControl, ensure_not_cancelled};
use crate::base::{BundleId, Position, Range, RepositoryId};
use crate::error::{Collaborator, Error, Result};
use crate::model::{
    Bundle, CodeIntelligenceRange, Diagnostic, Location, Moniker, MonikerTable,
    PackageInformation, Page,
};

// ============================================================================
// POSITION ADJUSTER
// ============================================================================

/// How one indexed commit differs from the requested commit.
#[derive(Clone, Debug, Default)]
pub struct CommitDiff {
    /// Lines to add to a requested-commit line to reach the indexed commit.
    line_delta: i64,
    /// Requested-commit path → indexed-commit path.
    renames: FxHashMap<String, String>,
    /// Requested-commit paths that do not exist on the indexed commit.
    missing_paths: FxHashSet<String>,
    /// Nothing on the indexed commit maps to the requested commit.
    uncoverable: bool,
}

impl CommitDiff {
    /// Every line moved by `line_delta`.
    pub fn shifted(line_delta: i64) -> Self {
        Self {
            line_delta,
            ..Self::default()
        }
    }

    /// No path or position can be translated.
    pub fn uncoverable() -> Self {
        Self {
            uncoverable: true,
            ..Self::default()
        }
    }

    pub fn with_rename(mut self, requested: impl Into<String>, indexed: impl Into<String>) -> Self {
        self.renames.insert(requested.into(), indexed.into());
        self
    }

    pub fn with_missing_path(mut self, requested: impl Into<String>) -> Self {
        self.missing_paths.insert(requested.into());
        self
    }

    fn forward_path(&self, path: &str) -> Option<String> {
        if self.uncoverable || self.missing_paths.contains(path) {
            return None;
        }
        Some(self.renames.get(path).cloned().unwrap_or_else(|| path.to_string()))
    }

    fn reverse_path(&self, path: &str) -> Option<String> {
        if self.uncoverable {
            return None;
        }
        let requested = self
            .renames
            .iter()
            .find(|(_, indexed)| indexed.as_str() == path)
            .map(|(requested, _)| requested.clone())
            .unwrap_or_else(|| path.to_string());
        if self.missing_paths.contains(&requested) {
            return None;
        }
        Some(requested)
    }

    fn delta(&self, reverse: bool) -> i64 {
        if reverse { -self.line_delta } else { self.line_delta }
    }
}

/// Adjuster where each indexed commit differs from the requested commit by a
/// constant line shift plus optional renames. Commits without a registered
/// diff are identical to the requested commit.
#[derive(Debug)]
pub struct LineShiftAdjuster {
    requested_commit: Arc<str>,
    commits: FxHashMap<String, CommitDiff>,
    failing: bool,
    calls: AtomicUsize,
}

impl LineShiftAdjuster {
    pub fn new(requested_commit: impl Into<Arc<str>>) -> Self {
        Self {
            requested_commit: requested_commit.into(),
            commits: FxHashMap::default(),
            failing: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Register how `commit` differs from the requested commit.
    pub fn with_commit(mut self, commit: impl Into<String>, diff: CommitDiff) -> Self {
        self.commits.insert(commit.into(), diff);
        self
    }

    /// Make every call fail.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, cancel: &CancellationToken, commit: &str) -> Result<CommitDiff> {
        ensure_not_cancelled(cancel)?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Error::collaborator(
                Collaborator::PositionAdjuster,
                format!("no diff available for commit {commit}"),
            ));
        }
        Ok(self.commits.get(commit).cloned().unwrap_or_default())
    }

    fn path(diff: &CommitDiff, path: &str, reverse: bool) -> Option<String> {
        if reverse {
            diff.reverse_path(path)
        } else {
            diff.forward_path(path)
        }
    }
}

impl PositionAdjuster for LineShiftAdjuster {
    fn adjust_path(
        &self,
        cancel: &CancellationToken,
        commit: &str,
        path: &str,
        reverse: bool,
    ) -> Result<Option<String>> {
        let diff = self.enter(cancel, commit)?;
        Ok(Self::path(&diff, path, reverse))
    }

    fn adjust_position(
        &self,
        cancel: &CancellationToken,
        commit: &str,
        path: &str,
        position: Position,
        reverse: bool,
    ) -> Result<Option<(String, Position)>> {
        let diff = self.enter(cancel, commit)?;
        let Some(adjusted_path) = Self::path(&diff, path, reverse) else {
            return Ok(None);
        };
        let line = u32::try_from(i64::from(position.line) + diff.delta(reverse)).ok();
        Ok(line.map(|line| (adjusted_path, Position::new(line, position.character))))
    }

    fn adjust_range(
        &self,
        cancel: &CancellationToken,
        commit: &str,
        path: &str,
        range: Range,
        reverse: bool,
    ) -> Result<Option<(Arc<str>, Range)>> {
        let diff = self.enter(cancel, commit)?;
        if Self::path(&diff, path, reverse).is_none() {
            return Ok(None);
        }
        let target: Arc<str> = if reverse {
            self.requested_commit.clone()
        } else {
            Arc::from(commit)
        };
        Ok(range.shift_lines(diff.delta(reverse)).map(|adjusted| (target, adjusted)))
    }
}

// ============================================================================
// BUNDLE INDEX
// ============================================================================

/// One indexed range of a document and everything known about it.
#[derive(Clone, Debug, Default)]
pub struct SymbolRange {
    pub range: Range,
    pub definitions: Vec<Location>,
    pub references: Vec<Location>,
    pub hover_text: Option<String>,
    pub monikers: Vec<Moniker>,
}

impl SymbolRange {
    pub fn new(range: Range) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }

    pub fn with_definition(mut self, location: Location) -> Self {
        self.definitions.push(location);
        self
    }

    pub fn with_reference(mut self, location: Location) -> Self {
        self.references.push(location);
        self
    }

    pub fn with_hover(mut self, text: impl Into<String>) -> Self {
        self.hover_text = Some(text.into());
        self
    }

    pub fn with_moniker(mut self, moniker: Moniker) -> Self {
        self.monikers.push(moniker);
        self
    }
}

#[derive(Clone, Debug, Default)]
struct Document {
    ranges: Vec<SymbolRange>,
    diagnostics: Vec<Diagnostic>,
}

impl Document {
    /// Ranges containing the position, innermost first.
    fn enclosing(&self, position: Position) -> Vec<&SymbolRange> {
        let mut ranges: Vec<&SymbolRange> = self
            .ranges
            .iter()
            .filter(|r| r.range.contains(position))
            .collect();
        ranges.sort_by(|a, b| {
            b.range
                .start
                .cmp(&a.range.start)
                .then(a.range.end.cmp(&b.range.end))
        });
        ranges
    }
}

/// A recorded call against [`MemoryBundleIndex`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexCall {
    pub method: &'static str,
    pub bundle: BundleId,
}

type MonikerKey = (BundleId, MonikerTable, SmolStr, SmolStr);

/// Bundle index holding every bundle's documents in memory.
#[derive(Debug, Default)]
pub struct MemoryBundleIndex {
    /// Bundle → path → document, paths relative to the bundle root
    documents: FxHashMap<BundleId, BTreeMap<String, Document>>,
    moniker_results: FxHashMap<MonikerKey, Vec<Location>>,
    packages: FxHashMap<(BundleId, SmolStr), PackageInformation>,
    failing: FxHashSet<BundleId>,
    calls: Mutex<Vec<IndexCall>>,
}

impl MemoryBundleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an indexed range to a document.
    pub fn add_range(&mut self, bundle: BundleId, path: impl Into<String>, range: SymbolRange) {
        self.document_mut(bundle, path.into()).ranges.push(range);
    }

    /// Add a diagnostic to the document named by its path.
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        let path = diagnostic.path.clone();
        self.document_mut(diagnostic.bundle_id, path).diagnostics.push(diagnostic);
    }

    /// Record the locations of a moniker-indexed table.
    pub fn add_moniker_results(
        &mut self,
        bundle: BundleId,
        table: MonikerTable,
        scheme: &str,
        identifier: &str,
        locations: Vec<Location>,
    ) {
        self.moniker_results
            .entry((bundle, table, SmolStr::new(scheme), SmolStr::new(identifier)))
            .or_default()
            .extend(locations);
    }

    pub fn add_package_information(
        &mut self,
        bundle: BundleId,
        package_information_id: &str,
        package: PackageInformation,
    ) {
        self.packages
            .insert((bundle, SmolStr::new(package_information_id)), package);
    }

    /// Make every call against `bundle` fail.
    pub fn fail_on(&mut self, bundle: BundleId) {
        self.failing.insert(bundle);
    }

    /// All calls received so far, in arrival order.
    pub fn calls(&self) -> Vec<IndexCall> {
        self.calls.lock().clone()
    }

    /// Bundles that received a call to `method`.
    pub fn bundles_called(&self, method: &str) -> Vec<BundleId> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method)
            .map(|call| call.bundle)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn document_mut(&mut self, bundle: BundleId, path: String) -> &mut Document {
        self.documents.entry(bundle).or_default().entry(path).or_default()
    }

    fn enter(
        &self,
        cancel: &CancellationToken,
        method: &'static str,
        bundle: BundleId,
    ) -> Result<()> {
        ensure_not_cancelled(cancel)?;
        self.calls.lock().push(IndexCall { method, bundle });
        if self.failing.contains(&bundle) {
            return Err(Error::collaborator(
                Collaborator::BundleIndex,
                format!("{bundle} is unavailable"),
            ));
        }
        Ok(())
    }

    fn document(&self, bundle: BundleId, path: &str) -> Option<&Document> {
        self.documents.get(&bundle)?.get(path)
    }
}

impl BundleIndex for MemoryBundleIndex {
    fn ranges(
        &self,
        cancel: &CancellationToken,
        bundle: BundleId,
        path: &str,
        start_line: u32,
        end_line: u32,
    ) -> Result<Vec<CodeIntelligenceRange>> {
        self.enter(cancel, "ranges", bundle)?;
        let Some(document) = self.document(bundle, path) else {
            return Ok(Vec::new());
        };
        Ok(document
            .ranges
            .iter()
            .filter(|r| r.range.intersects_lines(start_line, end_line))
            .map(|r| CodeIntelligenceRange {
                range: r.range,
                definitions: r.definitions.clone(),
                references: r.references.clone(),
                hover_text: r.hover_text.clone().unwrap_or_default(),
            })
            .collect())
    }

    fn definitions(
        &self,
        cancel: &CancellationToken,
        bundle: BundleId,
        path: &str,
        position: Position,
    ) -> Result<Vec<Location>> {
        self.enter(cancel, "definitions", bundle)?;
        let Some(document) = self.document(bundle, path) else {
            return Ok(Vec::new());
        };
        Ok(document
            .enclosing(position)
            .into_iter()
            .find(|r| !r.definitions.is_empty())
            .map(|r| r.definitions.clone())
            .unwrap_or_default())
    }

    fn references(
        &self,
        cancel: &CancellationToken,
        bundle: BundleId,
        path: &str,
        position: Position,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Location>> {
        self.enter(cancel, "references", bundle)?;
        let Some(document) = self.document(bundle, path) else {
            return Ok(Page::empty());
        };
        let all: Vec<Location> = document
            .enclosing(position)
            .into_iter()
            .flat_map(|r| r.references.iter().cloned())
            .collect();
        Ok(Page::slice(&all, offset, limit))
    }

    fn hover(
        &self,
        cancel: &CancellationToken,
        bundle: BundleId,
        path: &str,
        position: Position,
    ) -> Result<Option<(String, Range)>> {
        self.enter(cancel, "hover", bundle)?;
        let Some(document) = self.document(bundle, path) else {
            return Ok(None);
        };
        Ok(document
            .enclosing(position)
            .into_iter()
            .find_map(|r| r.hover_text.clone().map(|text| (text, r.range))))
    }

    fn diagnostics(
        &self,
        cancel: &CancellationToken,
        bundle: BundleId,
        path_prefix: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Diagnostic>> {
        self.enter(cancel, "diagnostics", bundle)?;
        let Some(documents) = self.documents.get(&bundle) else {
            return Ok(Page::empty());
        };
        let all: Vec<Diagnostic> = documents
            .iter()
            .filter(|(path, _)| path.starts_with(path_prefix))
            .flat_map(|(_, document)| document.diagnostics.iter().cloned())
            .collect();
        Ok(Page::slice(&all, offset, limit))
    }

    fn monikers_by_position(
        &self,
        cancel: &CancellationToken,
        bundle: BundleId,
        path: &str,
        position: Position,
    ) -> Result<Vec<Vec<Moniker>>> {
        self.enter(cancel, "monikers_by_position", bundle)?;
        let Some(document) = self.document(bundle, path) else {
            return Ok(Vec::new());
        };
        Ok(document
            .enclosing(position)
            .into_iter()
            .map(|r| r.monikers.clone())
            .collect())
    }

    fn moniker_results(
        &self,
        cancel: &CancellationToken,
        bundle: BundleId,
        table: MonikerTable,
        scheme: &str,
        identifier: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Location>> {
        self.enter(cancel, "moniker_results", bundle)?;
        let key = (bundle, table, SmolStr::new(scheme), SmolStr::new(identifier));
        Ok(self
            .moniker_results
            .get(&key)
            .map(|all| Page::slice(all, offset, limit))
            .unwrap_or_else(Page::empty))
    }

    fn package_information(
        &self,
        cancel: &CancellationToken,
        bundle: BundleId,
        _path: &str,
        package_information_id: &str,
    ) -> Result<Option<PackageInformation>> {
        self.enter(cancel, "package_information", bundle)?;
        Ok(self
            .packages
            .get(&(bundle, SmolStr::new(package_information_id)))
            .cloned())
    }
}

// ============================================================================
// PACKAGE INDEX
// ============================================================================

type PackageKey = (SmolStr, SmolStr, SmolStr);

fn package_key(scheme: &str, package: &PackageInformation) -> PackageKey {
    (SmolStr::new(scheme), package.name.clone(), package.version.clone())
}

/// Package index with explicit export and import registrations.
#[derive(Debug, Default)]
pub struct MemoryPackageIndex {
    exports: FxHashMap<PackageKey, Bundle>,
    importers: FxHashMap<PackageKey, Vec<Bundle>>,
    failing: bool,
    calls: AtomicUsize,
}

impl MemoryPackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `bundle` as the exporter of `package`.
    pub fn add_export(&mut self, scheme: &str, package: &PackageInformation, bundle: Bundle) {
        self.exports.insert(package_key(scheme, package), bundle);
    }

    /// Record `bundle` as an importer of `package`. Importers page in insertion order.
    pub fn add_importer(&mut self, scheme: &str, package: &PackageInformation, bundle: Bundle) {
        self.importers
            .entry(package_key(scheme, package))
            .or_default()
            .push(bundle);
    }

    pub fn fail(&mut self) {
        self.failing = true;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, cancel: &CancellationToken) -> Result<()> {
        ensure_not_cancelled(cancel)?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Error::collaborator(
                Collaborator::PackageIndex,
                "package index unavailable",
            ));
        }
        Ok(())
    }
}

impl PackageIndex for MemoryPackageIndex {
    fn resolve_export(
        &self,
        cancel: &CancellationToken,
        scheme: &str,
        package: &PackageInformation,
    ) -> Result<Option<Bundle>> {
        self.enter(cancel)?;
        Ok(self.exports.get(&package_key(scheme, package)).cloned())
    }

    fn package_references(
        &self,
        cancel: &CancellationToken,
        scheme: &str,
        package: &PackageInformation,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Bundle>> {
        self.enter(cancel)?;
        Ok(self
            .importers
            .get(&package_key(scheme, package))
            .map(|all| Page::slice(all, offset, limit))
            .unwrap_or_else(Page::empty))
    }
}

// ============================================================================
// SOURCE CONTROL
// ============================================================================

/// Source control where every commit exists unless explicitly removed.
#[derive(Debug, Default)]
pub struct MemorySourceControl {
    removed: FxHashSet<(RepositoryId, String)>,
    calls: AtomicUsize,
}

impl MemorySourceControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `commit` was force-pushed away.
    pub fn remove_commit(&mut self, repository: RepositoryId, commit: impl Into<String>) {
        self.removed.insert((repository, commit.into()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SourceControl for MemorySourceControl {
    fn commit_exists(
        &self,
        cancel: &CancellationToken,
        repository: RepositoryId,
        commit: &str,
    ) -> Result<bool> {
        ensure_not_cancelled(cancel)?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(!self.removed.contains(&(repository, commit.to_string())))
    }
}
