//! The query resolver and the adjustment steps shared by every operation.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::base::{Position, Range, RepositoryId};
use crate::config::ResolverConfig;
use crate::error::Result;
use crate::model::{AdjustedLocation, Bundle, BundleSet, ResolvedLocation};
use crate::store::{Collaborators, ensure_not_cancelled};

/// The repository, commit and path a request is made against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryTarget {
    pub repository_id: RepositoryId,
    pub commit: Arc<str>,
    /// Repository-relative path on the requested commit.
    pub path: Arc<str>,
}

impl QueryTarget {
    pub fn new(repository_id: u32, commit: impl Into<Arc<str>>, path: impl Into<Arc<str>>) -> Self {
        Self {
            repository_id: RepositoryId::new(repository_id),
            commit: commit.into(),
            path: path.into(),
        }
    }
}

/// Answers navigation queries for one repository, commit and path from a
/// fixed set of bundles.
///
/// The resolver holds no mutable state: every operation can be called
/// concurrently from several threads. Per-bundle work runs on the rayon
/// pool and is collected in bundle declaration order.
#[derive(Debug)]
pub struct QueryResolver {
    pub(super) collaborators: Collaborators,
    pub(super) target: QueryTarget,
    pub(super) bundles: BundleSet,
    pub(super) config: ResolverConfig,
}

/// A bundle paired with the request's path and position translated onto the
/// bundle's indexed commit.
#[derive(Debug)]
pub(super) struct BundleTarget<'a> {
    pub bundle: &'a Bundle,
    /// Repository-relative path on the indexed commit.
    pub path: String,
    pub position: Position,
}

impl BundleTarget<'_> {
    /// The path in the bundle's own coordinate space.
    pub fn relative_path(&self) -> &str {
        self.bundle.relative_path(&self.path)
    }
}

impl QueryResolver {
    pub fn new(
        collaborators: Collaborators,
        target: QueryTarget,
        bundles: BundleSet,
        config: ResolverConfig,
    ) -> Self {
        Self {
            collaborators,
            target,
            bundles,
            config,
        }
    }

    pub fn target(&self) -> &QueryTarget {
        &self.target
    }

    pub fn bundles(&self) -> &BundleSet {
        &self.bundles
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Run one operation inside a tracing span, reporting failures and slow requests.
    pub(super) fn observe<T>(
        &self,
        operation: &'static str,
        run: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let span = tracing::debug_span!(
            "codenav.query",
            operation,
            repository_id = %self.target.repository_id,
            commit = %self.target.commit,
            path = %self.target.path,
            bundles = ?self.bundles.ids(),
        );
        let _entered = span.enter();

        let started = Instant::now();
        let result = run();
        let elapsed = started.elapsed();

        if let Err(err) = &result {
            tracing::debug!(error = %err, "query failed");
        }
        if elapsed > self.config.slow_request_threshold() {
            let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(operation, elapsed_ms, "slow code navigation request");
        }
        result
    }

    /// Translate the requested path onto `bundle`'s commit.
    pub(super) fn adjust_path_for(
        &self,
        cancel: &CancellationToken,
        bundle: &Bundle,
    ) -> Result<Option<String>> {
        ensure_not_cancelled(cancel)?;
        let adjusted =
            self.collaborators
                .adjuster
                .adjust_path(cancel, &bundle.commit, &self.target.path, false)?;
        if adjusted.is_none() {
            tracing::trace!(bundle = %bundle.id, "path not coverable, skipping bundle");
        }
        Ok(adjusted)
    }

    /// Translate the requested path and position onto `bundle`'s commit.
    pub(super) fn adjust_position_for<'a>(
        &self,
        cancel: &CancellationToken,
        bundle: &'a Bundle,
        position: Position,
    ) -> Result<Option<BundleTarget<'a>>> {
        ensure_not_cancelled(cancel)?;
        let adjusted = self.collaborators.adjuster.adjust_position(
            cancel,
            &bundle.commit,
            &self.target.path,
            position,
            false,
        )?;
        let Some((path, position)) = adjusted else {
            tracing::trace!(
                bundle = %bundle.id,
                %position,
                "position not coverable, skipping bundle"
            );
            return Ok(None);
        };
        Ok(Some(BundleTarget {
            bundle,
            path,
            position,
        }))
    }

    /// Translate the requested position onto every bundle that covers it,
    /// in bundle order.
    pub(super) fn adjust_position_per_bundle(
        &self,
        cancel: &CancellationToken,
        position: Position,
    ) -> Result<Vec<BundleTarget<'_>>> {
        let targets = self
            .bundles
            .par_iter()
            .map(|bundle| self.adjust_position_for(cancel, bundle, position))
            .collect::<Result<Vec<_>>>()?;
        Ok(targets.into_iter().flatten().collect())
    }

    /// Translate a range read from `bundle` back onto the requested commit.
    ///
    /// Ranges from another repository cannot be translated and keep the
    /// bundle's commit, as do ranges the adjuster cannot cover.
    pub(super) fn adjust_range(
        &self,
        cancel: &CancellationToken,
        bundle: &Bundle,
        path: &str,
        range: Range,
    ) -> Result<(Arc<str>, Range)> {
        let adjusted = self.reverse_range(cancel, bundle, path, range)?;
        Ok(adjusted.unwrap_or_else(|| (bundle.commit.clone(), range)))
    }

    /// Like [`Self::adjust_range`], but `None` when a range of the requested
    /// repository has no counterpart on the requested commit.
    pub(super) fn reverse_range(
        &self,
        cancel: &CancellationToken,
        bundle: &Bundle,
        path: &str,
        range: Range,
    ) -> Result<Option<(Arc<str>, Range)>> {
        if bundle.repository_id != self.target.repository_id {
            return Ok(Some((bundle.commit.clone(), range)));
        }

        ensure_not_cancelled(cancel)?;
        let adjusted =
            self.collaborators
                .adjuster
                .adjust_range(cancel, &bundle.commit, path, range, true)?;
        Ok(adjusted.map(|(_, adjusted_range)| (self.target.commit.clone(), adjusted_range)))
    }

    /// Translate resolved locations onto the requested commit.
    pub(super) fn adjust_locations(
        &self,
        cancel: &CancellationToken,
        locations: Vec<ResolvedLocation>,
    ) -> Result<Vec<AdjustedLocation>> {
        locations
            .into_iter()
            .map(|location| {
                let (adjusted_commit, adjusted_range) =
                    self.adjust_range(cancel, &location.bundle, &location.path, location.range)?;
                Ok(AdjustedLocation {
                    bundle: location.bundle,
                    path: location.path,
                    adjusted_commit,
                    adjusted_range,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::base::BundleId;
    use crate::store::memory::{
        CommitDiff, LineShiftAdjuster, MemoryBundleIndex, MemoryPackageIndex, MemorySourceControl,
    };
    use tracing_test::traced_test;

    fn resolver_with(
        adjuster: LineShiftAdjuster,
        bundles: Vec<Bundle>,
    ) -> (QueryResolver, Arc<LineShiftAdjuster>) {
        let adjuster = Arc::new(adjuster);
        let collaborators = Collaborators::new(
            adjuster.clone(),
            Arc::new(MemoryBundleIndex::new()),
            Arc::new(MemoryPackageIndex::new()),
            Arc::new(MemorySourceControl::new()),
        );
        let resolver = QueryResolver::new(
            collaborators,
            QueryTarget::new(1, "head", "src/main.go"),
            bundles.into_iter().collect(),
            ResolverConfig::default(),
        );
        (resolver, adjuster)
    }

    #[test]
    fn test_adjust_range_other_repository_is_untouched() {
        let (resolver, adjuster) = resolver_with(
            LineShiftAdjuster::new("head").with_commit("old", CommitDiff::shifted(5)),
            Vec::new(),
        );
        let foreign = Bundle::new(9, 2, "old");
        let range = Range::from_coords(3, 0, 3, 5);

        let (commit, adjusted) = resolver
            .adjust_range(&CancellationToken::new(), &foreign, "lib.go", range)
            .unwrap();

        assert_eq!(commit.as_ref(), "old");
        assert_eq!(adjusted, range);
        assert_eq!(adjuster.calls(), 0);
    }

    #[test]
    fn test_adjust_range_same_repository_uses_requested_commit() {
        let (resolver, _) = resolver_with(
            LineShiftAdjuster::new("head").with_commit("old", CommitDiff::shifted(5)),
            Vec::new(),
        );
        let bundle = Bundle::new(1, 1, "old");

        let range = Range::from_coords(8, 0, 8, 2);
        let (commit, adjusted) = resolver
            .adjust_range(&CancellationToken::new(), &bundle, "src/main.go", range)
            .unwrap();

        assert_eq!(commit.as_ref(), "head");
        assert_eq!(adjusted, Range::from_coords(3, 0, 3, 2));
    }

    #[test]
    fn test_adjust_range_uncoverable_falls_back_to_indexed_commit() {
        let (resolver, _) = resolver_with(
            LineShiftAdjuster::new("head").with_commit("old", CommitDiff::uncoverable()),
            Vec::new(),
        );
        let bundle = Bundle::new(1, 1, "old");
        let range = Range::from_coords(8, 0, 8, 2);

        let (commit, adjusted) = resolver
            .adjust_range(&CancellationToken::new(), &bundle, "src/main.go", range)
            .unwrap();

        assert_eq!(commit.as_ref(), "old");
        assert_eq!(adjusted, range);
    }

    #[test]
    fn test_adjust_position_per_bundle_skips_uncoverable() {
        let (resolver, _) = resolver_with(
            LineShiftAdjuster::new("head")
                .with_commit("gone", CommitDiff::uncoverable())
                .with_commit("old", CommitDiff::shifted(1)),
            vec![
                Bundle::new(1, 1, "gone"),
                Bundle::new(2, 1, "old"),
                Bundle::new(3, 1, "head"),
            ],
        );

        let targets = resolver
            .adjust_position_per_bundle(&CancellationToken::new(), Position::new(4, 2))
            .unwrap();
        let summary: Vec<(BundleId, Position)> =
            targets.iter().map(|t| (t.bundle.id, t.position)).collect();

        assert_eq!(
            summary,
            vec![
                (BundleId::new(2), Position::new(5, 2)),
                (BundleId::new(3), Position::new(4, 2)),
            ]
        );
    }

    #[test]
    fn test_bundle_target_relative_path_strips_root() {
        let bundle = Bundle::new(1, 1, "c").with_root("src/");
        let target = BundleTarget {
            bundle: &bundle,
            path: "src/main.go".to_string(),
            position: Position::default(),
        };
        assert_eq!(target.relative_path(), "main.go");
    }

    #[test]
    fn test_reverse_range_reports_uncoverable_ranges() {
        let (resolver, _) = resolver_with(
            LineShiftAdjuster::new("head").with_commit("old", CommitDiff::uncoverable()),
            Vec::new(),
        );
        let cancel = CancellationToken::new();
        let range = Range::from_coords(8, 0, 8, 2);

        let same_repo = Bundle::new(1, 1, "old");
        assert_eq!(resolver.reverse_range(&cancel, &same_repo, "a.go", range).unwrap(), None);

        let other_repo = Bundle::new(2, 7, "old");
        let (commit, adjusted) = resolver
            .reverse_range(&cancel, &other_repo, "a.go", range)
            .unwrap()
            .unwrap();
        assert_eq!(commit.as_ref(), "old");
        assert_eq!(adjusted, range);
    }

    #[test]
    #[traced_test]
    fn test_operations_log_their_arguments() {
        let (resolver, _) = resolver_with(
            LineShiftAdjuster::new("head"),
            vec![Bundle::new(1, 1, "head")],
        );
        let cancel = CancellationToken::new();

        resolver.ranges(&cancel, 3, 9).unwrap();
        resolver.definitions(&cancel, 11, 4).unwrap();
        resolver.references(&cancel, 12, 6, 25, "").unwrap();
        resolver.diagnostics(&cancel, 17).unwrap();

        assert!(logs_contain("start_line=3"));
        assert!(logs_contain("end_line=9"));
        assert!(logs_contain("line=11"));
        assert!(logs_contain("character=6"));
        assert!(logs_contain("limit=25"));
        assert!(logs_contain("limit=17"));
    }

    #[test]
    #[traced_test]
    fn test_uncoverable_position_at_line_limit_is_logged() {
        let (resolver, _) = resolver_with(
            LineShiftAdjuster::new("head").with_commit("old", CommitDiff::shifted(1)),
            vec![Bundle::new(1, 1, "old")],
        );

        let hover = resolver
            .hover(&CancellationToken::new(), u32::MAX, u32::MAX)
            .unwrap();

        assert!(hover.is_none());
        assert!(logs_contain("position not coverable"));
    }
}
