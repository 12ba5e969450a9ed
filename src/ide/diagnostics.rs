//! Diagnostics under the requested path.

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use super::QueryResolver;
use crate::error::Result;
use crate::model::{AdjustedDiagnostic, Bundle, Page};

/// Diagnostics gathered from every bundle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticsResult {
    pub diagnostics: Vec<AdjustedDiagnostic>,
    /// Sum of the totals each bundle reported. This can exceed the number of
    /// diagnostics returned, and also the number that actually exist when
    /// bundles overlap.
    pub total_count: usize,
}

impl QueryResolver {
    /// Up to `limit` diagnostics for documents under the requested path.
    pub fn diagnostics(
        &self,
        cancel: &CancellationToken,
        limit: usize,
    ) -> Result<DiagnosticsResult> {
        self.observe("diagnostics", || {
            tracing::debug!(limit, "resolving diagnostics");
            let per_bundle = self
                .bundles
                .par_iter()
                .map(|bundle| self.bundle_diagnostics(cancel, bundle, limit))
                .collect::<Result<Vec<_>>>()?;

            let total_count = per_bundle.iter().map(|page| page.total).sum();
            let mut diagnostics: Vec<AdjustedDiagnostic> =
                per_bundle.into_iter().flat_map(|page| page.items).collect();
            diagnostics.truncate(limit);

            Ok(DiagnosticsResult {
                diagnostics,
                total_count,
            })
        })
    }

    fn bundle_diagnostics(
        &self,
        cancel: &CancellationToken,
        bundle: &Bundle,
        limit: usize,
    ) -> Result<Page<AdjustedDiagnostic>> {
        let Some(path) = self.adjust_path_for(cancel, bundle)? else {
            return Ok(Page::empty());
        };

        let page = self.collaborators.index.diagnostics(
            cancel,
            bundle.id,
            bundle.relative_path(&path),
            0,
            limit,
        )?;

        let items = page
            .items
            .into_iter()
            .map(|diagnostic| {
                let diagnostic = diagnostic.resolve(bundle);
                let (adjusted_commit, adjusted_range) =
                    self.adjust_range(cancel, bundle, &diagnostic.path, diagnostic.range)?;
                Ok(AdjustedDiagnostic {
                    diagnostic,
                    bundle: bundle.clone(),
                    adjusted_commit,
                    adjusted_range,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(items, page.total))
    }
}
