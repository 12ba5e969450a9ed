//! Code intelligence for a window of lines.

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use super::QueryResolver;
use crate::error::Result;
use crate::model::{AdjustedCodeIntelligenceRange, Bundle, CodeIntelligenceRange, resolve_locations};

impl QueryResolver {
    /// Every indexed range intersecting `start_line..=end_line` of the
    /// requested document, from every bundle.
    ///
    /// Ranges are concatenated in bundle order without deduplication, so two
    /// bundles covering the same symbol each contribute their own range.
    pub fn ranges(
        &self,
        cancel: &CancellationToken,
        start_line: u32,
        end_line: u32,
    ) -> Result<Vec<AdjustedCodeIntelligenceRange>> {
        self.observe("ranges", || {
            tracing::debug!(start_line, end_line, "resolving ranges");
            let per_bundle = self
                .bundles
                .par_iter()
                .map(|bundle| self.bundle_ranges(cancel, bundle, start_line, end_line))
                .collect::<Result<Vec<_>>>()?;
            Ok(per_bundle.into_iter().flatten().collect())
        })
    }

    fn bundle_ranges(
        &self,
        cancel: &CancellationToken,
        bundle: &Bundle,
        start_line: u32,
        end_line: u32,
    ) -> Result<Vec<AdjustedCodeIntelligenceRange>> {
        let Some(path) = self.adjust_path_for(cancel, bundle)? else {
            return Ok(Vec::new());
        };

        let ranges = self.collaborators.index.ranges(
            cancel,
            bundle.id,
            bundle.relative_path(&path),
            start_line,
            end_line,
        )?;

        ranges
            .into_iter()
            .map(|range| self.adjust_code_intelligence_range(cancel, bundle, &path, range))
            .collect()
    }

    fn adjust_code_intelligence_range(
        &self,
        cancel: &CancellationToken,
        bundle: &Bundle,
        path: &str,
        range: CodeIntelligenceRange,
    ) -> Result<AdjustedCodeIntelligenceRange> {
        let (_, adjusted_range) = self.adjust_range(cancel, bundle, path, range.range)?;
        let definitions =
            self.adjust_locations(cancel, resolve_locations(bundle, range.definitions))?;
        let references =
            self.adjust_locations(cancel, resolve_locations(bundle, range.references))?;

        Ok(AdjustedCodeIntelligenceRange {
            range: adjusted_range,
            definitions,
            references,
            hover_text: range.hover_text,
        })
    }
}
