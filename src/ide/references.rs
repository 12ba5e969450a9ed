//! Find-all-references with cursor pagination across bundles.

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use super::QueryResolver;
use super::cursor::ReferenceCursor;
use super::pager::{PageToken, ReferencePage, ReferencePageResolver};
use crate::base::Position;
use crate::error::{Error, Result};
use crate::model::{AdjustedLocation, Bundle};

/// One page of references and the cursor for the next one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferencesPage {
    pub locations: Vec<AdjustedLocation>,
    /// Opaque continuation cursor; empty when there are no further pages.
    pub end_cursor: String,
}

impl ReferencesPage {
    pub fn has_next_page(&self) -> bool {
        !self.end_cursor.is_empty()
    }
}

impl QueryResolver {
    /// One page of references to the symbol at `line:character`.
    ///
    /// Each bundle contributes at most `limit` locations per page. Pass the
    /// previous page's `end_cursor` to continue; an empty cursor starts from
    /// the beginning.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidLimit` for a non-positive `limit` before any
    /// collaborator is consulted, and `Error::MalformedCursor` when `cursor`
    /// was not produced by this operation.
    pub fn references(
        &self,
        cancel: &CancellationToken,
        line: u32,
        character: u32,
        limit: i64,
        cursor: &str,
    ) -> Result<ReferencesPage> {
        self.observe("references", || {
            tracing::debug!(
                line,
                character,
                limit,
                has_cursor = !cursor.is_empty(),
                "resolving references"
            );
            let limit = usize::try_from(limit)
                .ok()
                .filter(|&limit| limit > 0)
                .ok_or(Error::InvalidLimit { limit })?;
            let cursor = ReferenceCursor::decode(cursor)?;
            let position = Position::new(line, character);

            let pages = self
                .bundles
                .par_iter()
                .map(|bundle| self.bundle_references(cancel, bundle, position, limit, &cursor))
                .collect::<Result<Vec<_>>>()?;

            let mut locations = Vec::new();
            let mut next_cursor = ReferenceCursor::new();
            for (bundle, page) in self.bundles.iter().zip(pages) {
                let Some(page) = page else {
                    continue;
                };
                locations.extend(page.locations);
                if let Some(token) = page.next {
                    next_cursor.insert(bundle.id, token.encode()?);
                }
            }

            let end_cursor = next_cursor.encode()?;
            let locations = self.adjust_locations(cancel, locations)?;
            tracing::debug!(
                locations = locations.len(),
                more = !end_cursor.is_empty(),
                "resolved reference page"
            );
            Ok(ReferencesPage {
                locations,
                end_cursor,
            })
        })
    }

    fn bundle_references(
        &self,
        cancel: &CancellationToken,
        bundle: &Bundle,
        position: Position,
        limit: usize,
        cursor: &ReferenceCursor,
    ) -> Result<Option<ReferencePage>> {
        let raw_token = cursor.get(bundle.id);
        if !cursor.is_empty() && raw_token.is_none() {
            return Ok(None);
        }

        let Some(target) = self.adjust_position_for(cancel, bundle, position)? else {
            return Ok(None);
        };

        let token = match raw_token {
            Some(raw) => PageToken::decode_for(raw, bundle.id)?,
            None => PageToken::create(
                cancel,
                &self.collaborators,
                bundle,
                target.relative_path(),
                target.position,
            )?,
        };

        ReferencePageResolver::new(&self.collaborators, self.config.remote_bundle_limit, limit)
            .resolve_page(cancel, bundle, token)
            .map(Some)
    }
}
