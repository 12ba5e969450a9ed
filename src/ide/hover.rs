//! Hover information.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::QueryResolver;
use crate::base::{Position, Range};
use crate::error::Result;
use crate::model::Bundle;

/// Hover text and the range it applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoverResult {
    /// Markdown text to display.
    pub text: String,
    /// The bundle the hover text was read from.
    pub bundle: Bundle,
    pub adjusted_commit: Arc<str>,
    pub range: Range,
}

impl QueryResolver {
    /// Hover text for the symbol at `line:character`, taken from the first
    /// bundle that has any.
    ///
    /// Returns `None` when no bundle does, or when the winning hover range
    /// no longer exists on the requested commit.
    pub fn hover(
        &self,
        cancel: &CancellationToken,
        line: u32,
        character: u32,
    ) -> Result<Option<HoverResult>> {
        self.observe("hover", || {
            tracing::debug!(line, character, "resolving hover");
            let position = Position::new(line, character);
            let targets = self.adjust_position_per_bundle(cancel, position)?;

            for target in &targets {
                let hover = self.collaborators.index.hover(
                    cancel,
                    target.bundle.id,
                    target.relative_path(),
                    target.position,
                )?;
                let Some((text, range)) = hover.filter(|(text, _)| !text.is_empty()) else {
                    continue;
                };

                let adjusted = self.reverse_range(cancel, target.bundle, &target.path, range)?;
                let Some((adjusted_commit, range)) = adjusted else {
                    tracing::trace!(bundle = %target.bundle.id, "hover range not coverable");
                    return Ok(None);
                };
                return Ok(Some(HoverResult {
                    text,
                    bundle: target.bundle.clone(),
                    adjusted_commit,
                    range,
                }));
            }

            Ok(None)
        })
    }
}
