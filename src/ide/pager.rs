//! Reference paging for a single bundle.
//!
//! A page is filled in two phases. The local phase reads the references the
//! owning bundle recorded for the position. Once those are exhausted the
//! remote phase follows the position's export monikers to every bundle that
//! imports the exporting package and reads their moniker-indexed reference
//! tables.
//!
//! ```text
//! Local { offset } ──exhausted──► Remote { moniker, bundle_offset, result_offset }
//!        │                                 │
//!        └── page full ──► token           └── page full / budget spent ──► token
//! ```
//!
//! The [`PageToken`] carries the exact point to resume from, so following
//! tokens until none is returned visits every result exactly once.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::cursor::{decode_json, encode_json};
use crate::base::{BundleId, Position};
use crate::error::{Error, Result};
use crate::model::{
    Bundle, Location, Moniker, MonikerKind, MonikerTable, ResolvedLocation, linked_monikers,
    resolve_locations,
};
use crate::store::Collaborators;

// ============================================================================
// TOKENS
// ============================================================================

/// Where a bundle's reference walk resumes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageToken {
    pub bundle_id: BundleId,
    /// Bundle-relative path of the queried document.
    pub path: String,
    /// Query position on the bundle's indexed commit.
    pub position: Position,
    /// Export monikers at the position, captured when the walk began.
    pub monikers: Vec<Moniker>,
    pub phase: Phase,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Phase {
    Local { offset: usize },
    Remote(RemoteCursor),
}

/// Position of the remote walk: which moniker, which importing bundle, and
/// how far into that bundle's results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCursor {
    pub moniker: usize,
    pub bundle_offset: usize,
    pub result_offset: usize,
}

impl RemoteCursor {
    fn next_moniker(self) -> Self {
        Self {
            moniker: self.moniker + 1,
            bundle_offset: 0,
            result_offset: 0,
        }
    }

    fn next_bundle(self) -> Self {
        Self {
            bundle_offset: self.bundle_offset + 1,
            result_offset: 0,
            ..self
        }
    }
}

impl PageToken {
    /// Start a fresh walk at `position` of `path` in `bundle`.
    pub fn create(
        cancel: &CancellationToken,
        collaborators: &Collaborators,
        bundle: &Bundle,
        path: &str,
        position: Position,
    ) -> Result<Self> {
        let groups = collaborators
            .index
            .monikers_by_position(cancel, bundle.id, path, position)?;
        let monikers = linked_monikers(groups.into_iter().flatten(), MonikerKind::Export);

        Ok(Self {
            bundle_id: bundle.id,
            path: path.to_string(),
            position,
            monikers,
            phase: Phase::Local { offset: 0 },
        })
    }

    pub fn encode(&self) -> Result<String> {
        encode_json(self)
    }

    pub fn decode(raw: &str) -> Result<Self> {
        decode_json(raw)
    }

    /// Decode a token stored under `bundle`'s key of a cursor.
    pub fn decode_for(raw: &str, bundle: BundleId) -> Result<Self> {
        let token = Self::decode(raw)?;
        if token.bundle_id != bundle {
            return Err(Error::malformed_cursor(format!(
                "token for {} stored under {}",
                token.bundle_id, bundle
            )));
        }
        Ok(token)
    }
}

/// One page of a bundle's references.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferencePage {
    pub locations: Vec<ResolvedLocation>,
    /// Where to resume; `None` once the bundle has nothing more to report.
    pub next: Option<PageToken>,
}

impl ReferencePage {
    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Fills one [`ReferencePage`] within a result limit and a peer-bundle budget.
pub struct ReferencePageResolver<'a> {
    collaborators: &'a Collaborators,
    remote_bundle_limit: usize,
    limit: usize,
}

/// Locations gathered so far on the current page.
struct Walk {
    locations: Vec<ResolvedLocation>,
    limit: usize,
    peers_visited: usize,
}

impl Walk {
    fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.locations.len())
    }

    fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Accept as many of `items` as still fit. Returns how many were taken.
    fn take(&mut self, bundle: &Bundle, mut items: Vec<Location>) -> usize {
        items.truncate(self.remaining());
        let taken = items.len();
        self.locations.extend(resolve_locations(bundle, items));
        taken
    }
}

enum Step {
    Continue(Phase),
    Paused(Phase),
    Exhausted,
}

impl<'a> ReferencePageResolver<'a> {
    pub fn new(collaborators: &'a Collaborators, remote_bundle_limit: usize, limit: usize) -> Self {
        Self {
            collaborators,
            remote_bundle_limit: remote_bundle_limit.max(1),
            limit: limit.max(1),
        }
    }

    /// Produce the next page of `owner`'s references starting at `token`.
    pub fn resolve_page(
        &self,
        cancel: &CancellationToken,
        owner: &Bundle,
        token: PageToken,
    ) -> Result<ReferencePage> {
        let mut walk = Walk {
            locations: Vec::new(),
            limit: self.limit,
            peers_visited: 0,
        };

        let mut phase = token.phase;
        loop {
            let step = match phase {
                Phase::Local { offset } => {
                    self.local_step(cancel, owner, &token, offset, &mut walk)?
                }
                Phase::Remote(cursor) => {
                    self.remote_step(cancel, owner, &token, cursor, &mut walk)?
                }
            };
            match step {
                Step::Continue(next) => phase = next,
                Step::Paused(next) => {
                    return Ok(ReferencePage {
                        locations: walk.locations,
                        next: Some(PageToken { phase: next, ..token }),
                    });
                }
                Step::Exhausted => {
                    return Ok(ReferencePage {
                        locations: walk.locations,
                        next: None,
                    });
                }
            }
        }
    }

    fn local_step(
        &self,
        cancel: &CancellationToken,
        owner: &Bundle,
        token: &PageToken,
        mut offset: usize,
        walk: &mut Walk,
    ) -> Result<Step> {
        loop {
            let page = self.collaborators.index.references(
                cancel,
                owner.id,
                &token.path,
                token.position,
                offset,
                walk.remaining(),
            )?;
            let taken = walk.take(owner, page.items);
            offset += taken;

            if taken == 0 || offset >= page.total {
                break;
            }
            if walk.is_full() {
                return Ok(Step::Paused(Phase::Local { offset }));
            }
        }

        if token.monikers.is_empty() {
            return Ok(Step::Exhausted);
        }
        let remote = Phase::Remote(RemoteCursor::default());
        if walk.is_full() {
            Ok(Step::Paused(remote))
        } else {
            Ok(Step::Continue(remote))
        }
    }

    fn remote_step(
        &self,
        cancel: &CancellationToken,
        owner: &Bundle,
        token: &PageToken,
        mut cursor: RemoteCursor,
        walk: &mut Walk,
    ) -> Result<Step> {
        let Collaborators {
            index,
            packages,
            source,
            ..
        } = self.collaborators;

        while let Some(moniker) = token.monikers.get(cursor.moniker) {
            let Some(package_id) = moniker.package_information_id.as_deref() else {
                cursor = cursor.next_moniker();
                continue;
            };
            let package = index.package_information(cancel, owner.id, &token.path, package_id)?;
            let Some(package) = package else {
                tracing::trace!(
                    bundle = %owner.id,
                    identifier = %moniker.identifier,
                    "no package information for export moniker"
                );
                cursor = cursor.next_moniker();
                continue;
            };

            loop {
                let budget = self.remote_bundle_limit.saturating_sub(walk.peers_visited);
                if budget == 0 {
                    return Ok(Step::Paused(Phase::Remote(cursor)));
                }

                let peers = packages.package_references(
                    cancel,
                    &moniker.scheme,
                    &package,
                    cursor.bundle_offset,
                    budget,
                )?;
                if peers.items.is_empty() {
                    break;
                }

                // Every peer handed out counts against the budget, skipped or not.
                for peer in peers.items {
                    walk.peers_visited += 1;

                    if peer.id == owner.id
                        || !source.commit_exists(cancel, peer.repository_id, &peer.commit)?
                    {
                        tracing::trace!(peer = %peer.id, "skipping importing bundle");
                    } else {
                        let results = index.moniker_results(
                            cancel,
                            peer.id,
                            MonikerTable::References,
                            &moniker.scheme,
                            &moniker.identifier,
                            cursor.result_offset,
                            walk.remaining(),
                        )?;
                        cursor.result_offset += walk.take(&peer, results.items);

                        if walk.is_full() {
                            if cursor.result_offset >= results.total {
                                cursor = cursor.next_bundle();
                            }
                            return Ok(Step::Paused(Phase::Remote(cursor)));
                        }
                    }
                    cursor = cursor.next_bundle();

                    if walk.peers_visited >= self.remote_bundle_limit {
                        return Ok(Step::Paused(Phase::Remote(cursor)));
                    }
                }
            }

            cursor = cursor.next_moniker();
        }

        Ok(Step::Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::base::{Range, RepositoryId};
    use crate::model::PackageInformation;
    use crate::store::memory::{
        LineShiftAdjuster, MemoryBundleIndex, MemoryPackageIndex, MemorySourceControl, SymbolRange,
    };

    const OWNER: u32 = 1;

    fn location(line: u32) -> Location {
        Location::new("a.go", Range::from_coords(line, 0, line, 3))
    }

    fn lib() -> PackageInformation {
        PackageInformation::new("lib", "1.0.0")
    }

    /// Owner bundle with `local` references at (0, 0) and an export moniker
    /// imported by bundles `peers`, each holding `per_peer` references.
    fn fixture(
        local: u32,
        peers: &[u32],
        per_peer: u32,
        configure: impl FnOnce(&mut MemorySourceControl),
    ) -> (Collaborators, Bundle) {
        let owner = Bundle::new(OWNER, 1, "head");
        let mut index = MemoryBundleIndex::new();
        let mut symbol = SymbolRange::new(Range::from_coords(0, 0, 0, 10))
            .with_moniker(Moniker::new(MonikerKind::Export, "go", "lib.Func").with_package("p"));
        for line in 0..local {
            symbol = symbol.with_reference(location(100 + line));
        }
        index.add_range(owner.id, "a.go", symbol);
        index.add_package_information(owner.id, "p", lib());

        let mut packages = MemoryPackageIndex::new();
        for &peer in peers {
            let bundle = Bundle::new(peer, peer, format!("c{peer}"));
            index.add_moniker_results(
                bundle.id,
                MonikerTable::References,
                "go",
                "lib.Func",
                (0..per_peer).map(location).collect(),
            );
            packages.add_importer("go", &lib(), bundle);
        }

        let mut source = MemorySourceControl::new();
        configure(&mut source);

        let collaborators = Collaborators::new(
            Arc::new(LineShiftAdjuster::new("head")),
            Arc::new(index),
            Arc::new(packages),
            Arc::new(source),
        );
        (collaborators, owner)
    }

    fn fresh_token(collaborators: &Collaborators, owner: &Bundle) -> PageToken {
        let cancel = CancellationToken::new();
        PageToken::create(&cancel, collaborators, owner, "a.go", Position::new(0, 0)).unwrap()
    }

    fn walk_all(
        resolver: &ReferencePageResolver<'_>,
        collaborators: &Collaborators,
        owner: &Bundle,
    ) -> Vec<Vec<ResolvedLocation>> {
        let cancel = CancellationToken::new();
        let mut token = Some(fresh_token(collaborators, owner));
        let mut pages = Vec::new();
        while let Some(current) = token {
            let page = resolver.resolve_page(&cancel, owner, current).unwrap();
            token = page.next;
            pages.push(page.locations);
            assert!(pages.len() < 100, "paging did not terminate");
        }
        pages
    }

    #[test]
    fn test_local_references_paginate() {
        let (collaborators, owner) = fixture(5, &[], 0, |_| {});
        let resolver = ReferencePageResolver::new(&collaborators, 20, 2);

        let pages = walk_all(&resolver, &collaborators, &owner);
        let sizes: Vec<usize> = pages.iter().map(Vec::len).collect();

        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_remote_results_follow_local_results() {
        let (collaborators, owner) = fixture(2, &[10, 11], 2, |_| {});
        let resolver = ReferencePageResolver::new(&collaborators, 20, 10);

        let pages = walk_all(&resolver, &collaborators, &owner);
        assert_eq!(pages.len(), 1);
        let bundles: Vec<u32> = pages[0].iter().map(|l| l.bundle.id.index()).collect();

        assert_eq!(bundles, vec![OWNER, OWNER, 10, 10, 11, 11]);
    }

    #[test]
    fn test_remote_budget_limits_peers_per_page() {
        let peers: Vec<u32> = (10..15).collect();
        let (collaborators, owner) = fixture(0, &peers, 1, |_| {});
        let resolver = ReferencePageResolver::new(&collaborators, 2, 100);

        let pages = walk_all(&resolver, &collaborators, &owner);
        let sizes: Vec<usize> = pages.iter().map(Vec::len).collect();

        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_owner_is_never_its_own_peer() {
        let (collaborators, owner) = fixture(1, &[OWNER, 10], 1, |_| {});
        let resolver = ReferencePageResolver::new(&collaborators, 1, 100);

        let pages = walk_all(&resolver, &collaborators, &owner);
        let all: Vec<(u32, u32)> = pages
            .iter()
            .flatten()
            .map(|l| (l.bundle.id.index(), l.range.start.line))
            .collect();

        assert_eq!(all, vec![(OWNER, 100), (10, 0)]);
    }

    #[test]
    fn test_peers_with_missing_commits_are_skipped() {
        let (collaborators, owner) = fixture(0, &[10, 11, 12], 1, |source| {
            source.remove_commit(RepositoryId::new(11), "c11");
        });
        let resolver = ReferencePageResolver::new(&collaborators, 20, 100);

        let pages = walk_all(&resolver, &collaborators, &owner);
        let bundles: Vec<u32> = pages.iter().flatten().map(|l| l.bundle.id.index()).collect();

        assert_eq!(bundles, vec![10, 12]);
    }

    #[test]
    fn test_skipped_peers_use_up_the_remote_budget() {
        let (collaborators, owner) = fixture(0, &[10, 11, 12, 13], 1, |source| {
            for peer in 10..13 {
                source.remove_commit(RepositoryId::new(peer), format!("c{peer}"));
            }
        });
        let resolver = ReferencePageResolver::new(&collaborators, 2, 100);

        let pages = walk_all(&resolver, &collaborators, &owner);
        let bundles: Vec<Vec<u32>> = pages
            .iter()
            .map(|page| page.iter().map(|l| l.bundle.id.index()).collect())
            .collect();

        assert_eq!(bundles, vec![vec![], vec![13], vec![]]);
    }

    #[test]
    fn test_page_resumes_inside_a_peer() {
        let (collaborators, owner) = fixture(1, &[10], 5, |_| {});
        let resolver = ReferencePageResolver::new(&collaborators, 20, 3);

        let pages = walk_all(&resolver, &collaborators, &owner);
        let lines: Vec<(u32, u32)> = pages
            .iter()
            .flatten()
            .map(|l| (l.bundle.id.index(), l.range.start.line))
            .collect();

        assert_eq!(
            lines,
            vec![(OWNER, 100), (10, 0), (10, 1), (10, 2), (10, 3), (10, 4)]
        );
        // The peer is only known to be exhausted once the next page finds no
        // further importers.
        assert_eq!(pages.len(), 3);
        assert!(pages[2].is_empty());
    }

    #[test]
    fn test_token_round_trip_and_bundle_check() {
        let (collaborators, owner) = fixture(1, &[10], 1, |_| {});
        let token = fresh_token(&collaborators, &owner);
        let raw = token.encode().unwrap();

        assert_eq!(PageToken::decode_for(&raw, owner.id).unwrap(), token);
        assert!(matches!(
            PageToken::decode_for(&raw, BundleId::new(99)),
            Err(Error::MalformedCursor { .. })
        ));
    }
}
