//! Shared fixtures for resolver integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use codenav::model::{Bundle, Location};
use codenav::store::Collaborators;
use codenav::store::memory::{
    LineShiftAdjuster, MemoryBundleIndex, MemoryPackageIndex, MemorySourceControl,
};
use codenav::{QueryResolver, QueryTarget, Range, ResolverConfig};

pub const REPOSITORY: u32 = 1;
pub const REQUESTED_COMMIT: &str = "head";
pub const PATH: &str = "src/main.go";

/// Collaborators and bundles, mutable until [`Fixture::build`].
pub struct Fixture {
    pub adjuster: LineShiftAdjuster,
    pub index: MemoryBundleIndex,
    pub packages: MemoryPackageIndex,
    pub source: MemorySourceControl,
    pub bundles: Vec<Bundle>,
    pub config: ResolverConfig,
}

/// A resolver plus shared handles to its in-memory collaborators.
pub struct Built {
    pub resolver: QueryResolver,
    pub adjuster: Arc<LineShiftAdjuster>,
    pub index: Arc<MemoryBundleIndex>,
    pub packages: Arc<MemoryPackageIndex>,
    pub source: Arc<MemorySourceControl>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            adjuster: LineShiftAdjuster::new(REQUESTED_COMMIT),
            index: MemoryBundleIndex::new(),
            packages: MemoryPackageIndex::new(),
            source: MemorySourceControl::new(),
            bundles: Vec::new(),
            config: ResolverConfig::default(),
        }
    }

    /// Add a bundle of the requested repository.
    pub fn bundle(&mut self, id: u32, commit: &str) -> Bundle {
        let bundle = Bundle::new(id, REPOSITORY, commit);
        self.bundles.push(bundle.clone());
        bundle
    }

    pub fn build(self) -> Built {
        let adjuster = Arc::new(self.adjuster);
        let index = Arc::new(self.index);
        let packages = Arc::new(self.packages);
        let source = Arc::new(self.source);
        let collaborators = Collaborators::new(
            adjuster.clone(),
            index.clone(),
            packages.clone(),
            source.clone(),
        );
        let resolver = QueryResolver::new(
            collaborators,
            QueryTarget::new(REPOSITORY, REQUESTED_COMMIT, PATH),
            self.bundles.into_iter().collect(),
            self.config,
        );
        Built {
            resolver,
            adjuster,
            index,
            packages,
            source,
        }
    }
}

/// A single-line location `path:line`.
pub fn location(path: &str, line: u32) -> Location {
    Location::new(path, line_range(line))
}

pub fn line_range(line: u32) -> Range {
    Range::from_coords(line, 0, line, 8)
}
