//! Query layer: the navigation operations a code-intelligence API serves.
//!
//! [`QueryResolver`] answers every request for one repository, commit and
//! path from a fixed set of bundles. Each operation is a method on the
//! resolver and corresponds to one API request.
//!
//! ## Pipeline
//!
//! Every operation runs the same per-bundle stages, preserving bundle order:
//!
//! 1. **Adjust in**: translate the requested path/position onto the bundle's
//!    indexed commit, skipping the bundle when that is impossible
//! 2. **Query**: ask the bundle index, using bundle-relative paths
//! 3. **Adjust out**: prefix the bundle root and translate ranges back onto
//!    the requested commit
//!
//! ## Usage
//!
//! ```ignore
//! use codenav::ide::{QueryResolver, QueryTarget};
//!
//! let target = QueryTarget::new(1, "abc123", "src/main.go");
//! let resolver = QueryResolver::new(collaborators, target, bundles, config);
//! let cancel = CancellationToken::new();
//!
//! let definitions = resolver.definitions(&cancel, 10, 4)?;
//! let first = resolver.references(&cancel, 10, 4, 50, "")?;
//! let second = resolver.references(&cancel, 10, 4, 50, &first.end_cursor)?;
//! ```

mod cursor;
mod diagnostics;
mod goto;
mod hover;
mod pager;
mod ranges;
mod references;
mod resolver;

pub use cursor::ReferenceCursor;
pub use diagnostics::DiagnosticsResult;
pub use hover::HoverResult;
pub use pager::{PageToken, Phase, ReferencePage, ReferencePageResolver, RemoteCursor};
pub use references::ReferencesPage;
pub use resolver::{QueryResolver, QueryTarget};
