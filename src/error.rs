//! Crate-level error types for query resolution.

use std::fmt;

/// Boxed error raised by a collaborator implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The external services a query resolver depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collaborator {
    PositionAdjuster,
    BundleIndex,
    PackageIndex,
    SourceControl,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collaborator::PositionAdjuster => "position adjuster",
            Collaborator::BundleIndex => "bundle index",
            Collaborator::PackageIndex => "package index",
            Collaborator::SourceControl => "source control",
        };
        f.write_str(name)
    }
}

/// Every way a query can fail.
///
/// A position that has no counterpart on another commit is not an error:
/// adjusters report it as `None` and the bundle is skipped.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A page of references was requested with a non-positive size.
    #[error("limit must be positive, got {limit}")]
    InvalidLimit {
        /// The rejected page size.
        limit: i64,
    },

    /// A pagination cursor or per-bundle token could not be decoded.
    #[error("malformed cursor: {reason}")]
    MalformedCursor {
        /// Description of what failed to decode.
        reason: String,
    },

    /// A collaborator call failed. The source error is carried verbatim.
    #[error("{collaborator} failed: {source}")]
    Collaborator {
        /// Which collaborator failed.
        collaborator: Collaborator,
        /// The collaborator's own error.
        #[source]
        source: BoxError,
    },

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// Resolver configuration was rejected.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// Why the configuration is unusable.
        reason: String,
    },

    /// Cursor state could not be serialized.
    #[error("serialize: {0}")]
    Serialization(
        /// The wrapped serialization error.
        #[from]
        serde_json::Error,
    ),
}

impl Error {
    /// Wrap a collaborator's own error.
    pub fn collaborator(collaborator: Collaborator, source: impl Into<BoxError>) -> Self {
        Self::Collaborator {
            collaborator,
            source: source.into(),
        }
    }

    /// Build a malformed-cursor error.
    pub fn malformed_cursor(reason: impl fmt::Display) -> Self {
        Self::MalformedCursor {
            reason: reason.to_string(),
        }
    }

    /// Whether this error stems from cancellation rather than a backend fault.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_error_message() {
        let err = Error::collaborator(Collaborator::BundleIndex, "connection reset");
        assert_eq!(err.to_string(), "bundle index failed: connection reset");
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_collaborator_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::other("disk gone");
        let err = Error::collaborator(Collaborator::PackageIndex, io);
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("disk gone"));
    }

    #[test]
    fn test_cancelled_is_distinct() {
        assert!(Error::Cancelled.is_cancelled());
        assert_eq!(
            Error::InvalidLimit { limit: 0 }.to_string(),
            "limit must be positive, got 0"
        );
    }
}
