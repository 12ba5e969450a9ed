//! Diagnostics: errors and warnings recorded by the indexer.
//!
//! Diagnostics are read from bundles as-is; this crate never computes them.

use std::sync::Arc;

use super::Bundle;
use crate::base::{BundleId, Range};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

impl Severity {
    /// Convert to LSP severity number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Information => 3,
            Severity::Hint => 4,
        }
    }

    /// Convert from LSP severity number.
    pub fn from_lsp(value: u32) -> Option<Self> {
        match value {
            1 => Some(Severity::Error),
            2 => Some(Severity::Warning),
            3 => Some(Severity::Information),
            4 => Some(Severity::Hint),
            _ => None,
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// The bundle this diagnostic was read from.
    pub bundle_id: BundleId,
    /// Document path. Bundle-relative when read, repository-relative once resolved.
    pub path: String,
    /// Severity level.
    pub severity: Severity,
    /// Error/warning code reported by the tool.
    pub code: Option<Arc<str>>,
    /// The diagnostic message.
    pub message: Arc<str>,
    /// Tool that reported the diagnostic (e.g., "tsc").
    pub source: Option<Arc<str>>,
    pub range: Range,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(
        bundle_id: BundleId,
        path: impl Into<String>,
        range: Range,
        message: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            bundle_id,
            path: path.into(),
            severity: Severity::Error,
            code: None,
            message: message.into(),
            source: None,
            range,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(
        bundle_id: BundleId,
        path: impl Into<String>,
        range: Range,
        message: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(bundle_id, path, range, message)
        }
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the reporting tool.
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Rewrite the path from bundle-relative to repository-relative.
    pub fn resolve(mut self, bundle: &Bundle) -> Self {
        self.path = bundle.qualify(&self.path);
        self
    }
}

/// A diagnostic with its range translated to the requested commit where possible.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdjustedDiagnostic {
    /// The diagnostic with a repository-relative path.
    pub diagnostic: Diagnostic,
    /// Provenance: the bundle the diagnostic was read from.
    pub bundle: Bundle,
    pub adjusted_commit: Arc<str>,
    pub adjusted_range: Range,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_lsp_roundtrip() {
        for severity in [
            Severity::Error,
            Severity::Warning,
            Severity::Information,
            Severity::Hint,
        ] {
            assert_eq!(Severity::from_lsp(severity.to_lsp()), Some(severity));
        }
        assert_eq!(Severity::from_lsp(0), None);
    }

    #[test]
    fn test_diagnostic_builder() {
        let diag = Diagnostic::warning(BundleId::new(1), "a.ts", Range::default(), "unused import")
            .with_code("6133")
            .with_source("tsc");

        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.code.as_deref(), Some("6133"));
        assert_eq!(diag.source.as_deref(), Some("tsc"));
    }

    #[test]
    fn test_diagnostic_resolve_prefixes_root() {
        let bundle = Bundle::new(1, 1, "abc").with_root("pkg/");
        let diag = Diagnostic::error(bundle.id, "main.go", Range::default(), "undefined: x")
            .resolve(&bundle);

        assert_eq!(diag.path, "pkg/main.go");
    }
}
