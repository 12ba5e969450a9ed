//! Opaque continuation cursors for reference paging.
//!
//! A cursor maps each bundle that still has results to that bundle's own
//! resumption token. On the wire the map is JSON, base64-encoded with the
//! URL-safe alphabet and no padding. The empty map encodes to the empty
//! string, which means "no further pages" on output and "start from the
//! beginning" on input.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::base::BundleId;
use crate::error::{Error, Result};

/// Serialize `value` as JSON and wrap it in URL-safe base64.
pub(crate) fn encode_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Inverse of [`encode_json`]. Any decoding failure is a malformed cursor.
pub(crate) fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(raw.as_bytes())
        .map_err(Error::malformed_cursor)?;
    serde_json::from_slice(&bytes).map_err(Error::malformed_cursor)
}

/// Per-bundle resumption tokens, keyed and ordered by bundle ID.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ReferenceCursor {
    tokens: BTreeMap<BundleId, String>,
}

impl ReferenceCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bundle: BundleId, token: String) {
        self.tokens.insert(bundle, token);
    }

    pub fn get(&self, bundle: BundleId) -> Option<&str> {
        self.tokens.get(&bundle).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BundleId, &str)> + '_ {
        self.tokens.iter().map(|(id, token)| (*id, token.as_str()))
    }

    /// Encode the cursor. The empty cursor encodes to `""`.
    pub fn encode(&self) -> Result<String> {
        if self.tokens.is_empty() {
            return Ok(String::new());
        }
        encode_json(self)
    }

    /// Decode a cursor previously produced by [`ReferenceCursor::encode`].
    pub fn decode(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Ok(Self::default());
        }
        decode_json(raw)
    }
}

impl FromIterator<(BundleId, String)> for ReferenceCursor {
    fn from_iter<I: IntoIterator<Item = (BundleId, String)>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}
