//! Request metadata and bearer token extraction.

use std::collections::HashMap;

use crate::AuthError;

/// Metadata key carrying the caller's token.
pub const AUTHORIZATION: &str = "authorization";

/// Out-of-band request metadata.
///
/// Keys are case-insensitive and may hold several values, matching the
/// semantics of gRPC metadata and HTTP headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: HashMap<String, Vec<String>>,
}

impl Metadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under `key`.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .entry(key.as_ref().to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// Builder-style [`Metadata::insert`].
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// First value under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(|s| s.as_str())
    }

    /// All values under `key`, in insertion order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Whether no keys are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Metadata
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Metadata::new();
        for (key, value) in iter {
            metadata.insert(key, value);
        }
        metadata
    }
}

/// Extract the raw token from request metadata.
///
/// No metadata at all is `MissingCredentialsSource`. Metadata without an
/// `authorization` entry, or with an empty one, is `NoTokenSupplied`; an
/// absent token never means anonymous access. The value is returned as is,
/// any `Bearer ` prefix included.
pub fn extract_token(metadata: Option<&Metadata>) -> Result<&str, AuthError> {
    let metadata = metadata.ok_or(AuthError::MissingCredentialsSource)?;

    match metadata.get(AUTHORIZATION) {
        Some(token) if !token.trim().is_empty() => Ok(token),
        _ => Err(AuthError::NoTokenSupplied),
    }
}

/// Strip an optional `Bearer ` scheme from an authorization value.
///
/// This belongs to the transport boundary: transports that receive
/// `Bearer <token>` call it before building request metadata for the core.
/// The scheme match is case-insensitive; values without it pass through.
pub fn strip_bearer(value: &str) -> &str {
    let value = value.trim();
    match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim_start(),
        _ => value,
    }
}
