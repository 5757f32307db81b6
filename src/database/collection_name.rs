//! Derivation and validation of tenant collection identifiers.
//!
//! A collection identifier is `org_` followed by the organization name
//! lowercased, with every whitespace run turned into `_` and anything outside
//! `[a-z0-9_]` removed. The result doubles as a Postgres table name, so it is
//! also bounded by the 63-byte identifier limit.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionNameError {
    #[error("organization name '{0}' contains no letters, digits or underscores")]
    EmptySuffix(String),

    #[error("collection name '{name}' is longer than {max} bytes")]
    TooLong { name: String, max: usize },

    #[error("'{0}' is not a valid collection name")]
    Malformed(String),
}

/// Validated tenant collection identifier, always of the form `org_[a-z0-9_]+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionName(String);

impl CollectionName {
    pub const PREFIX: &'static str = "org_";
    pub const MAX_LEN: usize = 63;

    /// Pure sanitization rule, with no validity checks on the outcome.
    pub fn sanitize(org_name: &str) -> String {
        let lowered = org_name.to_lowercase();
        let mut out = String::with_capacity(Self::PREFIX.len() + lowered.len());
        out.push_str(Self::PREFIX);

        let mut in_whitespace = false;
        for c in lowered.chars() {
            if c.is_whitespace() {
                if !in_whitespace {
                    out.push('_');
                }
                in_whitespace = true;
                continue;
            }
            in_whitespace = false;
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                out.push(c);
            }
        }
        out
    }

    /// Derive the identifier for an organization name.
    ///
    /// Names that sanitize to a bare `org_` are rejected rather than given a
    /// fallback suffix, since every such name would share one collection.
    pub fn from_org_name(org_name: &str) -> Result<Self, CollectionNameError> {
        let sanitized = Self::sanitize(org_name);
        if sanitized.len() == Self::PREFIX.len() {
            return Err(CollectionNameError::EmptySuffix(org_name.to_string()));
        }
        Self::parse(sanitized)
    }

    /// Accept an identifier read back from storage.
    pub fn parse(raw: impl Into<String>) -> Result<Self, CollectionNameError> {
        let raw = raw.into();
        if raw.len() > Self::MAX_LEN {
            return Err(CollectionNameError::TooLong { name: raw, max: Self::MAX_LEN });
        }
        let valid = raw
            .strip_prefix(Self::PREFIX)
            .map(|suffix| {
                !suffix.is_empty()
                    && suffix
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            })
            .unwrap_or(false);
        if !valid {
            return Err(CollectionNameError::Malformed(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted form for interpolation into SQL.
    pub fn quoted(&self) -> String {
        // The character set excludes quotes, so no escaping is needed.
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CollectionName {
    type Error = CollectionNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<CollectionName> for String {
    fn from(value: CollectionName) -> Self {
        value.0
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
