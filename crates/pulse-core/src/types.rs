//! Custom types for common data structures

use chrono::{DateTime as ChronoDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard UTC DateTime type used across all Pulse crates
///
/// Serializes as ISO 8601 with 'Z' suffix: `2025-10-12T12:15:47.609192Z`
pub type UtcDateTime = ChronoDateTime<Utc>;

/// Identifier of a project on the reporting API
///
/// Serializes as a bare string so it can be embedded in stored records and
/// query strings unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectKey(String);

impl ProjectKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Builds a key from user input, returning `None` when it is blank
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProjectKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ProjectKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Free-form date range forwarded to the reporting API as-is
///
/// An empty bound means "unbounded". No format validation happens here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

impl DateRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Lower bound as a query parameter, `None` when unbounded
    pub fn from_param(&self) -> Option<&str> {
        bound(&self.from)
    }

    /// Upper bound as a query parameter, `None` when unbounded
    pub fn to_param(&self) -> Option<&str> {
        bound(&self.to)
    }
}

/// Only the empty string is unbounded; anything else is sent verbatim
fn bound(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}
