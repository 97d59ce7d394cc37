//! Quiz identifier used as a subscription topic.
//!
//! The server keys quiz topics by the id the client sends, and echoes it back
//! either as a string or as a bare number depending on where the event came
//! from. Both forms deserialize into the same [`QuizId`].

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a quiz topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct QuizId(String);

impl QuizId {
    /// Create a quiz id from anything string-like.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read a quiz id out of an arbitrary JSON value.
    ///
    /// Accepts strings and integers; anything else yields `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            serde_json::Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuizId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for QuizId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for QuizId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for QuizId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Ok(Self(s)),
            Raw::Number(n) => Ok(Self(n.to_string())),
        }
    }
}
