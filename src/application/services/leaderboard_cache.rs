//! Leaderboard Cache Invalidation
//!
//! Views register the leaderboards they display; live messages that change
//! rankings mark those views stale so they know to re-fetch.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::domain::{InboundMessage, MessageObserver, QuizId};

/// A leaderboard a view may display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LeaderboardKey {
    /// Overall ranking across every quiz
    Global,
    /// Aggregate leaderboard for one subject
    Subject(String),
    /// Leaderboard of a single quiz
    Quiz(QuizId),
}

impl fmt::Display for LeaderboardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "leaderboard:global"),
            Self::Subject(subject) => write!(f, "leaderboard:subject:{}", subject),
            Self::Quiz(quiz_id) => write!(f, "leaderboard:quiz:{}", quiz_id),
        }
    }
}

#[derive(Default)]
struct CacheState {
    tracked: BTreeMap<LeaderboardKey, bool>,
    last_update: Option<DateTime<Utc>>,
}

/// Tracks which displayed leaderboards are out of date.
#[derive(Default)]
pub struct LeaderboardCache {
    state: Mutex<CacheState>,
}

impl LeaderboardCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a leaderboard. Newly tracked keys start fresh.
    pub fn track(&self, key: LeaderboardKey) {
        self.state.lock().tracked.entry(key).or_insert(false);
    }

    /// Apply a live message. Returns the keys it marked stale.
    pub fn apply(&self, message: &InboundMessage) -> Vec<LeaderboardKey> {
        if !message.kind().invalidates_leaderboard() {
            return Vec::new();
        }

        let named_quiz = message.related_quiz().or_else(|| {
            message
                .data
                .as_ref()
                .and_then(|d| d.get("affected_quiz_id"))
                .and_then(QuizId::from_json)
        });

        let mut state = self.state.lock();
        state.last_update = Some(Utc::now());

        let mut marked = Vec::new();
        for (key, stale) in state.tracked.iter_mut() {
            let affected = match key {
                LeaderboardKey::Global | LeaderboardKey::Subject(_) => true,
                LeaderboardKey::Quiz(id) => named_quiz.as_ref().map_or(true, |q| q == id),
            };
            if affected {
                *stale = true;
                marked.push(key.clone());
            }
        }

        tracing::debug!(
            message_type = %message.message_type,
            marked = marked.len(),
            "Leaderboard views invalidated"
        );
        marked
    }

    /// Keys that need a re-fetch; their stale flags are reset.
    pub fn take_stale(&self) -> Vec<LeaderboardKey> {
        let mut state = self.state.lock();
        state
            .tracked
            .iter_mut()
            .filter(|(_, stale)| **stale)
            .map(|(key, stale)| {
                *stale = false;
                key.clone()
            })
            .collect()
    }

    pub fn is_stale(&self, key: &LeaderboardKey) -> bool {
        self.state.lock().tracked.get(key).copied().unwrap_or(false)
    }

    /// When the last invalidating message arrived.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.state.lock().last_update
    }
}

impl MessageObserver for LeaderboardCache {
    fn on_message(&self, message: &InboundMessage) {
        self.apply(message);
    }
}
