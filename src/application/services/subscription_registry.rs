//! Subscription Registry
//!
//! Bookkeeping of the quiz topics this client has asked the server to push.
//! Pure state: adding or removing an id never sends anything.

use std::collections::BTreeSet;

use crate::domain::QuizId;

/// Set of subscribed quiz ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionRegistry {
    quizzes: BTreeSet<QuizId>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a subscription. Returns `true` if the id was not already present.
    pub fn add(&mut self, quiz_id: QuizId) -> bool {
        self.quizzes.insert(quiz_id)
    }

    /// Forget a subscription. Returns `true` if the id was present.
    pub fn remove(&mut self, quiz_id: &QuizId) -> bool {
        self.quizzes.remove(quiz_id)
    }

    pub fn contains(&self, quiz_id: &QuizId) -> bool {
        self.quizzes.contains(quiz_id)
    }

    pub fn len(&self) -> usize {
        self.quizzes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quizzes.is_empty()
    }

    /// Subscribed ids in ascending order.
    pub fn quiz_ids(&self) -> Vec<QuizId> {
        self.quizzes.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.quizzes.clear();
    }
}
