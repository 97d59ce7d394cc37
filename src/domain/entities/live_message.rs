//! Live feed wire messages.
//!
//! Inbound frames are JSON objects tagged by a string `type`. The set of
//! types is open: unknown types are kept verbatim so observers still see
//! them as the latest message.

use serde::{Deserialize, Serialize};

use super::notification::Severity;
use crate::domain::QuizId;

/// Known inbound message types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    QuizSessionUploaded,
    LeaderboardUpdated,
    QuizLeaderboardUpdated,
    SubscriptionConfirmed,
    UnsubscriptionConfirmed,
    Error,
    Other(String),
}

impl MessageKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "quiz_session_uploaded" => Self::QuizSessionUploaded,
            "leaderboard_updated" => Self::LeaderboardUpdated,
            "quiz_leaderboard_updated" => Self::QuizLeaderboardUpdated,
            "subscription_confirmed" => Self::SubscriptionConfirmed,
            "unsubscription_confirmed" => Self::UnsubscriptionConfirmed,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::QuizSessionUploaded => "quiz_session_uploaded",
            Self::LeaderboardUpdated => "leaderboard_updated",
            Self::QuizLeaderboardUpdated => "quiz_leaderboard_updated",
            Self::SubscriptionConfirmed => "subscription_confirmed",
            Self::UnsubscriptionConfirmed => "unsubscription_confirmed",
            Self::Error => "error",
            Self::Other(raw) => raw,
        }
    }

    /// Whether leaderboard data shown to the user may now be out of date.
    pub fn invalidates_leaderboard(&self) -> bool {
        matches!(
            self,
            Self::QuizSessionUploaded | Self::LeaderboardUpdated | Self::QuizLeaderboardUpdated
        )
    }
}

/// A frame pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub message_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<QuizId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl InboundMessage {
    /// Decode a raw text frame.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn kind(&self) -> MessageKind {
        MessageKind::parse(&self.message_type)
    }

    /// The quiz this message concerns, from `data.quiz_id` or the top-level `quiz_id`.
    pub fn related_quiz(&self) -> Option<QuizId> {
        self.data
            .as_ref()
            .and_then(|d| d.get("quiz_id"))
            .and_then(QuizId::from_json)
            .or_else(|| self.quiz_id.clone())
    }

    /// Text and severity of the notification this message should raise, if any.
    pub fn notification(&self) -> Option<(String, Severity)> {
        let server_text = |fallback: &str| {
            self.message
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };

        match self.kind() {
            MessageKind::QuizSessionUploaded => Some((
                "New quiz session uploaded! Leaderboard updated.".to_string(),
                Severity::Success,
            )),
            MessageKind::LeaderboardUpdated => {
                Some(("Leaderboard has been updated!".to_string(), Severity::Info))
            }
            MessageKind::QuizLeaderboardUpdated => {
                let quiz = self
                    .data
                    .as_ref()
                    .and_then(|d| d.get("quiz_id"))
                    .and_then(QuizId::from_json)
                    .map(|id| id.to_string())
                    .unwrap_or_default();
                Some((
                    format!("Quiz leaderboard updated for quiz {}!", quiz),
                    Severity::Info,
                ))
            }
            MessageKind::SubscriptionConfirmed => {
                Some((server_text("Subscribed to quiz updates"), Severity::Success))
            }
            MessageKind::UnsubscriptionConfirmed => {
                Some((server_text("Unsubscribed from quiz updates"), Severity::Info))
            }
            MessageKind::Error => Some((server_text("An error occurred"), Severity::Error)),
            MessageKind::Other(_) => None,
        }
    }
}

/// Sees every parsed inbound message, one at a time in arrival order.
///
/// Called on the transport's task; implementations must not block.
pub trait MessageObserver: Send + Sync {
    fn on_message(&self, message: &InboundMessage);
}

/// A request frame sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundRequest {
    SubscribeQuiz { quiz_id: QuizId },
    UnsubscribeQuiz { quiz_id: QuizId },
}

impl OutboundRequest {
    pub fn request_type(&self) -> &'static str {
        match self {
            Self::SubscribeQuiz { .. } => "subscribe_quiz",
            Self::UnsubscribeQuiz { .. } => "unsubscribe_quiz",
        }
    }

    pub fn quiz_id(&self) -> &QuizId {
        match self {
            Self::SubscribeQuiz { quiz_id } | Self::UnsubscribeQuiz { quiz_id } => quiz_id,
        }
    }

    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
