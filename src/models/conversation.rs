use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    InProgress,
    Completed,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::InProgress => "in_progress",
            ConversationStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown conversation status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ConversationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(ConversationStatus::InProgress),
            "completed" => Ok(ConversationStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: i64,
    pub user_id: Option<i64>,
    pub title: String,
    #[serde(rename = "type")]
    pub interview_type: Option<String>,
    pub candidate_name: Option<String>,
    pub status: ConversationStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn is_completed(&self) -> bool {
        self.status == ConversationStatus::Completed
    }
}

#[derive(Debug, Clone)]
pub struct NewConversation {
    pub user_id: Option<i64>,
    pub title: String,
    pub interview_type: String,
    pub candidate_name: String,
}

impl NewConversation {
    pub fn for_interview(interview_type: &str, candidate_name: &str, user_id: Option<i64>) -> Self {
        Self {
            user_id,
            title: interview_title(interview_type, candidate_name),
            interview_type: interview_type.to_string(),
            candidate_name: candidate_name.to_string(),
        }
    }
}

pub fn interview_title(interview_type: &str, candidate_name: &str) -> String {
    format!("{} Interview - {}", interview_type, candidate_name)
}

/// A conversation together with its messages in transcript order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationWithMessages {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}
