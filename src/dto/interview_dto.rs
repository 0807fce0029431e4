use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::conversation::Conversation;
use crate::models::feedback::{Feedback, FeedbackReport};
use crate::models::message::Message;
use crate::services::interview_service::InterviewDetail;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartInterviewPayload {
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub interview_type: String,
    #[serde(alias = "candidateName")]
    #[validate(length(min = 1))]
    pub candidate_name: String,
    #[serde(default, alias = "userId")]
    pub user_id: Option<i64>,
}

fn default_role() -> String {
    "user".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppendMessagePayload {
    #[serde(default = "default_role")]
    #[validate(length(min = 1))]
    pub role: String,
    #[validate(length(min = 1))]
    pub content: String,
}

/// Full interview view: the conversation fields at top level, messages in
/// transcript order, and the feedback report once the interview has ended.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewResponse {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<Message>,
    pub feedback: Option<FeedbackReport>,
}

impl From<InterviewDetail> for InterviewResponse {
    fn from(detail: InterviewDetail) -> Self {
        Self {
            conversation: detail.interview.conversation,
            messages: detail.interview.messages,
            feedback: detail.feedback.map(FeedbackReport::from),
        }
    }
}

/// Feedback as returned by `end` and the feedback endpoint, in the same
/// camelCase shape the completion provider produced it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub id: i64,
    pub conversation_id: i64,
    #[serde(flatten)]
    pub report: FeedbackReport,
    pub created_at: DateTime<Utc>,
}

impl From<Feedback> for FeedbackResponse {
    fn from(feedback: Feedback) -> Self {
        Self {
            id: feedback.id,
            conversation_id: feedback.conversation_id,
            created_at: feedback.created_at,
            report: FeedbackReport::from(feedback),
        }
    }
}
