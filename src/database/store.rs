use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::models::conversation::{Conversation, ConversationWithMessages, NewConversation};
use crate::models::feedback::{Feedback, FeedbackReport};
use crate::models::job::{Job, NewJob};
use crate::models::message::{Message, NewMessage};
use crate::models::user::{NewUser, User};

pub const DEFAULT_LIMIT: i64 = 100;

/// Offset pagination as accepted by the list endpoints. An explicit limit is
/// honored as given; zero or negative yields an empty page.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip: Some(skip),
            limit: Some(limit),
        }
    }

    pub fn offset(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).max(0)
    }
}

/// Durable records for users, conversations, messages, feedback and jobs.
///
/// Every call commits on its own. `complete_conversation` is the only
/// multi-row write and must be atomic: either the feedback row exists and the
/// conversation is completed, or neither change is visible.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn get_user(&self, id: i64) -> Result<Option<User>>;

    async fn create_conversation(&self, conversation: NewConversation) -> Result<Conversation>;

    async fn list_conversations(&self, page: Pagination) -> Result<Vec<Conversation>>;

    async fn get_conversation(&self, id: i64) -> Result<Option<Conversation>>;

    async fn get_conversation_with_messages(
        &self,
        id: i64,
    ) -> Result<Option<ConversationWithMessages>>;

    /// Returns `false` when nothing was deleted. Messages and feedback go with it.
    async fn delete_conversation(&self, id: i64) -> Result<bool>;

    async fn create_message(&self, message: NewMessage) -> Result<Message>;

    /// Messages ordered by `created_at`, ties broken by insertion order.
    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<Message>>;

    /// Stores the feedback and moves the conversation to `completed`.
    /// Fails with `Conflict` if the conversation is not `in_progress` and with
    /// `NotFound` if it does not exist.
    async fn complete_conversation(
        &self,
        conversation_id: i64,
        report: &FeedbackReport,
    ) -> Result<Feedback>;

    async fn get_feedback(&self, conversation_id: i64) -> Result<Option<Feedback>>;

    async fn create_jobs(&self, jobs: Vec<NewJob>) -> Result<Vec<Job>>;

    async fn list_jobs(&self, page: Pagination) -> Result<Vec<Job>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_honors_limit() {
        let page = Pagination::default();
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 100);

        let page = Pagination::new(-5, 1000);
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 1000);

        let page = Pagination::new(10, 0);
        assert_eq!(page.offset(), 10);
        assert_eq!(page.limit(), 0);

        assert_eq!(Pagination::new(0, -3).limit(), 0);
    }
}
