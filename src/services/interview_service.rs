use std::sync::Arc;

use crate::database::{EntityStore, Pagination};
use crate::error::{Error, Result};
use crate::models::conversation::{Conversation, ConversationWithMessages, NewConversation};
use crate::models::feedback::Feedback;
use crate::models::message::{Message, NewMessage};
use crate::services::ai_service::AIService;
use crate::utils::transcript;

/// Conversation plus everything attached to it.
#[derive(Debug, Clone)]
pub struct InterviewDetail {
    pub interview: ConversationWithMessages,
    pub feedback: Option<Feedback>,
}

/// Owns the `in_progress -> completed` transition of a conversation and the
/// feedback it produces.
#[derive(Clone)]
pub struct InterviewService {
    store: Arc<dyn EntityStore>,
    ai: AIService,
}

impl InterviewService {
    pub fn new(store: Arc<dyn EntityStore>, ai: AIService) -> Self {
        Self { store, ai }
    }

    pub async fn start(
        &self,
        interview_type: &str,
        candidate_name: &str,
        user_id: Option<i64>,
    ) -> Result<Conversation> {
        if let Some(user_id) = user_id {
            if self.store.get_user(user_id).await?.is_none() {
                return Err(Error::NotFound(format!("User {} not found", user_id)));
            }
        }

        let conversation = self
            .store
            .create_conversation(NewConversation::for_interview(
                interview_type,
                candidate_name,
                user_id,
            ))
            .await?;

        tracing::info!(
            conversation_id = conversation.id,
            interview_type,
            "interview started"
        );
        Ok(conversation)
    }

    pub async fn list(&self, page: Pagination) -> Result<Vec<Conversation>> {
        self.store.list_conversations(page).await
    }

    pub async fn get(&self, id: i64) -> Result<InterviewDetail> {
        let interview = self
            .store
            .get_conversation_with_messages(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        let feedback = self.store.get_feedback(id).await?;

        Ok(InterviewDetail {
            interview,
            feedback,
        })
    }

    /// Appends regardless of status; completed conversations still accept
    /// messages, they just no longer affect the stored feedback.
    pub async fn append_message(&self, id: i64, role: &str, content: &str) -> Result<Message> {
        if role.trim().is_empty() {
            return Err(Error::BadRequest("Message role is required".to_string()));
        }
        if content.trim().is_empty() {
            return Err(Error::BadRequest("Message content is required".to_string()));
        }
        if self.store.get_conversation(id).await?.is_none() {
            return Err(not_found(id));
        }

        let message = self
            .store
            .create_message(NewMessage {
                conversation_id: id,
                role: role.to_string(),
                content: content.to_string(),
            })
            .await?;

        tracing::debug!(conversation_id = id, message_id = message.id, role, "message appended");
        Ok(message)
    }

    /// Scores the transcript and completes the conversation.
    ///
    /// Nothing is written unless the provider returns usable feedback, and the
    /// feedback row and status change are committed together. A second call
    /// on a completed conversation fails with `Conflict`.
    pub async fn end(&self, id: i64) -> Result<Feedback> {
        let interview = self
            .store
            .get_conversation_with_messages(id)
            .await?
            .ok_or_else(|| not_found(id))?;

        if interview.conversation.is_completed() {
            return Err(Error::Conflict(format!("Interview {} is already completed", id)));
        }

        let transcript = transcript::assemble(&interview.messages);
        tracing::info!(
            conversation_id = id,
            messages = interview.messages.len(),
            transcript_chars = transcript.len(),
            "requesting interview feedback"
        );

        let report = self.ai.generate_feedback(&transcript).await.map_err(|e| {
            tracing::error!(conversation_id = id, error = %e, "feedback generation failed");
            e
        })?;

        let feedback = self.store.complete_conversation(id, &report).await?;
        tracing::info!(
            conversation_id = id,
            feedback_id = feedback.id,
            overall_score = feedback.overall_score,
            verdict = feedback.verdict.as_deref(),
            "interview completed"
        );
        Ok(feedback)
    }

    pub async fn get_feedback(&self, id: i64) -> Result<Feedback> {
        self.store
            .get_feedback(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Feedback for interview {} not found", id)))
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.store.delete_conversation(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(conversation_id = id, "interview deleted");
        Ok(())
    }
}

fn not_found(id: i64) -> Error {
    Error::NotFound(format!("Interview {} not found", id))
}
