use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::store::{EntityStore, Pagination};
use crate::error::{Error, Result};
use crate::models::conversation::{
    Conversation, ConversationStatus, ConversationWithMessages, NewConversation,
};
use crate::models::feedback::{Feedback, FeedbackReport};
use crate::models::job::{Job, NewJob};
use crate::models::message::{Message, NewMessage};
use crate::models::user::{NewUser, User};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    conversations: BTreeMap<i64, Conversation>,
    messages: Vec<Message>,
    feedback: BTreeMap<i64, Feedback>,
    jobs: BTreeMap<i64, Job>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn messages_for(&self, conversation_id: i64) -> Vec<Message> {
        let mut messages: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        messages
    }
}

fn page<T: Clone>(items: impl Iterator<Item = T>, page: Pagination) -> Vec<T> {
    items
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

/// In-process store used when no database is configured, and by tests.
/// Mirrors the constraints of the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(Error::Conflict(format!(
                "Username {} is already taken",
                user.username
            )));
        }

        let id = tables.allocate_id();
        let created = User {
            id,
            username: user.username,
            password: user.password_hash,
            name: user.name,
            resume_text: user.resume_text,
            created_at: Utc::now(),
        };
        tables.users.insert(id, created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create_conversation(&self, conversation: NewConversation) -> Result<Conversation> {
        let mut tables = self.tables.write().await;
        if let Some(user_id) = conversation.user_id {
            if !tables.users.contains_key(&user_id) {
                return Err(Error::NotFound(format!("User {} not found", user_id)));
            }
        }

        let id = tables.allocate_id();
        let now = Utc::now();
        let created = Conversation {
            id,
            user_id: conversation.user_id,
            title: conversation.title,
            interview_type: Some(conversation.interview_type),
            candidate_name: Some(conversation.candidate_name),
            status: ConversationStatus::InProgress,
            started_at: now,
            completed_at: None,
            created_at: now,
        };
        tables.conversations.insert(id, created.clone());
        Ok(created)
    }

    async fn list_conversations(&self, pagination: Pagination) -> Result<Vec<Conversation>> {
        let tables = self.tables.read().await;
        Ok(page(tables.conversations.values().cloned(), pagination))
    }

    async fn get_conversation(&self, id: i64) -> Result<Option<Conversation>> {
        Ok(self.tables.read().await.conversations.get(&id).cloned())
    }

    async fn get_conversation_with_messages(
        &self,
        id: i64,
    ) -> Result<Option<ConversationWithMessages>> {
        let tables = self.tables.read().await;
        Ok(tables
            .conversations
            .get(&id)
            .cloned()
            .map(|conversation| ConversationWithMessages {
                conversation,
                messages: tables.messages_for(id),
            }))
    }

    async fn delete_conversation(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.conversations.remove(&id).is_none() {
            return Ok(false);
        }
        tables.messages.retain(|m| m.conversation_id != id);
        tables.feedback.retain(|_, f| f.conversation_id != id);
        Ok(true)
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message> {
        if message.role.is_empty() || message.content.is_empty() {
            return Err(Error::BadRequest(
                "Message role and content must not be empty".to_string(),
            ));
        }
        let mut tables = self.tables.write().await;
        if !tables.conversations.contains_key(&message.conversation_id) {
            return Err(Error::NotFound(format!(
                "Interview {} not found",
                message.conversation_id
            )));
        }

        let id = tables.allocate_id();
        let created = Message {
            id,
            conversation_id: message.conversation_id,
            role: message.role,
            content: message.content,
            created_at: Utc::now(),
        };
        tables.messages.push(created.clone());
        Ok(created)
    }

    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<Message>> {
        Ok(self.tables.read().await.messages_for(conversation_id))
    }

    async fn complete_conversation(
        &self,
        conversation_id: i64,
        report: &FeedbackReport,
    ) -> Result<Feedback> {
        let mut tables = self.tables.write().await;
        let started_at = match tables.conversations.get(&conversation_id) {
            None => {
                return Err(Error::NotFound(format!(
                    "Interview {} not found",
                    conversation_id
                )))
            }
            Some(c) if c.status != ConversationStatus::InProgress => {
                return Err(Error::Conflict(format!(
                    "Interview {} is already {}",
                    conversation_id, c.status
                )))
            }
            Some(c) => c.started_at,
        };
        if tables
            .feedback
            .values()
            .any(|f| f.conversation_id == conversation_id)
        {
            return Err(Error::Conflict(format!(
                "Feedback for interview {} already exists",
                conversation_id
            )));
        }

        let id = tables.allocate_id();
        let now = Utc::now();
        let feedback = Feedback {
            id,
            conversation_id,
            overall_score: report.overall_score,
            verdict: report.verdict.clone(),
            summary: report.summary.clone(),
            categories: report.categories.clone(),
            strengths: report.strengths.clone(),
            improvements: report.improvements.clone(),
            integrity_note: None,
            recommendation: report.recommendation.clone(),
            created_at: now,
        };
        tables.feedback.insert(id, feedback.clone());

        if let Some(conversation) = tables.conversations.get_mut(&conversation_id) {
            conversation.status = ConversationStatus::Completed;
            conversation.completed_at = Some(now.max(started_at));
        }

        Ok(feedback)
    }

    async fn get_feedback(&self, conversation_id: i64) -> Result<Option<Feedback>> {
        let tables = self.tables.read().await;
        Ok(tables
            .feedback
            .values()
            .find(|f| f.conversation_id == conversation_id)
            .cloned())
    }

    async fn create_jobs(&self, jobs: Vec<NewJob>) -> Result<Vec<Job>> {
        let mut tables = self.tables.write().await;
        let mut created = Vec::with_capacity(jobs.len());
        for job in jobs {
            let id = tables.allocate_id();
            let row = Job {
                id,
                title: job.title,
                company: job.company,
                location: job.location,
                description: job.description,
                requirements: job.requirements,
                match_score: job.match_score,
                created_at: Utc::now(),
            };
            tables.jobs.insert(id, row.clone());
            created.push(row);
        }
        Ok(created)
    }

    async fn list_jobs(&self, pagination: Pagination) -> Result<Vec<Job>> {
        let tables = self.tables.read().await;
        Ok(page(tables.jobs.values().cloned(), pagination))
    }
}
