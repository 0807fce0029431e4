use async_trait::async_trait;
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};
use std::collections::BTreeMap;

use super::store::{EntityStore, Pagination};
use crate::error::{Error, Result};
use crate::models::conversation::{
    Conversation, ConversationStatus, ConversationWithMessages, NewConversation,
};
use crate::models::feedback::{CategoryScore, Feedback, FeedbackReport};
use crate::models::job::{Job, NewJob};
use crate::models::message::{Message, NewMessage};
use crate::models::user::{NewUser, User};

const CONVERSATION_COLUMNS: &str = "id, user_id, title, interview_type, candidate_name, status, started_at, completed_at, created_at";
const FEEDBACK_COLUMNS: &str = "id, conversation_id, overall_score, verdict, summary, categories, strengths, improvements, integrity_note, recommendation, created_at";
const JOB_COLUMNS: &str =
    "id, title, company, location, description, requirements, match_score, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn conversation_from_row(row: &PgRow) -> sqlx::Result<Conversation> {
    let status: String = row.try_get("status")?;
    let status: ConversationStatus = status.parse().map_err(|e| sqlx::Error::ColumnDecode {
        index: "status".to_string(),
        source: Box::new(e),
    })?;

    Ok(Conversation {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        interview_type: row.try_get("interview_type")?,
        candidate_name: row.try_get("candidate_name")?,
        status,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn feedback_from_row(row: &PgRow) -> sqlx::Result<Feedback> {
    Ok(Feedback {
        id: row.try_get("id")?,
        conversation_id: row.try_get("conversation_id")?,
        overall_score: row.try_get("overall_score")?,
        verdict: row.try_get("verdict")?,
        summary: row.try_get("summary")?,
        categories: row
            .try_get::<Json<BTreeMap<String, CategoryScore>>, _>("categories")?
            .0,
        strengths: row.try_get::<Json<Vec<String>>, _>("strengths")?.0,
        improvements: row.try_get::<Json<Vec<String>>, _>("improvements")?.0,
        integrity_note: row.try_get("integrity_note")?,
        recommendation: row.try_get("recommendation")?,
        created_at: row.try_get("created_at")?,
    })
}

fn job_from_row(row: &PgRow) -> sqlx::Result<Job> {
    Ok(Job {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        company: row.try_get("company")?,
        location: row.try_get("location")?,
        description: row.try_get("description")?,
        requirements: row.try_get::<Json<Vec<String>>, _>("requirements")?.0,
        match_score: row.try_get("match_score")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl EntityStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, name, resume_text)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password, name, resume_text, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.resume_text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::Conflict(format!("Username {} is already taken", user.username))
            }
            other => other.into(),
        })?;

        Ok(created)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, name, resume_text, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_conversation(&self, conversation: NewConversation) -> Result<Conversation> {
        let sql = format!(
            r#"
            INSERT INTO conversations (user_id, title, interview_type, candidate_name, status)
            VALUES ($1, $2, $3, $4, 'in_progress')
            RETURNING {}
            "#,
            CONVERSATION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(conversation.user_id)
            .bind(&conversation.title)
            .bind(&conversation.interview_type)
            .bind(&conversation.candidate_name)
            .fetch_one(&self.pool)
            .await?;

        Ok(conversation_from_row(&row)?)
    }

    async fn list_conversations(&self, page: Pagination) -> Result<Vec<Conversation>> {
        let sql = format!(
            "SELECT {} FROM conversations ORDER BY id ASC LIMIT $1 OFFSET $2",
            CONVERSATION_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let conversations = rows
            .iter()
            .map(conversation_from_row)
            .collect::<sqlx::Result<Vec<_>>>()?;
        Ok(conversations)
    }

    async fn get_conversation(&self, id: i64) -> Result<Option<Conversation>> {
        let sql = format!("SELECT {} FROM conversations WHERE id = $1", CONVERSATION_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(conversation_from_row).transpose()?)
    }

    async fn get_conversation_with_messages(
        &self,
        id: i64,
    ) -> Result<Option<ConversationWithMessages>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let sql = format!("SELECT {} FROM conversations WHERE id = $1", CONVERSATION_COLUMNS);
        let Some(row) = sqlx::query(&sql).bind(id).fetch_optional(&mut *tx).await? else {
            return Ok(None);
        };
        let conversation = conversation_from_row(&row)?;

        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, role, content, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(ConversationWithMessages {
            conversation,
            messages,
        }))
    }

    async fn delete_conversation(&self, id: i64) -> Result<bool> {
        let res = sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message> {
        let created = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (conversation_id, role, content)
            VALUES ($1, $2, $3)
            RETURNING id, conversation_id, role, content, created_at
            "#,
        )
        .bind(message.conversation_id)
        .bind(&message.role)
        .bind(&message.content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                Error::NotFound(format!("Interview {} not found", message.conversation_id))
            }
            sqlx::Error::Database(db) if db.is_check_violation() => {
                Error::BadRequest("Message role and content must not be empty".to_string())
            }
            other => other.into(),
        })?;

        Ok(created)
    }

    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, role, content, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn complete_conversation(
        &self,
        conversation_id: i64,
        report: &FeedbackReport,
    ) -> Result<Feedback> {
        let mut tx = self.pool.begin().await?;

        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM conversations WHERE id = $1 FOR UPDATE")
                .bind(conversation_id)
                .fetch_optional(&mut *tx)
                .await?;

        match status.as_deref() {
            None => {
                return Err(Error::NotFound(format!(
                    "Interview {} not found",
                    conversation_id
                )))
            }
            Some("in_progress") => {}
            Some(other) => {
                return Err(Error::Conflict(format!(
                    "Interview {} is already {}",
                    conversation_id, other
                )))
            }
        }

        let sql = format!(
            r#"
            INSERT INTO feedback (
                conversation_id, overall_score, verdict, summary, categories,
                strengths, improvements, recommendation
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            FEEDBACK_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(conversation_id)
            .bind(report.overall_score)
            .bind(&report.verdict)
            .bind(&report.summary)
            .bind(Json(&report.categories))
            .bind(Json(&report.strengths))
            .bind(Json(&report.improvements))
            .bind(&report.recommendation)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => Error::Conflict(format!(
                    "Feedback for interview {} already exists",
                    conversation_id
                )),
                other => other.into(),
            })?;
        let feedback = feedback_from_row(&row)?;

        sqlx::query(
            r#"
            UPDATE conversations
            SET status = 'completed', completed_at = GREATEST(NOW(), started_at)
            WHERE id = $1
            "#,
        )
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(feedback)
    }

    async fn get_feedback(&self, conversation_id: i64) -> Result<Option<Feedback>> {
        let sql = format!(
            "SELECT {} FROM feedback WHERE conversation_id = $1",
            FEEDBACK_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(conversation_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(feedback_from_row).transpose()?)
    }

    async fn create_jobs(&self, jobs: Vec<NewJob>) -> Result<Vec<Job>> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            INSERT INTO jobs (title, company, location, description, requirements, match_score)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            JOB_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(jobs.len());
        for job in &jobs {
            let row = sqlx::query(&sql)
                .bind(&job.title)
                .bind(&job.company)
                .bind(&job.location)
                .bind(&job.description)
                .bind(Json(&job.requirements))
                .bind(job.match_score)
                .fetch_one(&mut *tx)
                .await?;
            created.push(job_from_row(&row)?);
        }
        tx.commit().await?;

        Ok(created)
    }

    async fn list_jobs(&self, page: Pagination) -> Result<Vec<Job>> {
        let sql = format!(
            "SELECT {} FROM jobs ORDER BY id ASC LIMIT $1 OFFSET $2",
            JOB_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let jobs = rows
            .iter()
            .map(job_from_row)
            .collect::<sqlx::Result<Vec<_>>>()?;
        Ok(jobs)
    }
}
