pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::Config;
use crate::database::{pool, EntityStore, MemoryStore, PgStore};
use crate::error::Result;
use crate::services::{
    ai_service::AIService,
    interview_service::InterviewService,
    job_service::JobService,
    llm_provider::{CompletionProvider, OpenAiCompletionProvider},
    resume_service::ResumeService,
    speech_service::{OpenAiSpeechProvider, SpeechProvider, SpeechService},
    user_service::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub interview_service: InterviewService,
    pub resume_service: ResumeService,
    pub job_service: JobService,
    pub user_service: UserService,
    pub speech_service: SpeechService,
}

impl AppState {
    /// Wires the services around explicitly supplied collaborators.
    pub fn new(
        store: Arc<dyn EntityStore>,
        completion: Arc<dyn CompletionProvider>,
        speech: Arc<dyn SpeechProvider>,
    ) -> Self {
        let ai_service = AIService::new(completion);

        Self {
            interview_service: InterviewService::new(store.clone(), ai_service.clone()),
            resume_service: ResumeService::new(store.clone(), ai_service),
            job_service: JobService::new(store.clone()),
            user_service: UserService::new(store),
            speech_service: SpeechService::new(speech),
        }
    }

    /// Builds the production collaborators: Postgres when `DATABASE_URL` is
    /// set (migrations applied), the in-process store otherwise, and the
    /// OpenAI-compatible providers sharing one HTTP client.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn EntityStore> = match &config.database_url {
            Some(url) => {
                let pool = pool::create_pool(config, url).await?;
                pool::run_migrations(&pool).await?;
                tracing::info!("using Postgres entity store");
                Arc::new(PgStore::new(pool))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; data is kept in memory and lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.provider_timeout_secs))
            .build()?;

        let completion = OpenAiCompletionProvider::new(
            http_client.clone(),
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.completion_model.clone(),
        );
        let speech = OpenAiSpeechProvider::new(
            http_client,
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.transcription_model.clone(),
            config.speech_model.clone(),
            config.speech_voice.clone(),
        );

        Ok(Self::new(store, Arc::new(completion), Arc::new(speech)))
    }
}
