use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::database::EntityStore;
use crate::error::Result;
use crate::models::job::Job;
use crate::services::ai_service::AIService;

/// What an analysis produced: the provider object untouched, plus the rows
/// persisted from its `matchedJobs`.
#[derive(Debug, Clone)]
pub struct ResumeAnalysis {
    pub response: JsonValue,
    pub jobs: Vec<Job>,
}

#[derive(Clone)]
pub struct ResumeService {
    store: Arc<dyn EntityStore>,
    ai: AIService,
}

impl ResumeService {
    pub fn new(store: Arc<dyn EntityStore>, ai: AIService) -> Self {
        Self { store, ai }
    }

    pub async fn analyze(&self, resume_text: &str) -> Result<ResumeAnalysis> {
        let outcome = self.ai.match_jobs(resume_text).await.map_err(|e| {
            tracing::error!(error = %e, "resume analysis failed");
            e
        })?;

        let jobs = match outcome.matched_jobs {
            Some(matched) if !matched.is_empty() => {
                let jobs = self.store.create_jobs(matched).await?;
                tracing::info!(count = jobs.len(), "persisted matched jobs");
                jobs
            }
            Some(_) => Vec::new(),
            None => {
                tracing::debug!("provider response has no matchedJobs; nothing persisted");
                Vec::new()
            }
        };

        Ok(ResumeAnalysis {
            response: outcome.response,
            jobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryStore, Pagination};
    use crate::services::llm_provider::MockCompletionProvider;
    use serde_json::json;

    fn service(raw: &'static str) -> (ResumeService, Arc<MemoryStore>) {
        let mut provider = MockCompletionProvider::new();
        provider
            .expect_complete()
            .times(1)
            .returning(move |_, _, _| Ok(raw.to_string()));
        let store = Arc::new(MemoryStore::new());
        let service = ResumeService::new(store.clone(), AIService::new(Arc::new(provider)));
        (service, store)
    }

    #[tokio::test]
    async fn persists_every_matched_job_with_defaults() {
        let (service, store) = service(
            r#"{
                "message": "Strong backend profile",
                "matchedJobs": [
                    {"title": "Backend Engineer", "company": "Acme", "location": "Remote",
                     "description": "APIs", "requirements": ["Rust", "SQL"], "matchScore": 88},
                    {"title": "SRE", "company": "Globex", "location": "Berlin",
                     "description": "On-call"}
                ]
            }"#,
        );

        let analysis = service.analyze("10 years of Rust").await.unwrap();
        assert_eq!(analysis.jobs.len(), 2);
        assert_eq!(analysis.response["message"], json!("Strong backend profile"));
        assert_eq!(analysis.response["matchedJobs"][1].get("matchScore"), None);

        let stored = store.list_jobs(Pagination::default()).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].requirements, vec!["Rust", "SQL"]);
        assert_eq!(stored[0].match_score, Some(88));
        assert!(stored[1].requirements.is_empty());
        assert_eq!(stored[1].match_score, Some(0));
    }

    #[tokio::test]
    async fn missing_matched_jobs_is_not_an_error() {
        let (service, store) = service(r#"{"message": "Could not read resume"}"#);

        let analysis = service.analyze("???").await.unwrap();
        assert!(analysis.jobs.is_empty());
        assert_eq!(analysis.response, json!({"message": "Could not read resume"}));
        assert!(store.list_jobs(Pagination::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_entry_persists_nothing() {
        let (service, store) = service(
            r#"{"matchedJobs": [
                {"title": "A", "company": "B", "location": "C", "description": "D"},
                {"title": "missing the rest"}
            ]}"#,
        );

        assert!(service.analyze("resume").await.is_err());
        assert!(store.list_jobs(Pagination::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_json_response_is_external_error() {
        let (service, _) = service("Here are some jobs you might like!");
        let err = service.analyze("resume").await.unwrap_err();
        assert!(matches!(err, crate::error::Error::ExternalService { .. }));
    }
}
