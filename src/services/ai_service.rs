use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::feedback::{CategoryScore, FeedbackReport, RECOGNIZED_CATEGORIES};
use crate::models::job::NewJob;
use crate::services::llm_provider::CompletionProvider;

pub const FEEDBACK_SYSTEM_PROMPT: &str = r#"Analyze the following interview transcript and provide detailed feedback.
Return ONLY a JSON object (no markdown, no commentary) with:
{
  "overallScore": number (0-10),
  "verdict": "Strong Hire" | "Hire" | "Hold" | "No Hire",
  "summary": "text",
  "categories": {
    "technical": { "score": number, "feedback": "text" },
    "communication": { "score": number, "feedback": "text" },
    "problem_solving": { "score": number, "feedback": "text" },
    "cultural_fit": { "score": number, "feedback": "text" },
    "confidence": { "score": number, "feedback": "text" }
  },
  "strengths": ["text"],
  "improvements": ["text"],
  "recommendation": "text"
}
If the transcript is empty, still return the object and say so in the summary."#;

pub const RESUME_SYSTEM_PROMPT: &str = r#"You are an expert career coach and job market analyst.
Analyze the provided resume text.
1. Identify key skills and experience level.
2. Suggest 5 specific, relevant job titles and simulated job listings that would be a good fit.
3. For each job, provide a company name, location, and a brief description.
4. Provide a 'matchScore' (0-100) based on how well the resume fits.
5. Provide a list of 'requirements' for each job.

Return ONLY a JSON object with this structure:
{
  "message": "Analysis summary...",
  "matchedJobs": [
    {
      "title": "Job Title",
      "company": "Company Name",
      "location": "Location",
      "description": "Brief description...",
      "requirements": ["req1", "req2"],
      "matchScore": 85
    }
  ]
}"#;

const FEEDBACK_CONTEXT: &str = "feedback generation";
const RESUME_CONTEXT: &str = "resume analysis";

/// Parsed resume-matching response. `response` is the provider object exactly
/// as received; `matched_jobs` is `None` when the provider sent no
/// `matchedJobs` key at all.
#[derive(Debug, Clone)]
pub struct JobMatchOutcome {
    pub response: JsonValue,
    pub matched_jobs: Option<Vec<NewJob>>,
}

#[derive(Clone)]
pub struct AIService {
    provider: Arc<dyn CompletionProvider>,
}

impl AIService {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    pub async fn generate_feedback(&self, transcript: &str) -> Result<FeedbackReport> {
        let raw = self
            .provider
            .complete(FEEDBACK_SYSTEM_PROMPT, transcript, true)
            .await
            .map_err(|e| Error::external(FEEDBACK_CONTEXT, e))?;
        parse_feedback(&raw)
    }

    pub async fn match_jobs(&self, resume_text: &str) -> Result<JobMatchOutcome> {
        let raw = self
            .provider
            .complete(RESUME_SYSTEM_PROMPT, resume_text, true)
            .await
            .map_err(|e| Error::external(RESUME_CONTEXT, e))?;
        parse_job_matches(&raw)
    }
}

fn parse_object(raw: &str, context: &str) -> Result<(JsonValue, Map<String, JsonValue>)> {
    let value: JsonValue =
        serde_json::from_str(raw.trim()).map_err(|e| Error::external(context, e))?;
    match &value {
        JsonValue::Object(map) => {
            let map = map.clone();
            Ok((value, map))
        }
        other => Err(Error::external(
            context,
            format!("expected a JSON object, got {}", json_kind(other)),
        )),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

fn coerce_int(value: Option<&JsonValue>) -> Option<i32> {
    let value = value?;
    if let Some(i) = value.as_i64() {
        return i32::try_from(i).ok();
    }
    let f = value
        .as_f64()
        .filter(|f| f.is_finite() && f.abs() <= i32::MAX as f64)?;
    let rounded = f.round();
    if rounded != f {
        tracing::warn!(value = f, rounded, "non-integer score rounded");
    }
    Some(rounded as i32)
}

fn coerce_string(value: Option<&JsonValue>) -> Option<String> {
    value.and_then(|v| v.as_str()).map(|s| s.to_string())
}

fn coerce_string_list(value: Option<&JsonValue>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|x| x.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn coerce_categories(value: Option<&JsonValue>) -> BTreeMap<String, CategoryScore> {
    let Some(map) = value.and_then(|v| v.as_object()) else {
        return BTreeMap::new();
    };
    map.iter()
        .map(|(name, entry)| {
            let score = CategoryScore {
                score: coerce_int(entry.get("score")),
                feedback: coerce_string(entry.get("feedback")),
            };
            (name.clone(), score)
        })
        .collect()
}

/// Decodes a feedback response. Anything that is not a JSON object is an
/// external-service error; individual fields are defaulted, never rejected.
pub fn parse_feedback(raw: &str) -> Result<FeedbackReport> {
    let (_, obj) = parse_object(raw, FEEDBACK_CONTEXT)?;

    let report = FeedbackReport {
        overall_score: coerce_int(obj.get("overallScore")),
        verdict: coerce_string(obj.get("verdict")),
        summary: coerce_string(obj.get("summary")),
        categories: coerce_categories(obj.get("categories")),
        strengths: coerce_string_list(obj.get("strengths")),
        improvements: coerce_string_list(obj.get("improvements")),
        recommendation: coerce_string(obj.get("recommendation")),
    };

    if let Some(verdict) = report.verdict.as_deref() {
        if report.parsed_verdict().is_none() {
            tracing::warn!(verdict, "provider returned an unrecognized verdict");
        }
    }
    if let Some(score) = report.overall_score {
        if !(0..=10).contains(&score) {
            tracing::warn!(score, "overall score outside 0-10");
        }
    }
    let missing: Vec<&str> = RECOGNIZED_CATEGORIES
        .iter()
        .copied()
        .filter(|name| !report.categories.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        tracing::warn!(?missing, "feedback is missing recognized categories");
    }

    Ok(report)
}

fn required_job_field(entry: &Map<String, JsonValue>, key: &str, index: usize) -> Result<String> {
    coerce_string(entry.get(key)).ok_or_else(|| {
        Error::external(
            RESUME_CONTEXT,
            format!("matchedJobs[{}] is missing string field '{}'", index, key),
        )
    })
}

/// Decodes a resume-matching response. Every job entry is checked before any
/// of them is handed back, so a malformed entry rejects the whole batch.
pub fn parse_job_matches(raw: &str) -> Result<JobMatchOutcome> {
    let (response, obj) = parse_object(raw, RESUME_CONTEXT)?;

    let Some(matched) = obj.get("matchedJobs") else {
        return Ok(JobMatchOutcome {
            response,
            matched_jobs: None,
        });
    };
    let entries = matched.as_array().ok_or_else(|| {
        Error::external(
            RESUME_CONTEXT,
            format!("matchedJobs must be an array, got {}", json_kind(matched)),
        )
    })?;

    let mut jobs = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let entry = entry.as_object().ok_or_else(|| {
            Error::external(
                RESUME_CONTEXT,
                format!("matchedJobs[{}] must be an object", index),
            )
        })?;

        let match_score = coerce_int(entry.get("matchScore")).unwrap_or(0);
        if !(0..=100).contains(&match_score) {
            tracing::warn!(index, match_score, "match score outside 0-100");
        }

        jobs.push(NewJob {
            title: required_job_field(entry, "title", index)?,
            company: required_job_field(entry, "company", index)?,
            location: required_job_field(entry, "location", index)?,
            description: required_job_field(entry, "description", index)?,
            requirements: coerce_string_list(entry.get("requirements")),
            match_score: Some(match_score),
        });
    }

    Ok(JobMatchOutcome {
        response,
        matched_jobs: Some(jobs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm_provider::MockCompletionProvider;
    use serde_json::json;

    fn sample_feedback() -> JsonValue {
        json!({
            "overallScore": 8,
            "verdict": "Hire",
            "summary": "Clear and structured answers.",
            "categories": {
                "technical": { "score": 8, "feedback": "Solid fundamentals" },
                "communication": { "score": 9, "feedback": "Concise" },
                "problem_solving": { "score": 7, "feedback": "Methodical" },
                "cultural_fit": { "score": 8, "feedback": "Collaborative" },
                "confidence": { "score": 7, "feedback": "Steady" }
            },
            "strengths": ["Structure", "Clarity"],
            "improvements": ["Quantify impact"],
            "recommendation": "Proceed to the onsite round."
        })
    }

    #[test]
    fn parses_well_formed_feedback_verbatim() {
        let report = parse_feedback(&sample_feedback().to_string()).unwrap();
        assert_eq!(report.overall_score, Some(8));
        assert_eq!(report.verdict.as_deref(), Some("Hire"));
        assert_eq!(report.categories.len(), 5);
        assert_eq!(
            report.categories["problem_solving"],
            CategoryScore {
                score: Some(7),
                feedback: Some("Methodical".into())
            }
        );
        assert_eq!(report.strengths, vec!["Structure", "Clarity"]);
        assert_eq!(report.recommendation.as_deref(), Some("Proceed to the onsite round."));
    }

    #[test]
    fn tolerates_missing_and_extra_fields() {
        let raw = json!({
            "overallScore": 6.6,
            "verdict": "Maybe",
            "categories": {
                "technical": { "score": "high" },
                "leadership": { "score": 5, "feedback": "Emerging" }
            },
            "strengths": ["Curious", 42],
            "improvements": "not a list"
        })
        .to_string();

        let report = parse_feedback(&raw).unwrap();
        assert_eq!(report.overall_score, Some(7));
        assert_eq!(report.verdict.as_deref(), Some("Maybe"));
        assert_eq!(report.summary, None);
        assert_eq!(report.categories["technical"], CategoryScore::default());
        assert_eq!(report.categories["leadership"].score, Some(5));
        assert_eq!(report.strengths, vec!["Curious"]);
        assert!(report.improvements.is_empty());
        assert_eq!(report.recommendation, None);
    }

    #[test]
    fn fractional_scores_are_rounded_to_nearest() {
        assert_eq!(coerce_int(Some(&json!(7.5))), Some(8));
        assert_eq!(coerce_int(Some(&json!(7.0))), Some(7));
        assert_eq!(coerce_int(Some(&json!(6.4))), Some(6));
        assert_eq!(coerce_int(Some(&json!(9))), Some(9));
        assert_eq!(coerce_int(Some(&json!("9"))), None);
        assert_eq!(coerce_int(Some(&json!(f64::MAX))), None);
    }

    #[test]
    fn rejects_non_json_and_non_object_payloads() {
        for raw in ["Sure! Here is your feedback:", "```json\n{}\n```", "[1,2,3]", ""] {
            let err = parse_feedback(raw).unwrap_err();
            assert!(
                matches!(err, Error::ExternalService { .. }),
                "expected external error for {:?}",
                raw
            );
        }
    }

    #[test]
    fn job_matches_default_requirements_and_score() {
        let raw = json!({
            "message": "Strong backend profile",
            "matchedJobs": [
                { "title": "Backend Engineer", "company": "Acme", "location": "Remote",
                  "description": "APIs", "requirements": ["Rust", "SQL"], "matchScore": 91 },
                { "title": "SRE", "company": "Globex", "location": "Berlin",
                  "description": "Reliability" }
            ]
        })
        .to_string();

        let outcome = parse_job_matches(&raw).unwrap();
        let jobs = outcome.matched_jobs.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].requirements, vec!["Rust", "SQL"]);
        assert_eq!(jobs[0].match_score, Some(91));
        assert!(jobs[1].requirements.is_empty());
        assert_eq!(jobs[1].match_score, Some(0));
        assert_eq!(outcome.response["message"], "Strong backend profile");
    }

    #[test]
    fn absent_matched_jobs_is_not_an_error() {
        let outcome = parse_job_matches(r#"{"message":"Nothing fits yet"}"#).unwrap();
        assert!(outcome.matched_jobs.is_none());
        assert_eq!(outcome.response, json!({"message": "Nothing fits yet"}));
    }

    #[test]
    fn malformed_job_entry_rejects_the_batch() {
        let raw = json!({
            "message": "m",
            "matchedJobs": [
                { "title": "A", "company": "B", "location": "C", "description": "D" },
                { "title": "No company", "location": "C", "description": "D" }
            ]
        })
        .to_string();
        let err = parse_job_matches(&raw).unwrap_err();
        assert!(err.to_string().contains("company"));

        let err = parse_job_matches(r#"{"matchedJobs": {"title": "x"}}"#).unwrap_err();
        assert!(matches!(err, Error::ExternalService { .. }));
    }

    #[tokio::test]
    async fn submits_transcript_with_feedback_prompt() {
        let mut provider = MockCompletionProvider::new();
        provider
            .expect_complete()
            .withf(|system, user, json| {
                system.contains("overallScore") && user.trim() == "user: hello" && *json
            })
            .times(1)
            .returning(|_, _, _| Ok(sample_feedback().to_string()));

        let service = AIService::new(Arc::new(provider));
        let report = service.generate_feedback("user: hello").await.unwrap();
        assert_eq!(report.verdict.as_deref(), Some("Hire"));
    }

    #[tokio::test]
    async fn provider_failure_surfaces_as_external_error() {
        let mut provider = MockCompletionProvider::new();
        provider
            .expect_complete()
            .times(1)
            .returning(|_, _, _| Err(anyhow::anyhow!("connection reset").into()));

        let service = AIService::new(Arc::new(provider));
        let err = service.match_jobs("resume").await.unwrap_err();
        match err {
            Error::ExternalService { context, source } => {
                assert_eq!(context, "resume analysis");
                assert!(source.to_string().contains("connection reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
