use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const RECOGNIZED_CATEGORIES: [&str; 5] = [
    "technical",
    "communication",
    "problem_solving",
    "cultural_fit",
    "confidence",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Strong Hire")]
    StrongHire,
    #[serde(rename = "Hire")]
    Hire,
    #[serde(rename = "Hold")]
    Hold,
    #[serde(rename = "No Hire")]
    NoHire,
}

impl Verdict {
    pub const ALL: [Verdict; 4] = [
        Verdict::StrongHire,
        Verdict::Hire,
        Verdict::Hold,
        Verdict::NoHire,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::StrongHire => "Strong Hire",
            Verdict::Hire => "Hire",
            Verdict::Hold => "Hold",
            Verdict::NoHire => "No Hire",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verdict::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("unrecognized verdict: {}", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: Option<i32>,
    pub feedback: Option<String>,
}

/// Structured interview feedback as exchanged with the completion provider
/// and returned to clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReport {
    pub overall_score: Option<i32>,
    pub verdict: Option<String>,
    pub summary: Option<String>,
    pub categories: BTreeMap<String, CategoryScore>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub recommendation: Option<String>,
}

impl FeedbackReport {
    pub fn parsed_verdict(&self) -> Option<Verdict> {
        self.verdict.as_deref().and_then(|v| v.parse().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub conversation_id: i64,
    pub overall_score: Option<i32>,
    pub verdict: Option<String>,
    pub summary: Option<String>,
    pub categories: BTreeMap<String, CategoryScore>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    /// Reserved; nothing populates it yet.
    pub integrity_note: Option<String>,
    pub recommendation: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Feedback> for FeedbackReport {
    fn from(value: Feedback) -> Self {
        Self {
            overall_score: value.overall_score,
            verdict: value.verdict,
            summary: value.summary,
            categories: value.categories,
            strengths: value.strengths,
            improvements: value.improvements,
            recommendation: value.recommendation,
        }
    }
}
