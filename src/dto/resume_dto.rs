use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalyzeResumePayload {
    #[validate(length(min = 1))]
    pub text: String,
}
