use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{dto::resume_dto::AnalyzeResumePayload, error::Result, AppState};

/// Responds with the provider's object as-is; matched jobs are persisted on
/// the side and can be read back from `/api/jobs`.
#[utoipa::path(
    post,
    path = "/api/resume/analyze",
    request_body = AnalyzeResumePayload,
    responses(
        (status = 200, description = "Analysis with matched jobs"),
        (status = 400, description = "Resume text is required"),
        (status = 502, description = "Analysis provider failed")
    )
)]
#[axum::debug_handler]
pub async fn analyze_resume(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeResumePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let analysis = state.resume_service.analyze(&payload.text).await?;
    Ok(Json(analysis.response))
}
