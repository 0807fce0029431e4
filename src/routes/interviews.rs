use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    database::Pagination,
    dto::interview_dto::{
        AppendMessagePayload, FeedbackResponse, InterviewResponse, StartInterviewPayload,
    },
    error::Result,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/interviews",
    request_body = StartInterviewPayload,
    responses(
        (status = 201, description = "Interview started"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn start_interview(
    State(state): State<AppState>,
    Json(payload): Json<StartInterviewPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let conversation = state
        .interview_service
        .start(
            &payload.interview_type,
            &payload.candidate_name,
            payload.user_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

#[utoipa::path(
    get,
    path = "/api/interviews",
    params(
        ("skip" = Option<i64>, Query, description = "Rows to skip"),
        ("limit" = Option<i64>, Query, description = "Page size, default 100")
    ),
    responses(
        (status = 200, description = "Interviews in creation order")
    )
)]
#[axum::debug_handler]
pub async fn list_interviews(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse> {
    let interviews = state.interview_service.list(page).await?;
    Ok(Json(interviews))
}

#[utoipa::path(
    get,
    path = "/api/interviews/{id}",
    params(
        ("id" = i64, Path, description = "Interview ID")
    ),
    responses(
        (status = 200, description = "Interview with messages and feedback"),
        (status = 404, description = "Interview not found")
    )
)]
#[axum::debug_handler]
pub async fn get_interview(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let detail = state.interview_service.get(id).await?;
    Ok(Json(InterviewResponse::from(detail)))
}

#[utoipa::path(
    delete,
    path = "/api/interviews/{id}",
    params(
        ("id" = i64, Path, description = "Interview ID")
    ),
    responses(
        (status = 204, description = "Interview deleted"),
        (status = 404, description = "Interview not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_interview(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.interview_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/interviews/{id}/messages",
    params(
        ("id" = i64, Path, description = "Interview ID")
    ),
    request_body = AppendMessagePayload,
    responses(
        (status = 201, description = "Message appended"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Interview not found")
    )
)]
#[axum::debug_handler]
pub async fn append_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AppendMessagePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let message = state
        .interview_service
        .append_message(id, &payload.role, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(
    post,
    path = "/api/interviews/{id}/end",
    params(
        ("id" = i64, Path, description = "Interview ID")
    ),
    responses(
        (status = 200, description = "Interview completed, feedback generated"),
        (status = 404, description = "Interview not found"),
        (status = 409, description = "Interview already completed"),
        (status = 502, description = "Feedback provider failed")
    )
)]
#[axum::debug_handler]
pub async fn end_interview(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let feedback = state.interview_service.end(id).await?;
    Ok(Json(FeedbackResponse::from(feedback)))
}

#[utoipa::path(
    get,
    path = "/api/interviews/{id}/feedback",
    params(
        ("id" = i64, Path, description = "Interview ID")
    ),
    responses(
        (status = 200, description = "Feedback report"),
        (status = 404, description = "No feedback for this interview")
    )
)]
#[axum::debug_handler]
pub async fn get_feedback(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let feedback = state.interview_service.get_feedback(id).await?;
    Ok(Json(FeedbackResponse::from(feedback)))
}
