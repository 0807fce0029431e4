use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};

use crate::{database::Pagination, error::Result, AppState};

#[utoipa::path(
    get,
    path = "/api/jobs",
    params(
        ("skip" = Option<i64>, Query, description = "Rows to skip"),
        ("limit" = Option<i64>, Query, description = "Page size, default 100")
    ),
    responses(
        (status = 200, description = "Jobs collected from resume analyses")
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse> {
    let jobs = state.job_service.list(page).await?;
    Ok(Json(jobs))
}
