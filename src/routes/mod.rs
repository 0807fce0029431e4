pub mod audio;
pub mod health;
pub mod interviews;
pub mod jobs;
pub mod resume;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{middleware::rate_limit, AppState};

/// Large enough for a few minutes of recorded answer audio.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Every `/api` route, rate limited as one group.
pub fn api_routes(api_rps: u32) -> Router<AppState> {
    Router::new()
        .route(
            "/api/interviews",
            get(interviews::list_interviews).post(interviews::start_interview),
        )
        .route(
            "/api/interviews/:id",
            get(interviews::get_interview).delete(interviews::delete_interview),
        )
        .route(
            "/api/interviews/:id/messages",
            post(interviews::append_message),
        )
        .route("/api/interviews/:id/end", post(interviews::end_interview))
        .route("/api/interviews/:id/feedback", get(interviews::get_feedback))
        .route("/api/jobs", get(jobs::list_jobs))
        .route("/api/resume/analyze", post(resume::analyze_resume))
        .route("/api/audio/transcribe", post(audio::transcribe))
        .route("/api/audio/text-to-speech", post(audio::text_to_speech))
        .route("/api/users", post(users::create_user))
        .route("/api/users/:id", get(users::get_user))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::RateLimiter::new(api_rps),
            rate_limit::rate_limit,
        ))
}

/// The complete application minus static-file serving.
pub fn app(state: AppState, api_rps: u32) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .merge(api_routes(api_rps))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
