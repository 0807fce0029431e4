use axum::{
    extract::{Multipart, Query, State},
    http::header,
    response::{IntoResponse, Json},
};

use crate::{
    dto::audio_dto::{TextToSpeechQuery, TranscriptionResponse},
    error::{Error, Result},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/audio/transcribe",
    responses(
        (status = 200, description = "Transcribed text"),
        (status = 400, description = "No audio file uploaded"),
        (status = 502, description = "Transcription provider failed")
    )
)]
#[axum::debug_handler]
pub async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().map(|f| f.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| Error::BadRequest(e.to_string()))?;
            upload = Some((data, filename));
            break;
        }
    }

    let (data, filename) =
        upload.ok_or_else(|| Error::BadRequest("No audio file uploaded".to_string()))?;
    let text = state.speech_service.transcribe(data, filename).await?;
    Ok(Json(TranscriptionResponse { text }))
}

#[utoipa::path(
    post,
    path = "/api/audio/text-to-speech",
    params(
        ("text" = String, Query, description = "Text to speak")
    ),
    responses(
        (status = 200, description = "MP3 audio"),
        (status = 400, description = "Text is required"),
        (status = 502, description = "Speech provider failed")
    )
)]
#[axum::debug_handler]
pub async fn text_to_speech(
    State(state): State<AppState>,
    Query(query): Query<TextToSpeechQuery>,
) -> Result<impl IntoResponse> {
    let audio = state.speech_service.synthesize(&query.text).await?;
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio))
}
