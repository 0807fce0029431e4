use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client};
use std::sync::Arc;

use crate::error::{Error, Result};

#[async_trait]
pub trait SpeechProvider: Send + Sync {
    async fn transcribe(&self, audio: Bytes, filename: String) -> Result<String>;

    async fn synthesize(&self, text: &str) -> Result<Bytes>;
}

#[derive(Clone)]
pub struct OpenAiSpeechProvider {
    client: Client,
    api_key: String,
    base_url: String,
    transcription_model: String,
    speech_model: String,
    voice: String,
}

impl OpenAiSpeechProvider {
    pub fn new(
        client: Client,
        api_key: String,
        base_url: String,
        transcription_model: String,
        speech_model: String,
        voice: String,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            transcription_model,
            speech_model,
            voice,
        }
    }
}

#[async_trait]
impl SpeechProvider for OpenAiSpeechProvider {
    async fn transcribe(&self, audio: Bytes, filename: String) -> Result<String> {
        #[derive(serde::Deserialize)]
        struct TranscriptionResp {
            text: String,
        }

        let file = multipart::Part::bytes(audio.to_vec()).file_name(filename);
        let form = multipart::Form::new()
            .text("model", self.transcription_model.clone())
            .part("file", file);

        let res = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Transcription API Error {}: {}", status, text).into());
        }

        let parsed: TranscriptionResp = res.json().await?;
        Ok(parsed.text)
    }

    async fn synthesize(&self, text: &str) -> Result<Bytes> {
        let payload = serde_json::json!({
            "model": self.speech_model,
            "voice": self.voice,
            "input": text,
        });

        let res = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Speech API Error {}: {}", status, text).into());
        }

        Ok(res.bytes().await?)
    }
}

#[derive(Clone)]
pub struct SpeechService {
    provider: Arc<dyn SpeechProvider>,
}

impl SpeechService {
    pub fn new(provider: Arc<dyn SpeechProvider>) -> Self {
        Self { provider }
    }

    pub async fn transcribe(&self, audio: Bytes, filename: Option<String>) -> Result<String> {
        if audio.is_empty() {
            return Err(Error::BadRequest("Audio file is empty".to_string()));
        }
        let filename = filename
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| "audio.webm".to_string());
        tracing::info!(bytes = audio.len(), %filename, "transcribing audio");

        self.provider
            .transcribe(audio, filename)
            .await
            .map_err(|e| Error::external("audio transcription", e))
    }

    pub async fn synthesize(&self, text: &str) -> Result<Bytes> {
        if text.trim().is_empty() {
            return Err(Error::BadRequest("Text is required".to_string()));
        }
        self.provider
            .synthesize(text)
            .await
            .map_err(|e| Error::external("speech synthesis", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSpeech {
        filenames: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SpeechProvider for RecordingSpeech {
        async fn transcribe(&self, _audio: Bytes, filename: String) -> Result<String> {
            self.filenames.lock().unwrap().push(filename);
            Ok("hello there".to_string())
        }

        async fn synthesize(&self, _text: &str) -> Result<Bytes> {
            Err(anyhow::anyhow!("quota exceeded").into())
        }
    }

    #[tokio::test]
    async fn transcription_defaults_filename() {
        let provider = Arc::new(RecordingSpeech::default());
        let service = SpeechService::new(provider.clone());

        let text = service
            .transcribe(Bytes::from_static(b"RIFF"), None)
            .await
            .unwrap();
        assert_eq!(text, "hello there");
        assert_eq!(
            *provider.filenames.lock().unwrap(),
            vec!["audio.webm".to_string()]
        );
    }

    #[tokio::test]
    async fn rejects_empty_inputs_before_calling_provider() {
        let provider = Arc::new(RecordingSpeech::default());
        let service = SpeechService::new(provider.clone());

        tokio_test::assert_err!(service.transcribe(Bytes::new(), None).await);
        tokio_test::assert_err!(service.synthesize("   ").await);
        assert!(provider.filenames.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_external() {
        let service = SpeechService::new(Arc::new(RecordingSpeech::default()));
        let err = service.synthesize("Welcome to your interview").await.unwrap_err();
        assert!(matches!(err, Error::ExternalService { .. }));
    }
}
