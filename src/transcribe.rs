//! Transcription dispatch and transcript presentation.
//!
//! Encoded containers are uploaded to an OpenAI-compatible transcriptions
//! endpoint as a multipart form (binary WAV + model id) with bearer
//! authentication. Successful responses carry a single `text` field which is
//! rendered word by word.

use std::io::Write;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, SottoError};

/// Response body of the transcriptions endpoint.
#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Client for the transcription collaborator.
#[derive(Debug, Clone)]
pub struct TranscriptionClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl TranscriptionClient {
    pub fn new(endpoint: String, model: String, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            model,
            api_key,
        })
    }

    /// Uploads one WAV container and returns the transcribed text.
    ///
    /// One attempt per flush; the caller decides what to do with failures.
    pub async fn transcribe(&self, container: Vec<u8>, filename: String) -> Result<String> {
        debug!(
            "Dispatching {} byte container as {}",
            container.len(),
            filename
        );

        let part = Part::bytes(container)
            .file_name(filename)
            .mime_str("audio/wav")?;
        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ApiErrorResponse>().await {
                Ok(body) => body.error.message,
                Err(_) => "unrecognized error response".to_string(),
            };
            return Err(SottoError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: TranscriptResponse = response.json().await?;
        Ok(body.text)
    }
}

/// Prints transcript text word by word with a fixed delay between words,
/// ending with a newline. Purely cosmetic pacing; word order is preserved.
pub async fn present_words(text: &str, delay: Duration) {
    let mut stdout = std::io::stdout();

    for word in text.split_whitespace() {
        let _ = write!(stdout, "{} ", word);
        let _ = stdout.flush();
        tokio::time::sleep(delay).await;
    }

    let _ = writeln!(stdout);
}
