//! HTTP client for the relay's `POST /generate-ideas`.

use crate::error::SubmissionError;
use crate::photo::ImagePayload;
use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde_json::Value;
use service_core::models::ActivitySpec;

/// Anything that can turn a photo and an age into activities.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(
        &self,
        image: &ImagePayload,
        age_months: u32,
    ) -> Result<Vec<ActivitySpec>, SubmissionError>;
}

/// Sends one request per call to the relay; never retries.
#[derive(Clone)]
pub struct SubmissionClient {
    http: Client,
    endpoint: String,
}

impl SubmissionClient {
    /// `relay_url` is the relay's base URL, e.g. `http://localhost:3001`.
    pub fn new(relay_url: &str) -> Result<Self, SubmissionError> {
        let http = Client::builder()
            .build()
            .map_err(|e| SubmissionError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/generate-ideas", relay_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Submitter for SubmissionClient {
    async fn submit(
        &self,
        image: &ImagePayload,
        age_months: u32,
    ) -> Result<Vec<ActivitySpec>, SubmissionError> {
        image.validate()?;

        let part = multipart::Part::bytes(image.bytes.clone())
            .file_name(image.filename.clone())
            .mime_str(&image.content_type)
            .map_err(|e| SubmissionError::InvalidImage(format!("Invalid image type: {}", e)))?;
        let form = multipart::Form::new()
            .part("image", part)
            .text("age", age_months.to_string());

        tracing::debug!(
            endpoint = %self.endpoint,
            age_months,
            size = image.bytes.len(),
            "Submitting image to relay"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;
        let body: Option<Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let message = relay_error_message(body.as_ref())
                .unwrap_or_else(|| format!("Relay request failed: {}", status.as_u16()));
            tracing::error!(status = status.as_u16(), message = %message, "Relay returned an error");
            return Err(SubmissionError::Relay {
                status: status.as_u16(),
                message,
            });
        }

        let activities = body
            .as_ref()
            .and_then(|b| b.get("activities"))
            .filter(|a| a.is_array())
            .ok_or_else(|| {
                SubmissionError::MalformedResponse(
                    "Invalid response format: activities array not found".to_string(),
                )
            })?;

        serde_json::from_value(activities.clone()).map_err(|e| {
            SubmissionError::MalformedResponse(format!("Invalid activity in response: {}", e))
        })
    }
}

/// Pick the most specific message from a relay error body: `details.message`,
/// then `details` when it is a string, then `error`.
pub fn relay_error_message(body: Option<&Value>) -> Option<String> {
    let body = body?;
    let details = body.get("details");

    details
        .and_then(|d| d.get("message"))
        .and_then(Value::as_str)
        .or_else(|| details.and_then(Value::as_str))
        .or_else(|| body.get("error").and_then(Value::as_str))
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
