//! Dify workflow provider.
//!
//! Uploads the toy image through `/v1/files/upload`, then runs the workflow
//! through `/v1/workflows/run` in blocking mode. Both calls use bearer auth.

use super::{body_to_value, ProviderError, UploadedFile, WorkflowProvider, WorkflowRun};
use crate::config::DifyConfig;
use crate::models::SubmissionRequest;
use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;

/// Dify provider.
pub struct DifyProvider {
    client: Client,
    api_base: Option<String>,
    api_key: Option<Secret<String>>,
    user: String,
}

#[derive(Debug, Serialize)]
struct WorkflowRunRequest<'a> {
    inputs: WorkflowInputs<'a>,
    response_mode: &'static str,
    user: &'a str,
}

#[derive(Debug, Serialize)]
struct WorkflowInputs<'a> {
    age: String,
    toyimage: Vec<FileInput<'a>>,
}

#[derive(Debug, Serialize)]
struct FileInput<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    transfer_method: &'static str,
    upload_file_id: &'a str,
}

impl DifyProvider {
    pub fn new(config: &DifyConfig) -> Result<Self, ProviderError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ProviderError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.base_url.as_deref().map(normalize_base_url),
            api_key: config.api_key.clone(),
            user: config.user.clone(),
        })
    }

    fn api_url(&self, path: &str) -> Result<String, ProviderError> {
        let base = self.api_base.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured("DIFY_API_BASE_URL is not set".to_string())
        })?;
        Ok(format!("{}{}", base, path))
    }

    fn bearer(&self) -> Result<String, ProviderError> {
        let key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ProviderError::NotConfigured("DIFY_API_KEY is not set".to_string()))?;
        Ok(format!("Bearer {}", key.expose_secret()))
    }

    /// Turn a non-success response into [`ProviderError::Upstream`].
    async fn check_status(response: Response) -> Result<Response, ProviderError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        Err(ProviderError::Upstream {
            status,
            body: body_to_value(text),
        })
    }
}

/// Accepts `api.dify.ai`, `https://api.dify.ai/` or `https://api.dify.ai/v1`
/// and yields `https://api.dify.ai/v1`.
pub fn normalize_base_url(raw: &str) -> String {
    let mut url = raw.trim().trim_end_matches('/').to_string();
    if !url.starts_with("http") {
        url = format!("https://{}", url);
    }
    if !url.ends_with("/v1") {
        url.push_str("/v1");
    }
    url
}

#[async_trait]
impl WorkflowProvider for DifyProvider {
    fn ensure_configured(&self) -> Result<(), ProviderError> {
        if self.api_base.is_none() || self.api_key.is_none() {
            return Err(ProviderError::NotConfigured(
                "Missing Dify API configuration".to_string(),
            ));
        }
        Ok(())
    }

    async fn upload_file(&self, request: &SubmissionRequest) -> Result<UploadedFile, ProviderError> {
        let url = self.api_url("/files/upload")?;

        let part = multipart::Part::bytes(request.image.to_vec())
            .file_name(request.filename.clone())
            .mime_str(&request.content_type)
            .map_err(|e| {
                ProviderError::InvalidRequest(format!(
                    "Invalid image content type '{}': {}",
                    request.content_type, e
                ))
            })?;
        let form = multipart::Form::new()
            .text("user", self.user.clone())
            .part("file", part);

        tracing::debug!(
            filename = %request.filename,
            content_type = %request.content_type,
            size = request.image.len(),
            "Uploading image to Dify"
        );

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.bearer()?)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let response = Self::check_status(response).await?;

        response
            .json::<UploadedFile>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse upload response: {}", e)))
    }

    async fn run_workflow(&self, run: &WorkflowRun) -> Result<serde_json::Value, ProviderError> {
        let url = self.api_url("/workflows/run")?;

        let payload = WorkflowRunRequest {
            inputs: WorkflowInputs {
                age: run.age_months.to_string(),
                toyimage: vec![FileInput {
                    kind: "image",
                    transfer_method: "local_file",
                    upload_file_id: &run.upload_file_id,
                }],
            },
            response_mode: "blocking",
            user: &self.user,
        };

        tracing::debug!(
            upload_file_id = %run.upload_file_id,
            age_months = run.age_months,
            "Running Dify workflow"
        );

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.bearer()?)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let response = Self::check_status(response).await?;

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse workflow response: {}", e)))
    }
}
