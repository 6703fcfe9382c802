//! Workflow provider abstractions and implementations.
//!
//! The relay talks to the provider through [`WorkflowProvider`], so the Dify
//! client can be swapped for the scripted mock in tests.

pub mod dify;
pub mod mock;

use crate::models::SubmissionRequest;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// The provider answered with a non-success status. `body` is the
    /// response body, parsed as JSON when possible.
    #[error("Provider returned {status}: {body}")]
    Upstream { status: u16, body: serde_json::Value },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// File handle returned by the provider's upload endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Inputs for one blocking workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    pub upload_file_id: String,
    pub age_months: u32,
}

/// Trait for workflow execution providers (e.g., Dify).
#[async_trait]
pub trait WorkflowProvider: Send + Sync {
    /// Fails when credentials or the base URL are missing.
    fn ensure_configured(&self) -> Result<(), ProviderError>;

    /// Upload the image and return the provider's file handle.
    async fn upload_file(&self, request: &SubmissionRequest) -> Result<UploadedFile, ProviderError>;

    /// Run the workflow in blocking mode and return the raw response body.
    async fn run_workflow(&self, run: &WorkflowRun) -> Result<serde_json::Value, ProviderError>;
}

/// Parse an error body as JSON, falling back to the raw text.
pub(crate) fn body_to_value(text: String) -> serde_json::Value {
    serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
}
