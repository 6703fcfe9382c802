use crate::models::{ActivityRecord, SubmissionRequest};
use crate::services::normalize::{activities_from_workflow, NormalizeError};
use crate::services::providers::{ProviderError, WorkflowProvider, WorkflowRun};
use axum::http::StatusCode;
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;

/// Message returned to clients for every failure past input validation.
pub const GENERATION_FAILED: &str = "Failed to generate activities";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Runs upload then workflow then normalization, stopping at the first
/// failure. Holds no state between calls.
#[derive(Clone)]
pub struct ActivityRelay {
    provider: Arc<dyn WorkflowProvider>,
}

impl ActivityRelay {
    pub fn new(provider: Arc<dyn WorkflowProvider>) -> Self {
        Self { provider }
    }

    pub async fn generate(
        &self,
        request: &SubmissionRequest,
    ) -> Result<Vec<ActivityRecord>, RelayError> {
        self.provider.ensure_configured()?;

        let uploaded = self.provider.upload_file(request).await?;
        tracing::info!(
            upload_file_id = %uploaded.id,
            stored_name = uploaded.name.as_deref().unwrap_or(&request.filename),
            stored_size = uploaded.size,
            stored_mime_type = uploaded.mime_type.as_deref(),
            "Image uploaded to provider"
        );

        let run = WorkflowRun {
            upload_file_id: uploaded.id,
            age_months: request.age_months,
        };
        let body = self.provider.run_workflow(&run).await?;

        let activities = activities_from_workflow(&body)?;
        tracing::info!(
            count = activities.len(),
            age_months = request.age_months,
            "Activities generated"
        );

        Ok(activities)
    }
}

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Provider(ProviderError::NotConfigured(msg)) => {
                AppError::ConfigError(anyhow::anyhow!(msg))
            }
            RelayError::Provider(ProviderError::Upstream { status, body }) => AppError::Upstream {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                message: GENERATION_FAILED.to_string(),
                details: body,
            },
            RelayError::Provider(
                e @ (ProviderError::NetworkError(_) | ProviderError::InvalidResponse(_)),
            ) => AppError::Upstream {
                status: StatusCode::BAD_GATEWAY,
                message: GENERATION_FAILED.to_string(),
                details: serde_json::Value::String(e.to_string()),
            },
            RelayError::Provider(e @ ProviderError::InvalidRequest(_)) => {
                AppError::BadRequest(anyhow::anyhow!(e))
            }
            RelayError::Normalize(e) => {
                let details = match &e {
                    NormalizeError::MissingResult {
                        workflow_error: Some(workflow_error),
                    } => format!("{}: {}", e, workflow_error),
                    _ => e.to_string(),
                };
                AppError::MalformedResponse {
                    message: GENERATION_FAILED.to_string(),
                    details: serde_json::Value::String(details),
                }
            }
        }
    }
}
