//! Scripted provider for testing.

use super::{ProviderError, UploadedFile, WorkflowProvider, WorkflowRun};
use crate::models::SubmissionRequest;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Canned outcome for one provider step.
#[derive(Debug, Clone)]
pub enum MockOutcome<T> {
    Respond(T),
    Fail { status: u16, body: serde_json::Value },
}

/// Mock workflow provider that answers with scripted outcomes and counts calls.
pub struct MockWorkflowProvider {
    configured: bool,
    upload: MockOutcome<String>,
    workflow: MockOutcome<serde_json::Value>,
    upload_calls: AtomicUsize,
    workflow_calls: AtomicUsize,
    last_run: Mutex<Option<WorkflowRun>>,
}

impl MockWorkflowProvider {
    /// A configured provider whose upload returns `file-1` and whose workflow
    /// returns `workflow_body`.
    pub fn new(workflow_body: serde_json::Value) -> Self {
        Self {
            configured: true,
            upload: MockOutcome::Respond("file-1".to_string()),
            workflow: MockOutcome::Respond(workflow_body),
            upload_calls: AtomicUsize::new(0),
            workflow_calls: AtomicUsize::new(0),
            last_run: Mutex::new(None),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new(serde_json::Value::Null)
        }
    }

    pub fn with_upload(mut self, outcome: MockOutcome<String>) -> Self {
        self.upload = outcome;
        self
    }

    pub fn with_workflow(mut self, outcome: MockOutcome<serde_json::Value>) -> Self {
        self.workflow = outcome;
        self
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn workflow_calls(&self) -> usize {
        self.workflow_calls.load(Ordering::SeqCst)
    }

    pub fn last_run(&self) -> Option<WorkflowRun> {
        self.last_run.lock().ok().and_then(|run| run.clone())
    }
}

#[async_trait]
impl WorkflowProvider for MockWorkflowProvider {
    fn ensure_configured(&self) -> Result<(), ProviderError> {
        if self.configured {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock provider not configured".to_string(),
            ))
        }
    }

    async fn upload_file(&self, request: &SubmissionRequest) -> Result<UploadedFile, ProviderError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        match &self.upload {
            MockOutcome::Respond(id) => Ok(UploadedFile {
                id: id.clone(),
                name: Some(request.filename.clone()),
                size: Some(request.image.len() as u64),
                mime_type: Some(request.content_type.clone()),
            }),
            MockOutcome::Fail { status, body } => Err(ProviderError::Upstream {
                status: *status,
                body: body.clone(),
            }),
        }
    }

    async fn run_workflow(&self, run: &WorkflowRun) -> Result<serde_json::Value, ProviderError> {
        self.workflow_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_run.lock() {
            *last = Some(run.clone());
        }

        match &self.workflow {
            MockOutcome::Respond(body) => Ok(body.clone()),
            MockOutcome::Fail { status, body } => Err(ProviderError::Upstream {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}
