//! Turns a workflow response into activity records.
//!
//! The workflow's `data.outputs.result` is either a JSON array or a string
//! holding one. Both forms yield the same records. Each record is forwarded
//! as the provider wrote it, with `isFavorited` set to `false`.

use crate::models::ActivityRecord;
use serde_json::Value;
use std::borrow::Cow;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Unexpected response format from Dify API")]
    MissingResult { workflow_error: Option<String> },

    #[error("Dify API result is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Dify API did not return an array of activities")]
    NotAnArray,

    #[error("Activity {index} is malformed: {reason}")]
    InvalidActivity { index: usize, reason: String },
}

/// Extract the activity list from a blocking workflow response and mark every
/// record as not favorited. A non-object element fails the whole list.
pub fn activities_from_workflow(body: &Value) -> Result<Vec<ActivityRecord>, NormalizeError> {
    let result = body
        .pointer("/data/outputs/result")
        .filter(|value| is_present(value))
        .ok_or_else(|| NormalizeError::MissingResult {
            workflow_error: body
                .pointer("/data/error")
                .and_then(Value::as_str)
                .map(str::to_string),
        })?;

    let parsed: Cow<'_, Value> = match result {
        Value::String(raw) => Cow::Owned(
            serde_json::from_str(raw).map_err(|e| NormalizeError::InvalidJson(e.to_string()))?,
        ),
        other => Cow::Borrowed(other),
    };

    let records = parsed.as_array().ok_or(NormalizeError::NotAnArray)?;

    records
        .iter()
        .enumerate()
        .map(|(index, record)| match record {
            Value::Object(fields) => {
                let mut activity = fields.clone();
                activity.insert("isFavorited".to_string(), Value::Bool(false));
                Ok(activity)
            }
            other => Err(NormalizeError::InvalidActivity {
                index,
                reason: format!("expected an object, got {}", other),
            }),
        })
        .collect()
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}
