use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    /// A dependency answered with a non-success status. Rendered with the
    /// dependency's own status code and body.
    #[error("Upstream error ({status}): {message}")]
    Upstream {
        status: StatusCode,
        message: String,
        details: serde_json::Value,
    },

    /// A dependency answered successfully but its body could not be used.
    /// Always a 500; `details` says what was wrong with the body.
    #[error("Unusable response: {message}")]
    MalformedResponse {
        message: String,
        details: serde_json::Value,
    },

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Upstream { status, .. } => *status,
            AppError::MalformedResponse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_message, details) = match self {
            AppError::BadRequest(err) => (err.to_string(), None),
            AppError::InternalError(err) => (
                "Internal server error".to_string(),
                Some(serde_json::Value::String(format!("{:#}", err))),
            ),
            AppError::PayloadTooLarge(msg) => (msg, None),
            AppError::BadGateway(msg) => (
                "Bad Gateway".to_string(),
                Some(serde_json::Value::String(msg)),
            ),
            AppError::Upstream {
                message, details, ..
            } => (message, Some(details)),
            AppError::MalformedResponse { message, details } => (message, Some(details)),
            AppError::ConfigError(err) => (
                "Configuration error".to_string(),
                Some(serde_json::Value::String(err.to_string())),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_bad_request_has_no_details() {
        let (status, body) =
            render(AppError::BadRequest(anyhow::anyhow!("Image file and age are required"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Image file and age are required");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_upstream_keeps_status_and_body() {
        let (status, body) = render(AppError::Upstream {
            status: StatusCode::UNAUTHORIZED,
            message: "Failed to generate activities".to_string(),
            details: serde_json::json!({ "code": "unauthorized", "message": "Invalid key" }),
        })
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Failed to generate activities");
        assert_eq!(body["details"]["message"], "Invalid key");
    }

    #[tokio::test]
    async fn test_config_error_is_server_error() {
        let (status, body) =
            render(AppError::ConfigError(anyhow::anyhow!("DIFY_API_KEY is not set"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Configuration error");
        assert_eq!(body["details"], "DIFY_API_KEY is not set");
    }

    #[tokio::test]
    async fn test_malformed_response_is_server_error_with_details() {
        let (status, body) = render(AppError::MalformedResponse {
            message: "Failed to generate activities".to_string(),
            details: serde_json::json!("Dify API did not return an array of activities"),
        })
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to generate activities");
        assert_eq!(body["details"], "Dify API did not return an array of activities");
    }

    #[tokio::test]
    async fn test_payload_too_large() {
        let (status, body) =
            render(AppError::PayloadTooLarge("Image exceeds 10485760 bytes".to_string())).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "Image exceeds 10485760 bytes");
    }
}
