#![allow(dead_code)]

use relay_service::config::{CorsConfig, DifyConfig, RelayConfig};
use relay_service::services::providers::WorkflowProvider;
use relay_service::startup::Application;
use secrecy::Secret;
use service_core::config::Config;
use std::sync::Arc;

pub fn test_config(dify: DifyConfig) -> RelayConfig {
    RelayConfig {
        common: Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            log_level: "debug".to_string(),
        },
        dify,
        cors: CorsConfig {
            allowed_origin: "http://localhost:5174".to_string(),
        },
        max_upload_bytes: 10 * 1024 * 1024,
        otlp_endpoint: None,
    }
}

pub fn dify_config(base_url: &str) -> DifyConfig {
    DifyConfig {
        base_url: Some(base_url.to_string()),
        api_key: Some(Secret::new("test-api-key".to_string())),
        ..Default::default()
    }
}

/// Spawn the relay with `provider` on a random port and return the port.
pub async fn spawn_with_provider(provider: Arc<dyn WorkflowProvider>) -> u16 {
    let app = Application::build_with_provider(test_config(DifyConfig::default()), provider)
        .await
        .expect("Failed to build application");
    let port = app.port();
    tokio::spawn(app.run_until_stopped());
    port
}

/// Spawn the relay with the real Dify provider built from `dify`.
pub async fn spawn_with_dify(dify: DifyConfig) -> u16 {
    let app = Application::build(test_config(dify))
        .await
        .expect("Failed to build application");
    let port = app.port();
    tokio::spawn(app.run_until_stopped());
    port
}

pub fn ideas_form(image: Option<&[u8]>, age: Option<&str>) -> reqwest::multipart::Form {
    let mut form = reqwest::multipart::Form::new();
    if let Some(age) = age {
        form = form.text("age", age.to_string());
    }
    if let Some(image) = image {
        form = form.part(
            "image",
            reqwest::multipart::Part::bytes(image.to_vec())
                .file_name("toy.jpg")
                .mime_str("image/jpeg")
                .unwrap(),
        );
    }
    form
}

pub const JPEG_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0fake-jpeg-body";
