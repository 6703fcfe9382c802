use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Default user identifier sent to Dify with every call.
pub const DEFAULT_DIFY_USER: &str = "my-app-user-123";

/// Largest image accepted on the upload route (10 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Room for multipart boundaries, part headers and the `age` field on top of
/// the image itself.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub common: core_config::Config,
    pub dify: DifyConfig,
    pub cors: CorsConfig,
    /// Largest image accepted; the request body may exceed it by
    /// [`MULTIPART_OVERHEAD_BYTES`].
    pub max_upload_bytes: usize,
    pub otlp_endpoint: Option<String>,
}

/// Provider settings. Base URL and API key may be absent at startup; the
/// relay refuses image requests until both are set.
#[derive(Debug, Clone)]
pub struct DifyConfig {
    pub base_url: Option<String>,
    pub api_key: Option<Secret<String>>,
    pub user: String,
    /// No timeout beyond the transport default when unset.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origin: String,
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let max_upload_bytes = match optional_env("MAX_UPLOAD_BYTES") {
            Some(raw) => raw.parse().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("MAX_UPLOAD_BYTES is invalid: {}", e))
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let timeout_secs = optional_env("PROVIDER_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>().map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!(
                        "PROVIDER_TIMEOUT_SECS is invalid: {}",
                        e
                    ))
                })
            })
            .transpose()?;

        Ok(RelayConfig {
            common,
            dify: DifyConfig {
                base_url: optional_env("DIFY_API_BASE_URL"),
                api_key: optional_env("DIFY_API_KEY").map(Secret::new),
                user: optional_env("DIFY_USER").unwrap_or_else(|| DEFAULT_DIFY_USER.to_string()),
                timeout_secs,
            },
            cors: CorsConfig {
                allowed_origin: optional_env("CORS_ALLOWED_ORIGIN")
                    .unwrap_or_else(|| "http://localhost:5174".to_string()),
            },
            max_upload_bytes,
            otlp_endpoint: optional_env("OTLP_ENDPOINT"),
        })
    }
}

impl RelayConfig {
    /// Cap applied to the whole request body.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)
    }
}

impl DifyConfig {
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.api_key.is_some()
    }
}

impl Default for DifyConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            user: DEFAULT_DIFY_USER.to_string(),
            timeout_secs: None,
        }
    }
}

/// Blank values count as unset.
fn optional_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
