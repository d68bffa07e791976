use crate::adapters::http::DEFAULT_API_ENDPOINT;
use crate::config::toml_config::TomlConfig;
use crate::core::dispatcher::DEFAULT_MAX_IN_FLIGHT;
use crate::core::governor::{RateLimitConfig, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW};
use crate::domain::ports::{ConfigProvider, CredentialProvider, InputFileProvider};
use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_readable_file,
    validate_required_field, validate_url, Validate,
};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// 合併預設值、設定檔與命令列之後的最終設定
#[derive(Clone)]
pub struct Settings {
    pub api_endpoint: String,
    pub api_key: Option<String>,
    pub input: Option<PathBuf>,
    /// 0 表示不設定逾時
    pub timeout_seconds: u64,
    pub max_requests: u32,
    pub window_seconds: u64,
    pub max_in_flight: usize,
    pub preserve_input_order: bool,
    pub output_path: String,
    pub artifact_dir: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            api_key: None,
            input: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_requests: DEFAULT_MAX_REQUESTS,
            window_seconds: DEFAULT_WINDOW.as_secs(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            preserve_input_order: true,
            output_path: ".".to_string(),
            artifact_dir: None,
        }
    }
}

// API 金鑰不可出現在日誌中
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_endpoint", &self.api_endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("input", &self.input)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_requests", &self.max_requests)
            .field("window_seconds", &self.window_seconds)
            .field("max_in_flight", &self.max_in_flight)
            .field("preserve_input_order", &self.preserve_input_order)
            .field("output_path", &self.output_path)
            .field("artifact_dir", &self.artifact_dir)
            .finish()
    }
}

impl Settings {
    /// Overlays every value the file sets on top of `self`.
    pub fn merge_toml(mut self, file: &TomlConfig) -> Self {
        if let Some(endpoint) = &file.api.endpoint {
            self.api_endpoint = endpoint.clone();
        }
        if let Some(api_key) = &file.api.api_key {
            self.api_key = Some(api_key.clone());
        }
        if let Some(timeout) = file.api.timeout_seconds {
            self.timeout_seconds = timeout;
        }
        if let Some(max_requests) = file.rate_limit.max_requests {
            self.max_requests = max_requests;
        }
        if let Some(window) = file.rate_limit.window_seconds {
            self.window_seconds = window;
        }
        if let Some(max_in_flight) = file.dispatch.max_in_flight {
            self.max_in_flight = max_in_flight;
        }
        if let Some(preserve) = file.dispatch.preserve_input_order {
            self.preserve_input_order = preserve;
        }
        if let Some(path) = &file.output.path {
            self.output_path = path.clone();
        }
        if let Some(dir) = &file.output.artifact_dir {
            self.artifact_dir = Some(dir.clone());
        }
        self
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::new(self.max_requests_per_window(), self.window())
    }
}

impl ConfigProvider for Settings {
    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn artifact_dir(&self) -> Option<&str> {
        self.artifact_dir.as_deref()
    }

    fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    fn preserve_input_order(&self) -> bool {
        self.preserve_input_order
    }

    fn max_requests_per_window(&self) -> u32 {
        self.max_requests
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    fn request_timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}

impl CredentialProvider for Settings {
    fn api_key(&self) -> Result<String> {
        let key = validate_required_field("api_key", &self.api_key)?;
        // 設定檔中未替換的 ${VAR} 視同沒有提供
        if key.trim().is_empty() || key.contains("${") {
            return Err(EnrichError::MissingConfigError {
                field: "api_key".to_string(),
            });
        }
        Ok(key.clone())
    }
}

impl InputFileProvider for Settings {
    fn input_file(&self) -> Result<PathBuf> {
        let input = validate_required_field("input", &self.input)?;
        validate_readable_file("input", input)?;
        Ok(std::path::absolute(input)?)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("api.endpoint", &self.api_endpoint)?;
        validate_path("output.path", &self.output_path)?;
        if let Some(dir) = &self.artifact_dir {
            validate_path("output.artifact_dir", dir)?;
        }
        validate_positive_number("rate_limit.max_requests", self.max_requests as usize, 1)?;
        validate_positive_number("rate_limit.window_seconds", self.window_seconds as usize, 1)?;
        validate_positive_number("dispatch.max_in_flight", self.max_in_flight, 1)?;
        if let Some(key) = &self.api_key {
            validate_non_empty_string("api_key", key)?;
        }
        Ok(())
    }
}
