use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

/// 單筆請求的失敗原因，會寫入該列的 status 欄位，不會中斷整批處理
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Failed with status code {code}")]
    Status { code: u16 },

    #[error("{}", describe_transport(.0))]
    Transport(reqwest::Error),
}

impl From<reqwest::Error> for RequestError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest 的錯誤訊息會帶完整網址，其中包含 apikey
        RequestError::Transport(e.without_url())
    }
}

fn describe_transport(e: &reqwest::Error) -> String {
    let mut message = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Io,
    Configuration,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EnrichError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EnrichError::HttpError(_) => ErrorCategory::Network,
            EnrichError::CsvError(_) | EnrichError::SerializationError(_) => ErrorCategory::Data,
            EnrichError::IoError(_) => ErrorCategory::Io,
            EnrichError::ConfigError { .. }
            | EnrichError::MissingConfigError { .. }
            | EnrichError::InvalidConfigValueError { .. }
            | EnrichError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EnrichError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EnrichError::HttpError(_) => "Check network connectivity and the API endpoint",
            EnrichError::CsvError(_) => {
                "Make sure the input file is a CSV/TSV file with a header row"
            }
            EnrichError::IoError(_) => "Check that the paths exist and are readable/writable",
            EnrichError::SerializationError(_) => "The data could not be serialized as JSON",
            EnrichError::MissingConfigError { field } if field == "api_key" => {
                "Pass --api-key or set CONTACT_ENRICH_API_KEY"
            }
            EnrichError::MissingConfigError { field } if field == "input" => {
                "Pass the path of the contact file to enrich"
            }
            EnrichError::ConfigError { .. }
            | EnrichError::MissingConfigError { .. }
            | EnrichError::InvalidConfigValueError { .. }
            | EnrichError::ConfigValidationError { .. } => {
                "Review the command line flags and the configuration file"
            }
            EnrichError::ProcessingError { .. } => {
                "Re-run with --verbose and inspect the intermediate JSON artifact"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EnrichError::MissingConfigError { field } => {
                format!("Required setting '{}' was not provided", field)
            }
            EnrichError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EnrichError>;
