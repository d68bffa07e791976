pub mod settings;
pub mod toml_config;

pub use settings::Settings;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

/// 命令列參數；未指定的值依序使用設定檔與預設值
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "contact-enrich")]
#[command(about = "Enrich a contact list through the enrichment API and write a flat CSV")]
pub struct CliConfig {
    /// CSV or TSV file with email, firstName, lastName and companyName columns
    pub input: Option<PathBuf>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long, env = "CONTACT_ENRICH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long)]
    pub api_endpoint: Option<String>,

    /// Directory for the `<name>_results.csv` file
    #[arg(long)]
    pub output_path: Option<String>,

    /// Directory for the intermediate JSON file (defaults to the system temp dir)
    #[arg(long)]
    pub artifact_dir: Option<String>,

    /// Maximum concurrent requests
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// Requests allowed per rate-limit window
    #[arg(long)]
    pub rate_limit: Option<u32>,

    #[arg(long)]
    pub window_seconds: Option<u64>,

    /// Per-request timeout, 0 disables it
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Write rows in the order requests completed instead of input order
    #[arg(long)]
    pub completion_order: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 預設值 < 設定檔 < 命令列
    pub fn resolve(&self) -> Result<Settings> {
        let mut settings = Settings::default();

        if let Some(path) = &self.config {
            tracing::info!("📁 Loading configuration from: {}", path.display());
            let file = toml_config::TomlConfig::from_file(path)?;
            settings = settings.merge_toml(&file);
        }

        if let Some(input) = &self.input {
            settings.input = Some(input.clone());
        }
        if let Some(api_key) = &self.api_key {
            settings.api_key = Some(api_key.clone());
        }
        if let Some(endpoint) = &self.api_endpoint {
            settings.api_endpoint = endpoint.clone();
        }
        if let Some(path) = &self.output_path {
            settings.output_path = path.clone();
        }
        if let Some(dir) = &self.artifact_dir {
            settings.artifact_dir = Some(dir.clone());
        }
        if let Some(max_in_flight) = self.max_in_flight {
            settings.max_in_flight = max_in_flight;
        }
        if let Some(rate_limit) = self.rate_limit {
            settings.max_requests = rate_limit;
        }
        if let Some(window) = self.window_seconds {
            settings.window_seconds = window;
        }
        if let Some(timeout) = self.timeout_seconds {
            settings.timeout_seconds = timeout;
        }
        if self.completion_order {
            settings.preserve_input_order = false;
        }

        Ok(settings)
    }
}
