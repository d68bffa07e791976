pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::{
    http::HttpEnrichmentClient,
    progress::{LogProgress, NoProgress},
    storage::LocalStorage,
};
pub use crate::config::Settings;
pub use crate::core::{
    dispatcher::BatchDispatcher,
    etl::EnrichmentEngine,
    governor::{RateGovernor, RateLimitConfig},
    pipeline::EnrichmentPipeline,
};
pub use crate::utils::error::{EnrichError, Result};
