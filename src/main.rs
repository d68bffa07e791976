use anyhow::Context;
use clap::Parser;
use contact_enrich::domain::ports::{ConfigProvider, CredentialProvider, InputFileProvider};
use contact_enrich::utils::error::{EnrichError, ErrorSeverity};
use contact_enrich::utils::{logger, validation::Validate};
use contact_enrich::{
    BatchDispatcher, CliConfig, EnrichmentEngine, EnrichmentPipeline, HttpEnrichmentClient,
    LocalStorage, LogProgress, RateGovernor,
};
use std::sync::Arc;

fn exit_with(e: &EnrichError) -> ! {
    tracing::error!(
        "❌ Enrichment failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting contact-enrich");

    let settings = cli.resolve().unwrap_or_else(|e| exit_with(&e));
    tracing::debug!("Resolved settings: {:?}", settings);

    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    // 金鑰或輸入檔取得失敗時，不啟動任何後續步驟
    let api_key = settings.api_key().unwrap_or_else(|e| exit_with(&e));
    let input_path = settings.input_file().unwrap_or_else(|e| exit_with(&e));

    let governor = Arc::new(RateGovernor::new(settings.rate_limit()));
    let client = HttpEnrichmentClient::new(
        settings.api_endpoint(),
        api_key,
        governor,
        settings.request_timeout(),
    )
    .context("Failed to build the HTTP client")?;

    let dispatcher = BatchDispatcher::new(Arc::new(client), settings.max_in_flight());
    let storage = LocalStorage::new(settings.output_path().to_string());
    let monitor_enabled = cli.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = EnrichmentPipeline::new(
        storage,
        settings,
        dispatcher,
        Box::new(LogProgress::default()),
        input_path,
    );
    let engine = EnrichmentEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Enrichment completed successfully!");
            println!("✅ Enriched data saved to {}", output_path);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}
