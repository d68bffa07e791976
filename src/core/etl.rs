use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Runs a pipeline's extract → transform → load phases in order.
pub struct EnrichmentEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EnrichmentEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting enrichment run");
        self.monitor.log_stats("Start");

        let records = self.pipeline.extract().await?;
        self.monitor.log_stats("Extract");

        let result = self.pipeline.transform(records).await?;
        tracing::info!(
            "Enriched {} records, audit file: {}",
            result.outcomes.len(),
            result.artifact_path.display()
        );
        self.monitor.log_stats("Enrich");

        let output_path = self.pipeline.load(result).await?;
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
