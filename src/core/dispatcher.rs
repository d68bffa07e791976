use crate::domain::model::{EnrichmentOutcome, Identity, InputRecord};
use crate::domain::ports::{EnrichmentClient, ProgressSink};
use crate::utils::error::{EnrichError, Result};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// 將所有記錄分類後並行送出，結果依完成順序收集
pub struct BatchDispatcher<E: EnrichmentClient> {
    client: Arc<E>,
    max_in_flight: usize,
}

impl<E: EnrichmentClient> BatchDispatcher<E> {
    pub fn new(client: Arc<E>, max_in_flight: usize) -> Self {
        Self {
            client,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Produces exactly one outcome per record, in completion order.
    ///
    /// Records without email, first name or last name fail immediately and
    /// never reach the client. The remaining calls run concurrently, at most
    /// `max_in_flight` at a time; the client's governor does the rate limiting.
    pub async fn dispatch_all(
        &self,
        records: &[InputRecord],
        progress: &dyn ProgressSink,
    ) -> Result<Vec<EnrichmentOutcome>> {
        let mut outcomes = Vec::with_capacity(records.len());
        let mut eligible = Vec::new();

        for (row, record) in records.iter().enumerate() {
            if !record.is_identifiable() {
                tracing::debug!("Row {} skipped: no email, first name or last name", row);
                outcomes.push(EnrichmentOutcome::missing_identity(row, record.clone()));
                progress.advance();
                continue;
            }

            match Identity::select(record) {
                Some(identity) => eligible.push((row, record.clone(), identity)),
                None => tracing::error!("Row {} is identifiable but selected no identity", row),
            }
        }

        tracing::info!(
            "📡 Dispatching {} enrichment requests ({} skipped, max {} in flight)",
            eligible.len(),
            outcomes.len(),
            self.max_in_flight
        );

        let client = &self.client;
        let mut in_flight = stream::iter(eligible)
            .map(|(row, record, identity)| async move {
                match client.enrich(&identity).await {
                    Ok(payload) => {
                        tracing::debug!("✅ Row {} enriched ({})", row, identity);
                        EnrichmentOutcome::Success { row, payload }
                    }
                    Err(e) => {
                        tracing::warn!("❌ Row {} failed ({}): {}", row, identity, e);
                        EnrichmentOutcome::Failure {
                            row,
                            reason: e.to_string(),
                            record,
                        }
                    }
                }
            })
            .buffer_unordered(self.max_in_flight);

        while let Some(outcome) = in_flight.next().await {
            outcomes.push(outcome);
            progress.advance();
        }

        if outcomes.len() != records.len() {
            return Err(EnrichError::ProcessingError {
                message: format!(
                    "Dispatch produced {} outcomes for {} input records",
                    outcomes.len(),
                    records.len()
                ),
            });
        }

        Ok(outcomes)
    }
}
