use async_trait::async_trait;
use contact_enrich::core::EnrichmentClient;
use contact_enrich::domain::model::{Identity, InputRecord};
use contact_enrich::utils::error::RequestError;
use contact_enrich::{BatchDispatcher, NoProgress, RateGovernor, RateLimitConfig};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Goes through the governor like the HTTP client and notes when each call was admitted.
struct GovernedStub {
    governor: Arc<RateGovernor>,
    admitted_at: Mutex<Vec<Instant>>,
}

#[async_trait]
impl EnrichmentClient for GovernedStub {
    async fn enrich(&self, _identity: &Identity) -> Result<Map<String, Value>, RequestError> {
        self.governor.admit().await;
        self.admitted_at.lock().unwrap().push(Instant::now());
        Ok(Map::new())
    }
}

fn email_records(count: usize) -> Vec<InputRecord> {
    (0..count)
        .map(|i| InputRecord {
            email: Some(format!("user{}@example.com", i)),
            ..InputRecord::default()
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_501st_call_waits_for_next_window() {
    let governor = Arc::new(RateGovernor::new(RateLimitConfig::default()));
    let window_start = Instant::now();
    let client = Arc::new(GovernedStub {
        governor,
        admitted_at: Mutex::new(Vec::new()),
    });
    let dispatcher = BatchDispatcher::new(Arc::clone(&client), 64);

    let outcomes = dispatcher
        .dispatch_all(&email_records(501), &NoProgress)
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 501);

    let mut admitted: Vec<Duration> = client
        .admitted_at
        .lock()
        .unwrap()
        .iter()
        .map(|t| t.duration_since(window_start))
        .collect();
    admitted.sort();

    assert_eq!(admitted.len(), 501);
    assert!(admitted[499] < Duration::from_secs(60));
    assert!(admitted[500] >= Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_small_window_spreads_calls_across_windows() {
    let governor = Arc::new(RateGovernor::new(RateLimitConfig::new(
        2,
        Duration::from_secs(10),
    )));
    let start = Instant::now();
    let client = Arc::new(GovernedStub {
        governor,
        admitted_at: Mutex::new(Vec::new()),
    });
    let dispatcher = BatchDispatcher::new(Arc::clone(&client), 8);

    dispatcher
        .dispatch_all(&email_records(5), &NoProgress)
        .await
        .unwrap();

    let mut windows: Vec<u64> = client
        .admitted_at
        .lock()
        .unwrap()
        .iter()
        .map(|t| t.duration_since(start).as_secs() / 10)
        .collect();
    windows.sort();

    assert_eq!(windows, vec![0, 0, 1, 1, 2]);
}
