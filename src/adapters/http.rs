use crate::core::governor::RateGovernor;
use crate::domain::model::Identity;
use crate::domain::ports::EnrichmentClient;
use crate::utils::error::{RequestError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_API_ENDPOINT: &str = "https://api.scrapin.io/enrichment";

/// 透過 HTTP GET 呼叫 enrichment API，每次送出前都先經過限流器
pub struct HttpEnrichmentClient {
    client: Client,
    endpoint: String,
    api_key: String,
    governor: Arc<RateGovernor>,
}

impl HttpEnrichmentClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        governor: Arc<RateGovernor>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            governor,
        })
    }
}

/// 回應若不是 JSON 物件，包成 `{"response": ...}`
fn into_payload(body: Value) -> Map<String, Value> {
    match body {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("response".to_string(), other);
            map
        }
    }
}

#[async_trait]
impl EnrichmentClient for HttpEnrichmentClient {
    async fn enrich(
        &self,
        identity: &Identity,
    ) -> std::result::Result<Map<String, Value>, RequestError> {
        self.governor.admit().await;

        let mut params = vec![("apikey", self.api_key.as_str())];
        params.extend(identity.query_params());

        tracing::debug!("Sending enrichment request for {}", identity);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Response status for {}: {}", identity, status);

        if status != StatusCode::OK {
            return Err(RequestError::Status {
                code: status.as_u16(),
            });
        }

        let body: Value = response.json().await?;
        Ok(into_payload(body))
    }
}
