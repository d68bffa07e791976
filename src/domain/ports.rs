use crate::domain::model::{Identity, InputRecord, TransformResult};
use crate::utils::error::{RequestError, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn output_path(&self) -> &str;
    fn artifact_dir(&self) -> Option<&str>;
    fn max_in_flight(&self) -> usize;
    fn preserve_input_order(&self) -> bool;
    fn max_requests_per_window(&self) -> u32;
    fn window(&self) -> Duration;
    fn request_timeout(&self) -> Option<Duration>;
}

/// 提供 API 金鑰；取不到時整個流程在開始前就結束
pub trait CredentialProvider {
    fn api_key(&self) -> Result<String>;
}

/// 提供要處理的輸入檔路徑
pub trait InputFileProvider {
    fn input_file(&self) -> Result<PathBuf>;
}

pub trait ProgressSink: Send + Sync {
    fn start(&self, _total: usize) {}
    fn advance(&self);
    fn finish(&self) {}
}

/// One enrichment request per identity. Failures are values, not errors of the run.
#[async_trait]
pub trait EnrichmentClient: Send + Sync {
    async fn enrich(
        &self,
        identity: &Identity,
    ) -> std::result::Result<Map<String, Value>, RequestError>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<InputRecord>>;
    async fn transform(&self, records: Vec<InputRecord>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
