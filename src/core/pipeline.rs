use crate::core::dispatcher::BatchDispatcher;
use crate::core::flatten::{flatten, to_csv};
use crate::core::input::{delimiter_for, read_records};
use crate::domain::model::{EnrichmentOutcome, InputRecord, TransformResult};
use crate::domain::ports::{ConfigProvider, EnrichmentClient, Pipeline, ProgressSink, Storage};
use crate::utils::error::{EnrichError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// `<base>_results.csv`，base 為檔名第一個 `.` 之前的部分
pub fn output_file_name(input: &Path) -> String {
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let base = file_name.split('.').next().unwrap_or_default();
    format!("{}_results.csv", base)
}

/// 讀取聯絡人檔案、呼叫 API、攤平結果並寫出 CSV
pub struct EnrichmentPipeline<S: Storage, C: ConfigProvider, E: EnrichmentClient> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) dispatcher: BatchDispatcher<E>,
    pub(crate) progress: Box<dyn ProgressSink>,
    pub(crate) input_path: PathBuf,
}

impl<S: Storage, C: ConfigProvider, E: EnrichmentClient> EnrichmentPipeline<S, C, E> {
    pub fn new(
        storage: S,
        config: C,
        dispatcher: BatchDispatcher<E>,
        progress: Box<dyn ProgressSink>,
        input_path: PathBuf,
    ) -> Self {
        Self {
            storage,
            config,
            dispatcher,
            progress,
            input_path,
        }
    }

    /// 中繼結果寫到暫存檔並保留，只供稽核與除錯
    async fn write_artifact(&self, outcomes: &[EnrichmentOutcome]) -> Result<PathBuf> {
        let data = serde_json::to_vec_pretty(outcomes)?;
        let artifact_dir = self.config.artifact_dir().map(PathBuf::from);

        tokio::task::spawn_blocking(move || keep_artifact(artifact_dir, &data))
            .await
            .map_err(|e| EnrichError::ProcessingError {
                message: format!("Artifact writer task failed: {}", e),
            })?
    }
}

fn keep_artifact(artifact_dir: Option<PathBuf>, data: &[u8]) -> Result<PathBuf> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("contact-enrich-").suffix(".json");

    let mut file = match artifact_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            builder.tempfile_in(dir)?
        }
        None => builder.tempfile()?,
    };

    file.write_all(data)?;
    file.flush()?;

    let (_, path) = file.keep().map_err(|e| e.error)?;
    Ok(path)
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, E: EnrichmentClient> Pipeline
    for EnrichmentPipeline<S, C, E>
{
    async fn extract(&self) -> Result<Vec<InputRecord>> {
        tracing::info!("📂 Reading contacts from: {}", self.input_path.display());

        let data = self
            .storage
            .read_file(&self.input_path.to_string_lossy())
            .await?;
        let records = read_records(&data, delimiter_for(&self.input_path))?;

        tracing::info!("📊 Loaded {} records", records.len());
        Ok(records)
    }

    async fn transform(&self, records: Vec<InputRecord>) -> Result<TransformResult> {
        self.progress.start(records.len());
        let mut outcomes = self
            .dispatcher
            .dispatch_all(&records, self.progress.as_ref())
            .await?;
        self.progress.finish();

        let artifact_path = self.write_artifact(&outcomes).await?;
        tracing::info!("🗂️ Intermediate results saved to: {}", artifact_path.display());

        if self.config.preserve_input_order() {
            outcomes.sort_by_key(EnrichmentOutcome::row);
        }

        let table = flatten(&outcomes);
        if table.len() != records.len() {
            return Err(EnrichError::ProcessingError {
                message: format!(
                    "Output has {} rows for {} input records",
                    table.len(),
                    records.len()
                ),
            });
        }

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        tracing::info!(
            "🔧 Flattened {} rows into {} columns ({} succeeded, {} failed)",
            table.len(),
            table.columns.len(),
            succeeded,
            outcomes.len() - succeeded
        );

        Ok(TransformResult {
            outcomes,
            table,
            artifact_path,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let file_name = output_file_name(&self.input_path);
        let data = to_csv(&result.table)?;

        tracing::debug!("Writing {} bytes to {}", data.len(), file_name);
        let output_path = self.storage.write_file(&file_name, &data).await?;

        tracing::info!("💾 Enriched data saved to: {}", output_path);
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::progress::NoProgress;
    use crate::domain::model::Identity;
    use crate::utils::error::RequestError;
    use async_trait::async_trait;
    use serde_json::{json, Map, Value};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_file(path: &str, data: &[u8]) -> Self {
            let mut files = HashMap::new();
            files.insert(path.to_string(), data.to_vec());
            Self {
                files: Arc::new(Mutex::new(files)),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EnrichError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(format!("mock/{}", path))
        }
    }

    struct MockConfig {
        artifact_dir: String,
        preserve_input_order: bool,
    }

    impl ConfigProvider for MockConfig {
        fn api_endpoint(&self) -> &str {
            "http://test.invalid/enrichment"
        }

        fn output_path(&self) -> &str {
            "mock"
        }

        fn artifact_dir(&self) -> Option<&str> {
            Some(&self.artifact_dir)
        }

        fn max_in_flight(&self) -> usize {
            4
        }

        fn preserve_input_order(&self) -> bool {
            self.preserve_input_order
        }

        fn max_requests_per_window(&self) -> u32 {
            500
        }

        fn window(&self) -> Duration {
            Duration::from_secs(60)
        }

        fn request_timeout(&self) -> Option<Duration> {
            None
        }
    }

    /// Echoes the identity back; `first@b.com` answers last.
    struct EchoClient;

    #[async_trait]
    impl EnrichmentClient for EchoClient {
        async fn enrich(
            &self,
            identity: &Identity,
        ) -> std::result::Result<Map<String, Value>, RequestError> {
            let delay = match identity.to_string().as_str() {
                "first@b.com" => 30,
                _ => 1,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;

            let mut payload = Map::new();
            payload.insert("person".to_string(), json!({"query": identity.to_string()}));
            Ok(payload)
        }
    }

    fn pipeline(
        input: &[u8],
        artifact_dir: &Path,
        preserve_input_order: bool,
    ) -> (EnrichmentPipeline<MockStorage, MockConfig, EchoClient>, MockStorage) {
        let storage = MockStorage::with_file("contacts.v2.csv", input);
        let config = MockConfig {
            artifact_dir: artifact_dir.to_string_lossy().to_string(),
            preserve_input_order,
        };
        let pipeline = EnrichmentPipeline::new(
            storage.clone(),
            config,
            BatchDispatcher::new(Arc::new(EchoClient), 4),
            Box::new(NoProgress),
            PathBuf::from("contacts.v2.csv"),
        );
        (pipeline, storage)
    }

    const INPUT: &[u8] = b"email,firstName,lastName,companyName\n\
first@b.com,,,\n\
,,,\n\
second@b.com,,,\n";

    #[test]
    fn test_output_file_name_uses_text_before_first_dot() {
        assert_eq!(
            output_file_name(Path::new("/data/contacts.v2.csv")),
            "contacts_results.csv"
        );
        assert_eq!(output_file_name(Path::new("leads")), "leads_results.csv");
    }

    #[tokio::test]
    async fn test_full_run_preserves_input_order() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let (pipeline, storage) = pipeline(INPUT, temp_dir.path(), true);

        let records = pipeline.extract().await.unwrap();
        assert_eq!(records.len(), 3);

        let result = pipeline.transform(records).await.unwrap();
        let statuses: Vec<String> = result.table.rows.iter().map(|r| r.cell("status")).collect();
        assert_eq!(
            statuses,
            vec![
                "Success",
                "Failed: Missing email, first name, or last name",
                "Success"
            ]
        );
        assert_eq!(result.table.rows[0].cell("person_query"), "first@b.com");

        let output_path = pipeline.load(result).await.unwrap();
        assert_eq!(output_path, "mock/contacts_results.csv");

        let csv = storage.get_file("contacts_results.csv").await.unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_slice());
        assert_eq!(reader.records().count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_order_when_not_preserving() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let (pipeline, _) = pipeline(INPUT, temp_dir.path(), false);

        let records = pipeline.extract().await.unwrap();
        let result = pipeline.transform(records).await.unwrap();

        let rows: Vec<String> = result.table.rows.iter().map(|r| r.cell("row")).collect();
        // skipped row first, then the fast request, then the slow one
        assert_eq!(rows, vec!["1", "2", "0"]);
    }

    #[tokio::test]
    async fn test_artifact_is_written_and_kept() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let (pipeline, _) = pipeline(INPUT, temp_dir.path(), true);

        let records = pipeline.extract().await.unwrap();
        let result = pipeline.transform(records).await.unwrap();

        assert!(result.artifact_path.starts_with(temp_dir.path()));
        let artifact: Value =
            serde_json::from_slice(&std::fs::read(&result.artifact_path).unwrap()).unwrap();
        let entries = artifact.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries
            .iter()
            .any(|e| e["success"] == json!(false) && e["row"] == json!(1)));
    }

    #[tokio::test]
    async fn test_artifact_dir_is_created_when_missing() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let nested = temp_dir.path().join("audit").join("runs");
        let (pipeline, _) = pipeline(INPUT, &nested, true);

        let records = pipeline.extract().await.unwrap();
        let result = pipeline.transform(records).await.unwrap();

        assert!(nested.is_dir());
        assert_eq!(result.artifact_path.parent(), Some(nested.as_path()));
    }

    #[tokio::test]
    async fn test_header_only_input_writes_empty_output() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let (pipeline, storage) = pipeline(b"email,firstName,lastName\n", temp_dir.path(), true);

        let records = pipeline.extract().await.unwrap();
        assert!(records.is_empty());

        let result = pipeline.transform(records).await.unwrap();
        pipeline.load(result).await.unwrap();

        let csv = storage.get_file("contacts_results.csv").await.unwrap();
        assert!(csv.is_empty());
    }

    #[tokio::test]
    async fn test_missing_input_fails_extract() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let (mut pipeline, _) = pipeline(INPUT, temp_dir.path(), true);
        pipeline.input_path = PathBuf::from("other.csv");

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, EnrichError::IoError(_)));
    }
}
