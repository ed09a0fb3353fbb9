use crate::app::{RunSummary, TimelineRecord};
use crate::error::FetchError;
use async_trait::async_trait;

/// Everything the watcher needs from the pipeline backend. Implementations decode
/// their own payloads; every failure is classified into the [`FetchError`] taxonomy.
#[async_trait]
pub trait PipelineBackend: Send + Sync {
    async fn fetch_timeline(&self, run_id: u64) -> Result<Vec<TimelineRecord>, FetchError>;
    async fn fetch_log(&self, run_id: u64, log_id: u64) -> Result<String, FetchError>;
    async fn fetch_run_status(&self, run_id: u64) -> Result<RunSummary, FetchError>;
}
