use crate::error::IngestionError;
use crate::pipeline::request::TransportPayload;
use async_trait::async_trait;

/// Remote spreadsheet capability: acquires credentials and reads the value grid.
///
/// Rows come back as raw JSON values; shaping them into a table is the
/// ingestion adapter's job.
#[async_trait]
pub trait SpreadsheetPort: Send + Sync {
    async fn fetch_grid(&self, sheet_id: &str) -> Result<Vec<serde_json::Value>, IngestionError>;
}

// Processing-side ports
#[async_trait]
pub trait ProcessingPort: Send + Sync {
    /// `Err` means no response reached us; any HTTP status is an `Ok`.
    async fn post(&self, payload: &TransportPayload) -> Result<TransportResponse, String>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}
