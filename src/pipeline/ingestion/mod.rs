//! Producers of a `TabularDataset`.
//!
//! Every source goes through the same `ingest` contract, so the stages
//! downstream never need to know where the table came from.

pub mod local_file;
pub mod spreadsheet;

pub use local_file::LocalFileSource;
pub use spreadsheet::{extract_sheet_id, RemoteSpreadsheetSource};

use crate::app::ports::SpreadsheetPort;
use crate::dataset::TabularDataset;
use crate::error::IngestionError;
use crate::observability::metrics;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub enum IngestionSource {
    LocalFile(LocalFileSource),
    RemoteSpreadsheet(RemoteSpreadsheetSource),
}

impl IngestionSource {
    pub fn kind(&self) -> &'static str {
        match self {
            IngestionSource::LocalFile(_) => "local_file",
            IngestionSource::RemoteSpreadsheet(_) => "remote_spreadsheet",
        }
    }

    /// Produce a dataset from this source. Failures are returned as-is, never retried.
    pub async fn ingest(&self, sheets: &dyn SpreadsheetPort) -> Result<TabularDataset, IngestionError> {
        let result = match self {
            IngestionSource::LocalFile(file) => file.parse(),
            IngestionSource::RemoteSpreadsheet(sheet) => sheet.fetch(sheets).await,
        };

        match &result {
            Ok(dataset) => {
                info!(
                    source = self.kind(),
                    columns = dataset.headers().len(),
                    rows = dataset.len(),
                    "Ingested dataset"
                );
                metrics::ingestion::succeeded(self.kind(), dataset.len());
            }
            Err(e) => {
                warn!(source = self.kind(), "Ingestion failed: {}", e);
                metrics::ingestion::failed(self.kind());
            }
        }
        result
    }
}

impl From<LocalFileSource> for IngestionSource {
    fn from(source: LocalFileSource) -> Self {
        IngestionSource::LocalFile(source)
    }
}

impl From<RemoteSpreadsheetSource> for IngestionSource {
    fn from(source: RemoteSpreadsheetSource) -> Self {
        IngestionSource::RemoteSpreadsheet(source)
    }
}
