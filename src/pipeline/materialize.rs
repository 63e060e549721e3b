use crate::constants::EXPORT_FILE_NAME;
use crate::dataset::{RowOverflow, TabularDataset};
use crate::error::{IngestionError, Result};
use crate::pipeline::gateway::Artifact;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A processed table together with the exact bytes it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedResult {
    dataset: TabularDataset,
    artifact: Vec<u8>,
    received_at: DateTime<Utc>,
}

/// A downloadable copy of the processing service's response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct ResultMaterializer;

impl ResultMaterializer {
    /// Parse raw artifact bytes with the same rules as file ingestion, except
    /// that cells past the last header are dropped from the preview. The
    /// exported bytes still carry them.
    pub fn materialize(bytes: Vec<u8>) -> std::result::Result<MaterializedResult, IngestionError> {
        let dataset = {
            let text = std::str::from_utf8(&bytes).map_err(|e| {
                IngestionError::ParseFailure(format!("processed artifact is not valid UTF-8: {e}"))
            })?;
            TabularDataset::parse_delimited_with(text, RowOverflow::Truncate)?
        };
        debug!(
            columns = dataset.headers().len(),
            rows = dataset.len(),
            "Materialized processed artifact"
        );
        Ok(MaterializedResult {
            dataset,
            artifact: bytes,
            received_at: Utc::now(),
        })
    }

    pub fn from_artifact(artifact: Artifact) -> std::result::Result<MaterializedResult, IngestionError> {
        let received_at = artifact.received_at;
        let mut result = Self::materialize(artifact.bytes)?;
        result.received_at = received_at;
        Ok(result)
    }
}

impl MaterializedResult {
    pub fn preview(&self) -> &TabularDataset {
        &self.dataset
    }

    /// The service's bytes verbatim, not a re-encoding of the parsed table.
    pub fn export(&self) -> ExportArtifact {
        ExportArtifact {
            file_name: EXPORT_FILE_NAME.to_string(),
            bytes: self.artifact.clone(),
        }
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

impl ExportArtifact {
    /// Write the artifact into `dir` under its file name, returning the full path.
    pub async fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.bytes).await?;
        info!("💾 Saved processed results to {}", path.display());
        Ok(path)
    }
}
