use crate::dataset::TabularDataset;
use crate::error::IngestionError;
use std::path::Path;
use tracing::debug;

/// A delimited-text blob supplied by the user, usually a `.csv` upload.
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    name: String,
    contents: Vec<u8>,
}

impl LocalFileSource {
    pub fn from_bytes(name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            contents,
        }
    }

    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::from_bytes(name, text.into().into_bytes())
    }

    /// Read the whole file up front; a missing or unreadable file is a fetch failure.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, IngestionError> {
        let path = path.as_ref();
        let contents = tokio::fs::read(path)
            .await
            .map_err(|e| IngestionError::FetchFailure(format!("cannot read '{}': {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Read {} bytes from {}", contents.len(), path.display());
        Ok(Self::from_bytes(name, contents))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parse(&self) -> Result<TabularDataset, IngestionError> {
        let text = std::str::from_utf8(&self.contents).map_err(|e| {
            IngestionError::ParseFailure(format!("'{}' is not valid UTF-8 text: {}", self.name, e))
        })?;
        TabularDataset::parse_delimited(text)
    }
}
