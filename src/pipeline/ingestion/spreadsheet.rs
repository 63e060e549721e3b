use crate::app::ports::SpreadsheetPort;
use crate::dataset::TabularDataset;
use crate::error::IngestionError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, instrument};

static SHEET_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/d/([a-zA-Z0-9_-]+)").expect("sheet id pattern is valid"));

/// A spreadsheet referenced by the URL the user pasted.
#[derive(Debug, Clone)]
pub struct RemoteSpreadsheetSource {
    url: String,
}

impl RemoteSpreadsheetSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn sheet_id(&self) -> Result<&str, IngestionError> {
        extract_sheet_id(&self.url).ok_or_else(|| {
            IngestionError::InvalidReference(format!(
                "'{}' does not contain a /d/<id> spreadsheet identifier",
                self.url
            ))
        })
    }

    /// Resolve the identifier, fetch the grid and shape it into a dataset.
    ///
    /// The reference is checked before any remote call is made.
    #[instrument(skip(self, port), fields(url = %self.url))]
    pub async fn fetch(&self, port: &dyn SpreadsheetPort) -> Result<TabularDataset, IngestionError> {
        let sheet_id = self.sheet_id()?;
        debug!(sheet_id, "Fetching spreadsheet values");
        let grid = port.fetch_grid(sheet_id).await?;
        info!("Fetched {} spreadsheet rows", grid.len());
        TabularDataset::from_grid(normalize_grid(grid))
    }
}

pub fn extract_sheet_id(url: &str) -> Option<&str> {
    SHEET_ID.captures(url).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

/// Coerce provider rows into string rows.
///
/// Arrays are taken as-is, objects contribute their values in key order
/// (serde_json keeps object keys sorted), anything else is a one-cell row.
pub fn normalize_grid(grid: Vec<Value>) -> Vec<Vec<String>> {
    grid.into_iter().map(normalize_row).collect()
}

fn normalize_row(row: Value) -> Vec<String> {
    match row {
        Value::Array(cells) => cells.into_iter().map(cell_text).collect(),
        Value::Object(map) => map.into_iter().map(|(_, v)| cell_text(v)).collect(),
        other => vec![cell_text(other)],
    }
}

fn cell_text(cell: Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}
