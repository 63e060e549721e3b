//! In-memory header + row table shared by every pipeline stage.
//!
//! A `TabularDataset` is built atomically from a grid of string cells and is
//! never mutated afterwards; each stage that needs a different table builds a
//! new one.

use crate::error::{IngestionError, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::io;
use tracing::warn;

const UTF8_BOM: char = '\u{feff}';

/// What to do with non-empty cells past the last header column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowOverflow {
    /// Fail with `ParseFailure`. Used for user-supplied input.
    #[default]
    Reject,
    /// Drop the extra cells and keep the row.
    Truncate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabularDataset {
    headers: Vec<String>,
    /// Each row holds exactly one value per header, in header order.
    rows: Vec<Vec<String>>,
}

/// Borrowed view of a single row keyed by header name.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    headers: &'a [String],
    values: &'a [String],
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let values = self.values;
        let index = self.headers.iter().position(|h| h == column)?;
        values.get(index).map(String::as_str)
    }

    pub fn values(&self) -> &'a [String] {
        self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let (headers, values) = (self.headers, self.values);
        headers
            .iter()
            .map(String::as_str)
            .zip(values.iter().map(String::as_str))
    }
}

impl TabularDataset {
    /// Build a dataset from an explicit header row and its data rows.
    ///
    /// Entirely empty rows are dropped before the header is chosen, so a blank
    /// header row means the first non-empty data row becomes the header.
    pub fn from_rows<I>(header_row: Vec<String>, data_rows: I) -> std::result::Result<Self, IngestionError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        Self::from_grid(std::iter::once(header_row).chain(data_rows))
    }

    /// Build a dataset from a grid whose first non-empty row is the header.
    pub fn from_grid<I>(grid: I) -> std::result::Result<Self, IngestionError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        Self::from_grid_with(grid, RowOverflow::Reject)
    }

    pub fn from_grid_with<I>(grid: I, overflow: RowOverflow) -> std::result::Result<Self, IngestionError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut rows = grid.into_iter().filter(|row| !is_blank_row(row));
        let header_row = rows.next().ok_or(IngestionError::EmptyInput)?;
        let headers = normalize_headers(header_row)?;
        let width = headers.len();

        let rows = rows
            .enumerate()
            .map(|(index, row)| fit_row(row, width, index + 1, overflow))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self { headers, rows })
    }

    /// Parse comma-delimited text (RFC 4180 quoting) into a dataset.
    pub fn parse_delimited(text: &str) -> std::result::Result<Self, IngestionError> {
        Self::parse_delimited_with(text, RowOverflow::Reject)
    }

    pub fn parse_delimited_with(text: &str, overflow: RowOverflow) -> std::result::Result<Self, IngestionError> {
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
        if let Some(line) = unterminated_quote_line(text) {
            return Err(IngestionError::ParseFailure(format!(
                "unterminated quoted field starting on line {line}"
            )));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut grid = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                IngestionError::ParseFailure(format!("record {}: {}", index + 1, e))
            })?;
            grid.push(record.iter().map(str::to_owned).collect::<Vec<_>>());
        }

        Self::from_grid_with(grid, overflow)
    }

    /// Encode back to comma-delimited text with a `\n` record terminator.
    pub fn to_delimited_text(&self) -> Result<String> {
        let bytes = self.to_delimited_bytes()?;
        let text = String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(text)
    }

    pub fn to_delimited_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.into_inner().map_err(|e| e.into_error().into())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Number of data rows (the header row is not counted).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.rows.iter().map(move |values| Record {
            headers: &self.headers,
            values,
        })
    }

    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        self.rows.get(index).map(|values| Record {
            headers: &self.headers,
            values,
        })
    }

    pub fn column_values(&self, column: &str) -> Option<Vec<&str>> {
        let index = self.headers.iter().position(|h| h == column)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.get(index).map(String::as_str))
                .collect(),
        )
    }

    /// Rows as JSON objects keyed by header, for machine-readable previews.
    pub fn to_json_records(&self) -> serde_json::Value {
        let records = self
            .records()
            .map(|record| {
                let object = record
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                    .collect::<serde_json::Map<_, _>>();
                serde_json::Value::Object(object)
            })
            .collect();
        serde_json::Value::Array(records)
    }
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.is_empty())
}

fn normalize_headers(header_row: Vec<String>) -> std::result::Result<Vec<String>, IngestionError> {
    let mut seen = HashSet::new();
    let mut headers = Vec::with_capacity(header_row.len());
    for (index, raw) in header_row.into_iter().enumerate() {
        let name = raw.trim().to_string();
        if name.is_empty() {
            return Err(IngestionError::InvalidHeaders(format!(
                "column {} has a blank name",
                index + 1
            )));
        }
        if !seen.insert(name.clone()) {
            return Err(IngestionError::InvalidHeaders(format!(
                "duplicate column name '{name}'"
            )));
        }
        headers.push(name);
    }
    Ok(headers)
}

/// Pad short rows with empty cells and apply `overflow` to data past the last header.
fn fit_row(
    mut row: Vec<String>,
    width: usize,
    row_number: usize,
    overflow: RowOverflow,
) -> std::result::Result<Vec<String>, IngestionError> {
    if row.len() > width {
        let has_data = row.iter().skip(width).any(|cell| !cell.is_empty());
        if has_data && overflow == RowOverflow::Truncate {
            warn!(
                row = row_number,
                fields = row.len(),
                width,
                "Dropping cells past the last header column"
            );
        } else if has_data {
            return Err(IngestionError::ParseFailure(format!(
                "data row {} has {} fields but the header has {}",
                row_number,
                row.len(),
                width
            )));
        }
        row.truncate(width);
    } else {
        row.resize(width, String::new());
    }
    Ok(row)
}

/// Line on which a quoted field opens without ever being closed.
///
/// A quote only opens a quoted field at the start of a field; stray quotes in
/// the middle of an unquoted field are literal.
fn unterminated_quote_line(text: &str) -> Option<usize> {
    let mut line = 1;
    let mut opened_on = None;
    let mut at_field_start = true;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if opened_on.is_some() {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                }
                '"' => {
                    opened_on = None;
                    at_field_start = false;
                }
                '\n' => line += 1,
                _ => {}
            }
            continue;
        }

        match c {
            '"' if at_field_start => {
                opened_on = Some(line);
                at_field_start = false;
            }
            ',' | '\r' => at_field_start = true,
            '\n' => {
                line += 1;
                at_field_start = true;
            }
            _ => at_field_start = false,
        }
    }

    opened_on
}
