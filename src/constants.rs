//! Wire and file names shared between the processing endpoint and the CLI.

// Multipart field names expected by the processing endpoint
pub const FILE_FIELD: &str = "file";
pub const PROMPT_FIELD: &str = "prompt";

// File names
pub const UPLOAD_FILE_NAME: &str = "input.csv";
pub const EXPORT_FILE_NAME: &str = "processed_results.csv";
pub const CSV_MIME: &str = "text/csv";

// Processing endpoint defaults
pub const DEFAULT_PROCESSING_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_PROCESSING_PATH: &str = "/scrape_csv";
pub const DEFAULT_PROCESSING_TIMEOUT_SECS: u64 = 300;

// Spreadsheet provider defaults
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_SHEET_RANGE: &str = "Sheet1";

pub const DEFAULT_CONFIG_FILE: &str = "wizard.toml";
