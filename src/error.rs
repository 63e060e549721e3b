use thiserror::Error;

/// Failures while turning an external source into a `TabularDataset`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestionError {
    #[error("No valid data found in the input")]
    EmptyInput,

    #[error("Failed to parse delimited text: {0}")]
    ParseFailure(String),

    #[error("Invalid spreadsheet reference: {0}")]
    InvalidReference(String),

    #[error("Spreadsheet authentication failed: {0}")]
    AuthFailure(String),

    #[error("Failed to fetch spreadsheet data: {0}")]
    FetchFailure(String),

    #[error("Invalid header row: {0}")]
    InvalidHeaders(String),
}

/// Rejections raised while building a `ProcessingRequest`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a main column present in the data")]
    NoMainColumn,

    #[error("Please enter a prompt template")]
    NoTemplate,

    #[error("The dataset has no rows to process")]
    EmptyDataset,

    #[error("No placeholders found in the prompt template")]
    NoPlaceholder,

    #[error("Only one unique placeholder is allowed, found: {}", .0.join(", "))]
    MultiplePlaceholders(Vec<String>),

    #[error("Placeholder '{{{0}}}' does not name a column in the data")]
    UnknownPlaceholder(String),

    #[error("Placeholder '{{{placeholder}}}' must match the selected main column '{main_column}'")]
    PlaceholderMismatch { placeholder: String, main_column: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Error from server: {0}")]
    ServiceRejected(String),

    #[error("Processing service unreachable: {0}")]
    Unreachable(String),

    #[error("A submission is already in progress")]
    AlreadyInProgress,
}

#[derive(Error, Debug)]
pub enum WizardError {
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No processed data available: {0}")]
    NoResult(String),
}

pub type Result<T> = std::result::Result<T, WizardError>;
