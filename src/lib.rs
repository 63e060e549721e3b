pub mod config;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;

pub use app::{SessionSnapshot, SubmissionOutcome, WizardSession};
pub use config::Config;
pub use dataset::TabularDataset;
pub use error::{Result, WizardError};
