pub mod ports;
pub mod wizard_use_case;

pub use wizard_use_case::{SessionSnapshot, SubmissionOutcome, WizardSession};
