//! Validation of user selections and the outbound transport payload.

use crate::constants::UPLOAD_FILE_NAME;
use crate::dataset::TabularDataset;
use crate::error::{Result, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder pattern is valid"));

/// A validated submission. Immutable once built.
#[derive(Debug, Clone)]
pub struct ProcessingRequest {
    dataset: Arc<TabularDataset>,
    main_column: String,
    template: String,
}

/// Bytes and fields handed to the processing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportPayload {
    pub file_name: String,
    pub file_bytes: Vec<u8>,
    pub prompt: String,
}

impl ProcessingRequest {
    pub fn dataset(&self) -> &TabularDataset {
        &self.dataset
    }

    pub fn main_column(&self) -> &str {
        &self.main_column
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Pair the dataset's delimited text with the verbatim template.
    pub fn to_payload(&self) -> Result<TransportPayload> {
        Ok(TransportPayload {
            file_name: UPLOAD_FILE_NAME.to_string(),
            file_bytes: self.dataset.to_delimited_bytes()?,
            prompt: self.template.clone(),
        })
    }
}

pub struct RequestBuilder;

impl RequestBuilder {
    /// Validate selections in a fixed order, stopping at the first failure.
    pub fn build(
        dataset: Arc<TabularDataset>,
        main_column: &str,
        template: &str,
    ) -> std::result::Result<ProcessingRequest, ValidationError> {
        if main_column.is_empty() || !dataset.has_column(main_column) {
            return Err(ValidationError::NoMainColumn);
        }
        if template.is_empty() {
            return Err(ValidationError::NoTemplate);
        }
        if dataset.is_empty() {
            return Err(ValidationError::EmptyDataset);
        }

        let mut names = placeholders(template);
        names.sort();
        names.dedup();
        let placeholder = match names.len() {
            0 => return Err(ValidationError::NoPlaceholder),
            1 => names.remove(0),
            _ => return Err(ValidationError::MultiplePlaceholders(names)),
        };
        if !dataset.has_column(&placeholder) {
            return Err(ValidationError::UnknownPlaceholder(placeholder));
        }
        if placeholder != main_column {
            return Err(ValidationError::PlaceholderMismatch {
                placeholder,
                main_column: main_column.to_string(),
            });
        }

        debug!(
            main_column,
            placeholder = %placeholder,
            rows = dataset.len(),
            "Built processing request"
        );
        Ok(ProcessingRequest {
            dataset,
            main_column: main_column.to_string(),
            template: template.to_string(),
        })
    }
}

/// Placeholder names in order of appearance, e.g. `company` in `"email of {company}"`.
pub fn placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(text: &str) -> Arc<TabularDataset> {
        Arc::new(TabularDataset::parse_delimited(text).unwrap())
    }

    #[test]
    fn test_build_accepts_single_non_empty_row() {
        let data = Arc::new(
            TabularDataset::from_rows(
                vec!["company".to_string()],
                vec![vec!["Acme".to_string()], vec![String::new()]],
            )
            .unwrap(),
        );
        let request = RequestBuilder::build(data, "company", "email of {company}").unwrap();
        assert_eq!(request.main_column(), "company");
        assert_eq!(request.dataset().len(), 1);
    }

    #[test]
    fn test_empty_main_column_always_fails() {
        for text in ["company\nAcme\n", "company\n", "a,b\n1,2\n"] {
            let err = RequestBuilder::build(dataset(text), "", "").unwrap_err();
            assert_eq!(err, ValidationError::NoMainColumn);
        }
    }

    #[test]
    fn test_unknown_main_column() {
        let err = RequestBuilder::build(dataset("company\nAcme\n"), "email", "x {company}").unwrap_err();
        assert_eq!(err, ValidationError::NoMainColumn);
    }

    #[test]
    fn test_empty_template_always_fails() {
        for text in ["company\nAcme\n", "company\n"] {
            let err = RequestBuilder::build(dataset(text), "company", "").unwrap_err();
            assert_eq!(err, ValidationError::NoTemplate);
        }
    }

    #[test]
    fn test_whitespace_template_is_not_empty() {
        let err = RequestBuilder::build(dataset("company\n"), "company", "   ").unwrap_err();
        assert_eq!(err, ValidationError::EmptyDataset);

        let err = RequestBuilder::build(dataset("company\nAcme\n"), "company", "   ").unwrap_err();
        assert_eq!(err, ValidationError::NoPlaceholder);
    }

    #[test]
    fn test_empty_dataset_checked_after_template() {
        let err = RequestBuilder::build(dataset("company\n"), "company", "email of {company}").unwrap_err();
        assert_eq!(err, ValidationError::EmptyDataset);
    }

    #[test]
    fn test_placeholder_rules() {
        let data = dataset("company,city\nAcme,Paris\n");

        let err = RequestBuilder::build(data.clone(), "company", "find the email").unwrap_err();
        assert_eq!(err, ValidationError::NoPlaceholder);

        let err = RequestBuilder::build(data.clone(), "company", "{company} in {city}").unwrap_err();
        assert_eq!(
            err,
            ValidationError::MultiplePlaceholders(vec!["city".to_string(), "company".to_string()])
        );

        let err = RequestBuilder::build(data.clone(), "company", "email of {firm}").unwrap_err();
        assert_eq!(err, ValidationError::UnknownPlaceholder("firm".to_string()));

        let err = RequestBuilder::build(data.clone(), "company", "email of {city}").unwrap_err();
        assert_eq!(
            err,
            ValidationError::PlaceholderMismatch {
                placeholder: "city".to_string(),
                main_column: "company".to_string(),
            }
        );

        assert!(RequestBuilder::build(data.clone(), "city", "weather in {city}").is_ok());
        assert!(RequestBuilder::build(data, "company", "{company} or {company} again").is_ok());
    }

    #[test]
    fn test_payload_carries_template_verbatim() {
        let request =
            RequestBuilder::build(dataset("company\nAcme\n"), "company", "Get me the email of {company}").unwrap();
        let payload = request.to_payload().unwrap();

        assert_eq!(payload.file_name, "input.csv");
        assert_eq!(payload.prompt, "Get me the email of {company}");
        assert_eq!(payload.file_bytes, b"company\nAcme\n".to_vec());
    }

    #[test]
    fn test_placeholders_in_order() {
        assert_eq!(placeholders("a {x} b {y} c {x}"), vec!["x", "y", "x"]);
        assert!(placeholders("no braces").is_empty());
    }
}
