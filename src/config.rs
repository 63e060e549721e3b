use crate::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_PROCESSING_PATH, DEFAULT_PROCESSING_TIMEOUT_SECS, DEFAULT_PROCESSING_URL,
    DEFAULT_SHEETS_BASE_URL, DEFAULT_SHEET_RANGE,
};
use crate::error::{Result, WizardError};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub processing: ProcessingConfig,
    pub sheets: SheetsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub base_url: String,
    pub path: String,
    pub timeout_seconds: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROCESSING_URL.to_string(),
            path: DEFAULT_PROCESSING_PATH.to_string(),
            timeout_seconds: DEFAULT_PROCESSING_TIMEOUT_SECS,
        }
    }
}

impl ProcessingConfig {
    /// Full URL the multipart submission is posted to.
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub base_url: String,
    pub range: String,
    pub api_key: Option<String>,
    pub client_id: Option<String>,
    /// OAuth bearer token obtained out of band; preferred over the API key.
    pub access_token: Option<String>,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            range: DEFAULT_SHEET_RANGE.to_string(),
            api_key: None,
            client_id: None,
            access_token: None,
        }
    }
}

impl Config {
    /// Load `wizard.toml` (or the file named by `WIZARD_CONFIG`) and apply
    /// environment overrides on top.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("WIZARD_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim()))?,
            _ if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            WizardError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Override fields from environment-style lookups. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("PROCESSING_ENDPOINT_URL") {
            self.processing.base_url = v;
        }
        if let Some(v) = get("PROCESSING_PATH") {
            self.processing.path = v;
        }
        if let Some(v) = get("PROCESSING_TIMEOUT_SECONDS") {
            self.processing.timeout_seconds = v.parse().map_err(|e| {
                WizardError::Config(format!("PROCESSING_TIMEOUT_SECONDS must be a number of seconds: {e}"))
            })?;
        }
        if let Some(v) = get("SHEETS_BASE_URL") {
            self.sheets.base_url = v;
        }
        if let Some(v) = get("SHEETS_RANGE") {
            self.sheets.range = v;
        }
        if let Some(v) = get("SHEETS_API_KEY") {
            self.sheets.api_key = Some(v);
        }
        if let Some(v) = get("SHEETS_CLIENT_ID") {
            self.sheets.client_id = Some(v);
        }
        if let Some(v) = get("SHEETS_ACCESS_TOKEN") {
            self.sheets.access_token = Some(v);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.processing.endpoint_url(), "http://127.0.0.1:5000/scrape_csv");
        assert_eq!(config.sheets.range, "Sheet1");
        assert!(config.sheets.api_key.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [processing]
            base_url = "http://processor.internal:8080/"

            [sheets]
            range = "Leads"
            "#,
        )
        .unwrap();

        assert_eq!(config.processing.endpoint_url(), "http://processor.internal:8080/scrape_csv");
        assert_eq!(config.processing.timeout_seconds, DEFAULT_PROCESSING_TIMEOUT_SECS);
        assert_eq!(config.sheets.range, "Leads");
        assert_eq!(config.sheets.base_url, DEFAULT_SHEETS_BASE_URL);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PROCESSING_ENDPOINT_URL", "http://localhost:9000"),
            ("PROCESSING_TIMEOUT_SECONDS", "30"),
            ("SHEETS_API_KEY", "key-123"),
            ("SHEETS_ACCESS_TOKEN", "   "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.processing.endpoint_url(), "http://localhost:9000/scrape_csv");
        assert_eq!(config.processing.timeout(), Duration::from_secs(30));
        assert_eq!(config.sheets.api_key.as_deref(), Some("key-123"));
        assert!(config.sheets.access_token.is_none());
    }

    #[test]
    fn test_invalid_timeout_is_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == "PROCESSING_TIMEOUT_SECONDS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, WizardError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::from_file(Path::new("/definitely/not/here/wizard.toml")).unwrap_err();
        assert!(matches!(err, WizardError::Config(_)));
    }
}
