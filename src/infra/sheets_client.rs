use crate::app::ports::SpreadsheetPort;
use crate::config::SheetsConfig;
use crate::error::IngestionError;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Reads cell values through the Google Sheets v4 REST API.
///
/// An OAuth access token is sent as a bearer header when configured,
/// otherwise the API key is passed as the `key` query parameter.
pub struct GoogleSheetsClient {
    client: reqwest::Client,
    config: SheetsConfig,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<Vec<Value>>,
}

enum Credentials<'a> {
    Bearer(&'a str),
    ApiKey(&'a str),
}

impl GoogleSheetsClient {
    pub fn new(config: SheetsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn credentials(&self) -> Result<Credentials<'_>, IngestionError> {
        if let Some(token) = present(&self.config.access_token) {
            return Ok(Credentials::Bearer(token));
        }
        if let Some(key) = present(&self.config.api_key) {
            return Ok(Credentials::ApiKey(key));
        }
        Err(IngestionError::AuthFailure(match present(&self.config.client_id) {
            Some(client_id) => format!(
                "client {client_id} has no access token; complete the consent flow and set SHEETS_ACCESS_TOKEN"
            ),
            None => "no credentials configured; set SHEETS_ACCESS_TOKEN or SHEETS_API_KEY".to_string(),
        }))
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}` with each segment escaped.
    pub fn values_url(&self, sheet_id: &str) -> Result<Url, IngestionError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| IngestionError::FetchFailure(format!("invalid sheets base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| IngestionError::FetchFailure("sheets base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", sheet_id, "values", self.config.range.as_str()]);
        Ok(url)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

#[async_trait]
impl SpreadsheetPort for GoogleSheetsClient {
    async fn fetch_grid(&self, sheet_id: &str) -> Result<Vec<Value>, IngestionError> {
        let credentials = self.credentials()?;
        let url = self.values_url(sheet_id)?;
        debug!(%url, "GET spreadsheet values");

        let request = match credentials {
            Credentials::Bearer(token) => self.client.get(url).bearer_auth(token),
            Credentials::ApiKey(key) => self.client.get(url).query(&[("key", key)]),
        };
        let resp = request
            .send()
            .await
            .map_err(|e| IngestionError::FetchFailure(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Err(IngestionError::AuthFailure(format!("HTTP {}: {}", status.as_u16(), body.trim())));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IngestionError::FetchFailure(format!("HTTP {}: {}", status.as_u16(), body.trim())));
        }

        let range: ValueRange = resp
            .json()
            .await
            .map_err(|e| IngestionError::FetchFailure(format!("unexpected response body: {e}")))?;
        Ok(range.values.unwrap_or_default())
    }
}
