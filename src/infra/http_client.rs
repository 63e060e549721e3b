use crate::app::ports::{ProcessingPort, TransportResponse};
use crate::config::ProcessingConfig;
use crate::constants::{CSV_MIME, FILE_FIELD, PROMPT_FIELD};
use crate::error::Result;
use crate::pipeline::request::TransportPayload;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::debug;

/// Posts submissions to the processing service as `multipart/form-data`.
pub struct ReqwestProcessingClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ReqwestProcessingClient {
    pub fn new(config: &ProcessingConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint_url(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ProcessingPort for ReqwestProcessingClient {
    async fn post(&self, payload: &TransportPayload) -> std::result::Result<TransportResponse, String> {
        let file = Part::bytes(payload.file_bytes.clone())
            .file_name(payload.file_name.clone())
            .mime_str(CSV_MIME)
            .map_err(|e| e.to_string())?;
        let form = Form::new()
            .part(FILE_FIELD, file)
            .text(PROMPT_FIELD, payload.prompt.clone());

        debug!(endpoint = %self.endpoint, "POST multipart submission");
        let resp = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| e.to_string())?.to_vec();
        Ok(TransportResponse { status, body })
    }
}
