use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tempfile::tempdir;

use scraper_wizard::app::ports::{ProcessingPort, SpreadsheetPort};
use scraper_wizard::config::{ProcessingConfig, SheetsConfig};
use scraper_wizard::error::{GatewayError, IngestionError, WizardError};
use scraper_wizard::infra::{GoogleSheetsClient, ReqwestProcessingClient};
use scraper_wizard::pipeline::ingestion::{LocalFileSource, RemoteSpreadsheetSource};
use scraper_wizard::pipeline::workflow::WorkflowStage;
use scraper_wizard::{SubmissionOutcome, WizardSession};

#[derive(Debug, Clone, Default)]
struct ReceivedField {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

type Received = Arc<Mutex<Vec<ReceivedField>>>;

async fn scrape_csv(State(received): State<Received>, mut multipart: Multipart) -> (StatusCode, Vec<u8>) {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        received.lock().unwrap().push(ReceivedField {
            name,
            file_name,
            content_type,
            data,
        });
    }
    (StatusCode::OK, b"company,email\nAcme,a@acme.com\n".to_vec())
}

async fn rate_limited() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "rate limited")
}

async fn sheet_values(
    Path((sheet_id, range)): Path<(String, String)>,
    headers: HeaderMap,
) -> (StatusCode, Json<serde_json::Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "Bearer good-token")
        .unwrap_or(false);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid credentials"})));
    }
    match sheet_id.as_str() {
        "empty" => (StatusCode::OK, Json(json!({ "range": range }))),
        _ => (
            StatusCode::OK,
            Json(json!({
                "range": range,
                "values": [["company", "city"], ["Acme", "Paris"], [], ["Globex"]]
            })),
        ),
    }
}

fn spawn_stub() -> (SocketAddr, Received) {
    let received: Received = Arc::default();
    let app = Router::new()
        .route("/scrape_csv", post(scrape_csv))
        .route("/broken/scrape_csv", post(rate_limited))
        .route("/v4/spreadsheets/:sheet_id/values/:range", get(sheet_values))
        .with_state(received.clone());

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = axum::Server::from_tcp(listener).unwrap().serve(app.into_make_service());
    tokio::spawn(server);
    (addr, received)
}

fn processing_config(addr: SocketAddr, path: &str) -> ProcessingConfig {
    ProcessingConfig {
        base_url: format!("http://{addr}"),
        path: path.to_string(),
        timeout_seconds: 5,
    }
}

fn sheets_config(addr: SocketAddr, token: &str) -> SheetsConfig {
    SheetsConfig {
        base_url: format!("http://{addr}"),
        access_token: Some(token.to_string()),
        ..SheetsConfig::default()
    }
}

#[tokio::test]
async fn test_multipart_submission_shape() -> Result<()> {
    let (addr, received) = spawn_stub();
    let session = WizardSession::new(
        Arc::new(GoogleSheetsClient::new(sheets_config(addr, "good-token"))),
        Arc::new(ReqwestProcessingClient::new(&processing_config(addr, "/scrape_csv"))?),
    );

    session
        .ingest(LocalFileSource::from_text("companies.csv", "company\nAcme\n").into())
        .await?;
    let outcome = session.process("company", "Find the email of {company}").await?;
    assert!(matches!(outcome, SubmissionOutcome::Applied { rows: 1, columns: 2, .. }));

    let fields = received.lock().unwrap().clone();
    assert_eq!(fields.len(), 2);
    let file = fields.iter().find(|f| f.name == "file").unwrap();
    assert_eq!(file.file_name.as_deref(), Some("input.csv"));
    assert_eq!(file.content_type.as_deref(), Some("text/csv"));
    assert_eq!(file.data, b"company\nAcme\n".to_vec());
    let prompt = fields.iter().find(|f| f.name == "prompt").unwrap();
    assert_eq!(prompt.data, b"Find the email of {company}".to_vec());

    let dir = tempdir()?;
    let path = session.export().await?.write_to(dir.path()).await?;
    assert_eq!(std::fs::read(path)?, b"company,email\nAcme,a@acme.com\n".to_vec());
    Ok(())
}

#[tokio::test]
async fn test_service_error_body_is_surfaced() -> Result<()> {
    let (addr, _) = spawn_stub();
    let session = WizardSession::new(
        Arc::new(GoogleSheetsClient::new(sheets_config(addr, "good-token"))),
        Arc::new(ReqwestProcessingClient::new(&processing_config(addr, "/broken/scrape_csv"))?),
    );
    session
        .ingest(LocalFileSource::from_text("companies.csv", "company\nAcme\n").into())
        .await?;

    let err = session.process("company", "{company}").await.unwrap_err();
    assert!(matches!(
        err,
        WizardError::Gateway(GatewayError::ServiceRejected(ref body)) if body == "rate limited"
    ));
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.stage, WorkflowStage::Configure);
    assert_eq!(snapshot.error.as_deref(), Some("Error from server: rate limited"));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_endpoint() -> Result<()> {
    let free = TcpListener::bind("127.0.0.1:0")?.local_addr()?;
    let client = ReqwestProcessingClient::new(&processing_config(free, "/scrape_csv"))?;
    let payload = scraper_wizard::pipeline::request::TransportPayload {
        file_name: "input.csv".to_string(),
        file_bytes: b"company\nAcme\n".to_vec(),
        prompt: "{company}".to_string(),
    };
    assert!(client.post(&payload).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_sheet_ingestion_over_http() -> Result<()> {
    let (addr, _) = spawn_stub();
    let session = WizardSession::new(
        Arc::new(GoogleSheetsClient::new(sheets_config(addr, "good-token"))),
        Arc::new(ReqwestProcessingClient::new(&processing_config(addr, "/scrape_csv"))?),
    );

    session
        .ingest(RemoteSpreadsheetSource::new("https://docs.google.com/spreadsheets/d/sheet-42/edit#gid=0").into())
        .await?;
    let dataset = session.dataset().await.unwrap();
    assert_eq!(dataset.headers(), &["company".to_string(), "city".to_string()]);
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.record(1).unwrap().get("city"), Some(""));
    assert_eq!(session.snapshot().await.stage, WorkflowStage::Configure);
    Ok(())
}

#[tokio::test]
async fn test_sheet_auth_and_empty_ranges() -> Result<()> {
    let (addr, _) = spawn_stub();

    let rejected = GoogleSheetsClient::new(sheets_config(addr, "bad-token"));
    let err = rejected.fetch_grid("sheet-42").await.unwrap_err();
    assert!(matches!(err, IngestionError::AuthFailure(_)));

    let client = GoogleSheetsClient::new(sheets_config(addr, "good-token"));
    assert!(client.fetch_grid("empty").await?.is_empty());

    let err = RemoteSpreadsheetSource::new("https://docs.google.com/spreadsheets/d/empty/edit")
        .fetch(&client)
        .await
        .unwrap_err();
    assert_eq!(err, IngestionError::EmptyInput);
    Ok(())
}
