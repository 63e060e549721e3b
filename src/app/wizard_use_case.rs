use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::app::ports::{ProcessingPort, SpreadsheetPort};
use crate::dataset::TabularDataset;
use crate::error::{GatewayError, Result, ValidationError, WizardError};
use crate::observability::metrics;
use crate::pipeline::gateway::ProcessingGateway;
use crate::pipeline::ingestion::IngestionSource;
use crate::pipeline::materialize::{ExportArtifact, MaterializedResult, ResultMaterializer};
use crate::pipeline::request::RequestBuilder;
use crate::pipeline::workflow::{ApplyOutcome, Generation, WorkflowStage, WorkflowState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The result now backs the Review stage.
    Applied { generation: Generation, rows: usize, columns: usize },
    /// The dataset was replaced while the submission was pending.
    Discarded { submitted: Generation, current: Generation },
}

/// Point-in-time view of a session, cheap enough to hand to a UI or a log line.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub stage: WorkflowStage,
    pub generation: Generation,
    pub error: Option<String>,
    pub headers: Vec<String>,
    pub rows: usize,
    pub has_result: bool,
    pub busy: bool,
}

/// Drives one wizard session: ingestion, submission and review.
///
/// Completion handlers never hold the state lock across an await, so the
/// session stays responsive to navigation and re-ingestion while a
/// submission is pending.
pub struct WizardSession {
    state: Mutex<WorkflowState>,
    gateway: ProcessingGateway,
    sheets: Arc<dyn SpreadsheetPort>,
}

impl WizardSession {
    pub fn new(sheets: Arc<dyn SpreadsheetPort>, processing: Arc<dyn ProcessingPort>) -> Self {
        Self {
            state: Mutex::new(WorkflowState::new()),
            gateway: ProcessingGateway::new(processing),
            sheets,
        }
    }

    #[instrument(skip(self, source), fields(source = source.kind()))]
    pub async fn ingest(&self, source: IngestionSource) -> Result<Generation> {
        match source.ingest(self.sheets.as_ref()).await {
            Ok(dataset) => Ok(self.state.lock().await.dataset_ingested(dataset)),
            Err(e) => {
                self.state.lock().await.record_failure(&e);
                Err(e.into())
            }
        }
    }

    /// Validate, submit and apply the result for the active dataset.
    ///
    /// Failures reach the error channel only while the submitted dataset is
    /// still the active one.
    #[instrument(skip(self, template))]
    pub async fn process(&self, main_column: &str, template: &str) -> Result<SubmissionOutcome> {
        let (dataset, generation) = {
            let state = self.state.lock().await;
            (state.dataset().cloned(), state.generation())
        };

        let request = match dataset {
            Some(dataset) => RequestBuilder::build(dataset, main_column, template),
            None => Err(ValidationError::NoMainColumn),
        };
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                metrics::request::rejected();
                self.state.lock().await.record_failure(&e);
                return Err(e.into());
            }
        };

        let artifact = match self.gateway.submit(&request).await {
            Ok(artifact) => artifact,
            Err(e) => {
                self.fail_if_current(generation, &e).await;
                return Err(e);
            }
        };

        let submission_id = artifact.submission_id;
        let result = match ResultMaterializer::from_artifact(artifact) {
            Ok(result) => result,
            Err(e) => {
                let e = WizardError::from(e);
                self.fail_if_current(generation, &e).await;
                return Err(e);
            }
        };
        let rows = result.preview().len();
        let columns = result.preview().headers().len();

        match self.state.lock().await.apply_result(generation, result) {
            ApplyOutcome::Applied => {
                info!(%submission_id, rows, columns, "Processed data ready for review");
                metrics::workflow::result_applied();
                Ok(SubmissionOutcome::Applied {
                    generation,
                    rows,
                    columns,
                })
            }
            ApplyOutcome::Stale { current } => {
                metrics::workflow::stale_discarded();
                Ok(SubmissionOutcome::Discarded {
                    submitted: generation,
                    current,
                })
            }
        }
    }

    async fn fail_if_current(&self, generation: Generation, error: &WizardError) {
        let mut state = self.state.lock().await;
        if matches!(error, WizardError::Gateway(GatewayError::AlreadyInProgress)) || state.is_current(generation) {
            state.record_failure(error);
        } else {
            warn!(submitted = %generation, "Dropping failure from a superseded submission: {}", error);
        }
    }

    pub async fn navigate(&self, stage: WorkflowStage) {
        self.state.lock().await.navigate(stage);
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        let (headers, rows) = state
            .dataset()
            .map(|d| (d.headers().to_vec(), d.len()))
            .unwrap_or_default();
        SessionSnapshot {
            stage: state.stage(),
            generation: state.generation(),
            error: state.error().map(str::to_string),
            headers,
            rows,
            has_result: state.result().is_some(),
            busy: self.gateway.is_busy(),
        }
    }

    pub async fn dataset(&self) -> Option<Arc<TabularDataset>> {
        self.state.lock().await.dataset().cloned()
    }

    pub async fn preview(&self) -> Option<MaterializedResult> {
        self.state.lock().await.result().cloned()
    }

    pub async fn export(&self) -> Result<ExportArtifact> {
        let mut state = self.state.lock().await;
        if let Some(result) = state.result() {
            return Ok(result.export());
        }
        let e = WizardError::NoResult("nothing has been processed yet".to_string());
        state.record_failure(&e);
        Err(e)
    }
}
