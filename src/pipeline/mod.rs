//! Ingestion → validation → processing → materialization stages.

pub mod gateway;
pub mod ingestion;
pub mod materialize;
pub mod request;
pub mod workflow;

pub use gateway::{Artifact, ProcessingGateway};
pub use ingestion::{IngestionSource, LocalFileSource, RemoteSpreadsheetSource};
pub use materialize::{ExportArtifact, MaterializedResult, ResultMaterializer};
pub use request::{ProcessingRequest, RequestBuilder, TransportPayload};
pub use workflow::{ApplyOutcome, Generation, WorkflowStage, WorkflowState};
