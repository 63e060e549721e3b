//! Metrics for the wizard pipeline
//!
//! Each stage records through the small per-phase modules below. Nothing is
//! exported unless the embedding process installs a `metrics` recorder.

use std::fmt;

/// All metric names used in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Ingestion metrics
    IngestionSuccess,
    IngestionError,
    IngestionRows,

    // Request builder metrics
    ValidationRejected,

    // Gateway metrics
    GatewaySubmissions,
    GatewayAccepted,
    GatewayRejected,
    GatewayUnreachable,
    GatewayBusy,
    GatewayDuration,
    GatewayArtifactBytes,

    // Workflow metrics
    WorkflowStaleDiscarded,
    WorkflowResultsApplied,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::IngestionSuccess => "wizard_ingestion_success_total",
            MetricName::IngestionError => "wizard_ingestion_error_total",
            MetricName::IngestionRows => "wizard_ingestion_rows",

            MetricName::ValidationRejected => "wizard_validation_rejected_total",

            MetricName::GatewaySubmissions => "wizard_gateway_submissions_total",
            MetricName::GatewayAccepted => "wizard_gateway_accepted_total",
            MetricName::GatewayRejected => "wizard_gateway_rejected_total",
            MetricName::GatewayUnreachable => "wizard_gateway_unreachable_total",
            MetricName::GatewayBusy => "wizard_gateway_busy_total",
            MetricName::GatewayDuration => "wizard_gateway_duration_seconds",
            MetricName::GatewayArtifactBytes => "wizard_gateway_artifact_bytes",

            MetricName::WorkflowStaleDiscarded => "wizard_workflow_stale_discarded_total",
            MetricName::WorkflowResultsApplied => "wizard_workflow_results_applied_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            IngestionSuccess,
            IngestionError,
            IngestionRows,
            ValidationRejected,
            GatewaySubmissions,
            GatewayAccepted,
            GatewayRejected,
            GatewayUnreachable,
            GatewayBusy,
            GatewayDuration,
            GatewayArtifactBytes,
            WorkflowStaleDiscarded,
            WorkflowResultsApplied,
        ]
        .into_iter()
    }

    /// Returns (phase, description)
    pub fn metadata(&self) -> (&'static str, &'static str) {
        match self {
            MetricName::IngestionSuccess => ("ingestion", "Datasets ingested successfully"),
            MetricName::IngestionError => ("ingestion", "Failed ingestions by source kind"),
            MetricName::IngestionRows => ("ingestion", "Data rows per ingested dataset"),
            MetricName::ValidationRejected => ("request", "Submissions rejected by validation"),
            MetricName::GatewaySubmissions => ("gateway", "Submissions sent to the processing endpoint"),
            MetricName::GatewayAccepted => ("gateway", "Submissions answered with an artifact"),
            MetricName::GatewayRejected => ("gateway", "Submissions rejected by the processing service"),
            MetricName::GatewayUnreachable => ("gateway", "Submissions that never reached the service"),
            MetricName::GatewayBusy => ("gateway", "Submissions refused while another was in flight"),
            MetricName::GatewayDuration => ("gateway", "Round trip duration of a submission in seconds"),
            MetricName::GatewayArtifactBytes => ("gateway", "Size of returned artifacts in bytes"),
            MetricName::WorkflowStaleDiscarded => ("workflow", "Late responses discarded for a superseded dataset"),
            MetricName::WorkflowResultsApplied => ("workflow", "Results materialized into the review stage"),
        }
    }

    fn is_histogram(&self) -> bool {
        matches!(
            self,
            MetricName::IngestionRows | MetricName::GatewayDuration | MetricName::GatewayArtifactBytes
        )
    }
}

/// Register descriptions for every metric with the installed recorder.
pub fn describe_all() {
    for metric in MetricName::all_metrics() {
        let (_, description) = metric.metadata();
        if metric.is_histogram() {
            ::metrics::describe_histogram!(metric.as_str(), description);
        } else {
            ::metrics::describe_counter!(metric.as_str(), description);
        }
    }
}

pub mod ingestion {
    use super::MetricName;

    pub fn succeeded(source: &'static str, rows: usize) {
        ::metrics::counter!(MetricName::IngestionSuccess.as_str(), "source" => source).increment(1);
        ::metrics::histogram!(MetricName::IngestionRows.as_str(), "source" => source).record(rows as f64);
    }

    pub fn failed(source: &'static str) {
        ::metrics::counter!(MetricName::IngestionError.as_str(), "source" => source).increment(1);
    }
}

pub mod request {
    use super::MetricName;

    pub fn rejected() {
        ::metrics::counter!(MetricName::ValidationRejected.as_str()).increment(1);
    }
}

pub mod gateway {
    use super::MetricName;

    pub fn submitted() {
        ::metrics::counter!(MetricName::GatewaySubmissions.as_str()).increment(1);
    }

    pub fn accepted(artifact_bytes: usize, duration_secs: f64) {
        ::metrics::counter!(MetricName::GatewayAccepted.as_str()).increment(1);
        ::metrics::histogram!(MetricName::GatewayArtifactBytes.as_str()).record(artifact_bytes as f64);
        ::metrics::histogram!(MetricName::GatewayDuration.as_str()).record(duration_secs);
    }

    pub fn rejected(duration_secs: f64) {
        ::metrics::counter!(MetricName::GatewayRejected.as_str()).increment(1);
        ::metrics::histogram!(MetricName::GatewayDuration.as_str()).record(duration_secs);
    }

    pub fn unreachable() {
        ::metrics::counter!(MetricName::GatewayUnreachable.as_str()).increment(1);
    }

    pub fn busy() {
        ::metrics::counter!(MetricName::GatewayBusy.as_str()).increment(1);
    }
}

pub mod workflow {
    use super::MetricName;

    pub fn stale_discarded() {
        ::metrics::counter!(MetricName::WorkflowStaleDiscarded.as_str()).increment(1);
    }

    pub fn result_applied() {
        ::metrics::counter!(MetricName::WorkflowResultsApplied.as_str()).increment(1);
    }
}
