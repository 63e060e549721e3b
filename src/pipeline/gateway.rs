use crate::app::ports::ProcessingPort;
use crate::error::{GatewayError, Result};
use crate::observability::metrics;
use crate::pipeline::request::ProcessingRequest;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Raw bytes returned by the processing service, untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub submission_id: Uuid,
    pub bytes: Vec<u8>,
    pub received_at: DateTime<Utc>,
}

/// Sends processing requests and classifies how they failed.
///
/// Only one submission may be pending at a time. A second `submit` while one
/// is in flight is refused with `AlreadyInProgress` rather than queued.
pub struct ProcessingGateway {
    port: Arc<dyn ProcessingPort>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag however the submission ends, including when the
/// future is dropped before completing.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ProcessingGateway {
    pub fn new(port: Arc<dyn ProcessingPort>) -> Self {
        Self {
            port,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.in_flight))
    }

    #[instrument(skip(self, request), fields(rows = request.dataset().len(), main_column = %request.main_column()))]
    pub async fn submit(&self, request: &ProcessingRequest) -> Result<Artifact> {
        let Some(_guard) = self.try_acquire() else {
            warn!("Refusing submission while another one is pending");
            metrics::gateway::busy();
            return Err(GatewayError::AlreadyInProgress.into());
        };

        let submission_id = Uuid::new_v4();
        let payload = request.to_payload()?;
        info!(%submission_id, bytes = payload.file_bytes.len(), "📡 Submitting dataset for processing");
        metrics::gateway::submitted();
        let started = std::time::Instant::now();

        let response = match self.port.post(&payload).await {
            Ok(response) => response,
            Err(detail) => {
                error!(%submission_id, "Processing endpoint unreachable: {}", detail);
                metrics::gateway::unreachable();
                return Err(GatewayError::Unreachable(detail).into());
            }
        };
        let elapsed = started.elapsed().as_secs_f64();

        if !response.is_ok() {
            let body = String::from_utf8_lossy(&response.body).into_owned();
            let detail = if body.trim().is_empty() {
                format!("HTTP {}", response.status)
            } else {
                body
            };
            warn!(%submission_id, status = response.status, "Processing service rejected submission: {}", detail);
            metrics::gateway::rejected(elapsed);
            return Err(GatewayError::ServiceRejected(detail).into());
        }

        info!(%submission_id, bytes = response.body.len(), "✅ Received processed artifact in {:.2}s", elapsed);
        metrics::gateway::accepted(response.body.len(), elapsed);
        Ok(Artifact {
            submission_id,
            bytes: response.body,
            received_at: Utc::now(),
        })
    }
}
