use call_events::{decode, CallEventError, CallEventProcessor, CandidateOutcomePolicy};
use shared_types::{DeliveryStatus, ProcessingResult, WebhookDelivery};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::database::deliveries::{self, NewDelivery};
use crate::database::{Database, DbConnection, SqliteCallStore};

/// What could be read from a body, plus the processing result
pub struct IngestOutcome {
    pub call_id: Option<String>,
    pub event_type: Option<String>,
    pub result: Result<ProcessingResult, CallEventError>,
}

impl IngestOutcome {
    pub fn delivery_status(&self) -> DeliveryStatus {
        delivery_status(&self.result)
    }
}

pub fn delivery_status(result: &Result<ProcessingResult, CallEventError>) -> DeliveryStatus {
    match result {
        Ok(_) => DeliveryStatus::Processed,
        Err(CallEventError::UnhandledEventType(_)) => DeliveryStatus::Ignored,
        Err(CallEventError::InvalidEvent(_)) => DeliveryStatus::Invalid,
        Err(CallEventError::Persistence { .. }) => DeliveryStatus::Failed,
    }
}

/// Decodes webhook bodies, runs them through the processor and keeps the
/// delivery log. Synchronous; the HTTP layer calls it from `web::block`.
pub struct CallWebhookIngestor {
    processor: CallEventProcessor<SqliteCallStore>,
    db: DbConnection,
    record_deliveries: bool,
    retention_days: u32,
    last_pruned_at: AtomicI64,
}

const SECONDS_PER_DAY: i64 = 86_400;
const PRUNE_INTERVAL_SECONDS: i64 = 3_600;

impl CallWebhookIngestor {
    pub fn new(db: &Database, policy: CandidateOutcomePolicy, record_deliveries: bool) -> Self {
        Self {
            processor: CallEventProcessor::with_policy(db.call_store(), policy),
            db: db.connection.clone(),
            record_deliveries,
            retention_days: 0,
            last_pruned_at: AtomicI64::new(i64::MIN),
        }
    }

    /// Delete recorded deliveries older than `days` as new ones arrive. 0 keeps all.
    pub fn with_retention(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    /// Prune the delivery log if retention is set and the last prune was over
    /// an hour ago. Returns the number of rows deleted.
    pub fn prune_deliveries(&self, now: i64) -> anyhow::Result<usize> {
        if self.retention_days == 0 {
            return Ok(0);
        }

        let last = self.last_pruned_at.load(Ordering::SeqCst);
        if now.saturating_sub(last) < PRUNE_INTERVAL_SECONDS
            || self
                .last_pruned_at
                .compare_exchange(last, now, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
        {
            return Ok(0);
        }

        let cutoff = now - i64::from(self.retention_days) * SECONDS_PER_DAY;
        let conn = self.db.get()?;
        let deleted = deliveries::prune_deliveries(&conn, cutoff)?;
        if deleted > 0 {
            tracing::info!(deleted, cutoff, "Pruned old webhook deliveries");
        }
        Ok(deleted)
    }

    /// Handle one webhook delivery
    pub fn ingest(&self, body: &[u8], received_at: i64) -> Result<ProcessingResult, CallEventError> {
        let outcome = self.process_body(body, received_at);
        log_outcome(&outcome);

        if self.record_deliveries {
            self.record_delivery(body, received_at, &outcome);
            if let Err(e) = self.prune_deliveries(received_at) {
                tracing::warn!("Failed to prune webhook deliveries: {:#}", e);
            }
        }

        outcome.result
    }

    /// Decode and process without touching the delivery log
    pub fn process_body(&self, body: &[u8], received_at: i64) -> IngestOutcome {
        let payload = match decode::parse_payload(body) {
            Ok(payload) => payload,
            Err(e) => {
                return IngestOutcome {
                    call_id: None,
                    event_type: None,
                    result: Err(e),
                }
            }
        };

        let call_id = payload.call_id.clone();
        let event_type = Some(payload.event_type.clone());

        let result = decode::decode_payload(&payload, received_at)
            .and_then(|event| self.processor.process_event(&event));

        IngestOutcome {
            call_id,
            event_type,
            result,
        }
    }

    /// Run a stored delivery again and record its new status
    pub fn replay_delivery(
        &self,
        delivery: &WebhookDelivery,
    ) -> Result<ProcessingResult, CallEventError> {
        let outcome = self.process_body(delivery.payload.as_bytes(), delivery.received_at);
        log_outcome(&outcome);

        let status = outcome.delivery_status();
        let error = outcome.result.as_ref().err().map(|e| e.to_string());
        let now = chrono::Utc::now().timestamp();

        self.db
            .get()
            .and_then(|conn| {
                deliveries::update_delivery_status(
                    &conn,
                    delivery.id,
                    status,
                    error.as_deref(),
                    now,
                )
            })
            .map_err(|e| {
                CallEventError::persistence(
                    format!("marking delivery {} {}", delivery.id, status.as_str()),
                    e,
                )
            })?;

        outcome.result
    }

    pub fn processor(&self) -> &CallEventProcessor<SqliteCallStore> {
        &self.processor
    }

    fn record_delivery(&self, body: &[u8], received_at: i64, outcome: &IngestOutcome) {
        let payload = String::from_utf8_lossy(body);
        let delivery = NewDelivery {
            call_id: outcome.call_id.as_deref(),
            event_type: outcome.event_type.as_deref(),
            status: outcome.delivery_status(),
            error: outcome.result.as_ref().err().map(|e| e.to_string()),
            payload: &payload,
            received_at,
            processed_at: chrono::Utc::now().timestamp(),
        };

        let recorded = self
            .db
            .get()
            .and_then(|conn| deliveries::insert_delivery(&conn, &delivery));

        if let Err(e) = recorded {
            tracing::warn!(
                call_id = ?outcome.call_id,
                "Failed to record webhook delivery: {:#}",
                e
            );
        }
    }
}

fn log_outcome(outcome: &IngestOutcome) {
    let call_id = outcome.call_id.as_deref().unwrap_or("-");
    let event_type = outcome.event_type.as_deref().unwrap_or("-");

    match &outcome.result {
        Ok(result) => tracing::debug!(
            call_id,
            event_type,
            touched = result.touched_anything(),
            "Call webhook applied"
        ),
        Err(e @ CallEventError::UnhandledEventType(_)) => {
            tracing::info!(call_id, event_type, "Ignoring call webhook: {}", e)
        }
        Err(e @ CallEventError::InvalidEvent(_)) => {
            tracing::warn!(call_id, event_type, "Rejected call webhook: {}", e)
        }
        Err(e @ CallEventError::Persistence { .. }) => {
            tracing::error!(call_id, event_type, "Call webhook not persisted: {}", e)
        }
    }
}
