use serde::{Deserialize, Serialize};

pub mod call;
pub mod candidate;
pub mod webhook;

pub use call::{CallAnalysisRecord, CallRecord, CallStatus, CallsResponse, ProcessingResult};
pub use candidate::{CandidateContactOutcome, ContactStatus};
pub use webhook::{
    CallWebhookAnalysis, CallWebhookMetadata, CallWebhookPayload, DeliveryStatus, WebhookAck,
    WebhookDeliveriesResponse, WebhookDelivery, WebhookTimestamp,
};

/// Error response for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
