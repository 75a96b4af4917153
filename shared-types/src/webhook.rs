use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

pub const CALL_STARTED: &str = "call.started";
pub const CALL_ENDED: &str = "call.ended";
pub const CALL_ANALYZED: &str = "call.analyzed";
pub const CALL_FAILED: &str = "call.failed";

/// Body posted by the voice provider for every call lifecycle callback.
///
/// Everything except `type` is optional on the wire; shape checks happen
/// when the payload is decoded into a call event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallWebhookPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<WebhookTimestamp>,
    #[serde(default)]
    pub metadata: Option<CallWebhookMetadata>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub analysis: Option<CallWebhookAnalysis>,
    #[serde(default)]
    pub transcript_url: Option<String>,
    #[serde(default)]
    pub recording_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Providers send either RFC 3339 text or a unix time (seconds or millis)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WebhookTimestamp {
    Unix(i64),
    UnixFloat(f64),
    Text(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallWebhookMetadata {
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub candidate_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallWebhookAnalysis {
    /// Positional screening answers: available to work, interested, knows referee
    #[serde(default)]
    pub answers: Vec<serde_json::Value>,
    #[serde(default)]
    pub custom_answers: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub sentiment: Option<f64>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub objections: Option<Vec<String>>,
    #[serde(default)]
    pub next_steps: Option<String>,
}

/// Acknowledgement returned to the provider
#[derive(Debug, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
pub struct WebhookAck {
    pub received: bool,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self { received: true }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    Processed,
    Ignored,
    Invalid,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Processed => "processed",
            DeliveryStatus::Ignored => "ignored",
            DeliveryStatus::Invalid => "invalid",
            DeliveryStatus::Failed => "failed",
        }
    }
}

/// One received webhook body and what happened to it
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WebhookDelivery {
    pub id: i64,
    pub call_id: Option<String>,
    pub event_type: Option<String>,
    pub status: DeliveryStatus,
    pub error: Option<String>,
    pub payload: String,
    pub received_at: i64,
    pub processed_at: Option<i64>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct WebhookDeliveriesResponse {
    pub deliveries: Vec<WebhookDelivery>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_payload() {
        let payload: CallWebhookPayload =
            serde_json::from_str(r#"{"type": "call.started", "call_id": "call_1"}"#).unwrap();

        assert_eq!(payload.event_type, CALL_STARTED);
        assert_eq!(payload.call_id.as_deref(), Some("call_1"));
        assert!(payload.metadata.is_none());
        assert!(payload.analysis.is_none());
    }

    #[test]
    fn test_analyzed_payload() {
        let json = r#"{
            "type": "call.analyzed",
            "call_id": "call_1",
            "timestamp": "2026-03-01T10:00:00Z",
            "metadata": {"campaign_id": "camp_1", "candidate_id": "c9"},
            "analysis": {
                "answers": ["true", false, true],
                "custom_answers": {"shift": "night", "years": 4},
                "summary": "Keen to start",
                "sentiment": 0.8,
                "key_points": ["available monday"]
            },
            "transcript_url": "https://example.com/t/1"
        }"#;

        let payload: CallWebhookPayload = serde_json::from_str(json).unwrap();
        let analysis = payload.analysis.unwrap();

        assert_eq!(
            payload.timestamp,
            Some(WebhookTimestamp::Text("2026-03-01T10:00:00Z".to_string()))
        );
        assert_eq!(analysis.answers.len(), 3);
        assert_eq!(analysis.custom_answers.len(), 2);
        assert!(analysis.objections.is_none());
        assert_eq!(
            payload.metadata.unwrap().candidate_id.as_deref(),
            Some("c9")
        );
    }

    #[test]
    fn test_timestamp_variants() {
        let secs: WebhookTimestamp = serde_json::from_str("1767225600").unwrap();
        assert_eq!(secs, WebhookTimestamp::Unix(1767225600));

        let float: WebhookTimestamp = serde_json::from_str("1767225600.5").unwrap();
        assert_eq!(float, WebhookTimestamp::UnixFloat(1767225600.5));
    }

    #[test]
    fn test_ack_shape() {
        let json = serde_json::to_string(&WebhookAck::received()).unwrap();
        assert_eq!(json, r#"{"received":true}"#);
    }

    #[test]
    fn test_delivery_status_serialization() {
        let json = serde_json::to_string(&DeliveryStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
        assert_eq!(DeliveryStatus::Ignored.as_str(), "ignored");
    }
}
