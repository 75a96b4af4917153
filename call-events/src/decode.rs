//! Translation of provider webhook bodies into [`CallEvent`]s.
//!
//! The provider reports screening answers as a positional array. That format is
//! confined to this module: everything downstream sees [`ScreeningAnswers`].

use std::collections::HashMap;

use chrono::DateTime;
use serde_json::Value;
use shared_types::webhook::{
    CallWebhookAnalysis, CallWebhookPayload, WebhookTimestamp, CALL_ANALYZED, CALL_ENDED,
    CALL_FAILED, CALL_STARTED,
};

use crate::error::CallEventError;
use crate::event::{CallAnalysis, CallEvent, CallEventKind, ScreeningAnswers};

pub const DEFAULT_SENTIMENT: f64 = 0.5;

// Unix times above this are milliseconds
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Parse the raw request body
pub fn parse_payload(body: &[u8]) -> Result<CallWebhookPayload, CallEventError> {
    serde_json::from_slice(body)
        .map_err(|e| CallEventError::invalid(format!("unreadable webhook body: {e}")))
}

/// Parse and decode in one step. `received_at` stands in for a missing timestamp.
pub fn decode_body(body: &[u8], received_at: i64) -> Result<CallEvent, CallEventError> {
    let payload = parse_payload(body)?;
    decode_payload(&payload, received_at)
}

pub fn decode_payload(
    payload: &CallWebhookPayload,
    received_at: i64,
) -> Result<CallEvent, CallEventError> {
    let call_id = payload
        .call_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CallEventError::invalid("missing call_id"))?
        .to_string();

    let kind = match payload.event_type.as_str() {
        CALL_STARTED => CallEventKind::Started,
        CALL_ENDED => CallEventKind::Ended {
            duration_seconds: decode_duration(payload.duration, &call_id)?,
        },
        CALL_ANALYZED => {
            let analysis = payload.analysis.as_ref().ok_or_else(|| {
                CallEventError::invalid(format!("{CALL_ANALYZED} for {call_id} has no analysis"))
            })?;
            CallEventKind::Analyzed(decode_analysis(analysis, payload)?)
        }
        CALL_FAILED => CallEventKind::Failed {
            error_message: non_empty(payload.error.as_deref()),
        },
        other => return Err(CallEventError::UnhandledEventType(other.to_string())),
    };

    let occurred_at = match &payload.timestamp {
        Some(timestamp) => decode_timestamp(timestamp)?,
        None => received_at,
    };

    let metadata = payload.metadata.clone().unwrap_or_default();

    Ok(CallEvent {
        call_id,
        occurred_at,
        campaign_id: non_empty(metadata.campaign_id.as_deref()),
        candidate_id: non_empty(metadata.candidate_id.as_deref()),
        kind,
    })
}

/// Positional legacy format: index 0 available, 1 interested, 2 knows referee
pub fn screening_answers(answers: &[Value]) -> ScreeningAnswers {
    ScreeningAnswers {
        available_to_work: answer_is_true(answers.first()),
        interested: answer_is_true(answers.get(1)),
        knows_referee: answer_is_true(answers.get(2)),
    }
}

/// Only JSON `true` and the exact string "true" count as yes
pub fn answer_is_true(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

pub fn decode_timestamp(timestamp: &WebhookTimestamp) -> Result<i64, CallEventError> {
    match timestamp {
        WebhookTimestamp::Unix(value) => Ok(normalize_unix(*value)),
        WebhookTimestamp::UnixFloat(value) if value.is_finite() => {
            Ok(normalize_unix(value.trunc() as i64))
        }
        WebhookTimestamp::UnixFloat(value) => {
            Err(CallEventError::invalid(format!("timestamp {value} is not finite")))
        }
        WebhookTimestamp::Text(text) => DateTime::parse_from_rfc3339(text.trim())
            .map(|dt| dt.timestamp())
            .map_err(|e| CallEventError::invalid(format!("bad timestamp {text:?}: {e}"))),
    }
}

fn normalize_unix(value: i64) -> i64 {
    if value.abs() >= MILLIS_THRESHOLD {
        value / 1000
    } else {
        value
    }
}

fn decode_duration(duration: Option<f64>, call_id: &str) -> Result<Option<i64>, CallEventError> {
    match duration {
        None => Ok(None),
        Some(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(Some(seconds.round() as i64)),
        Some(seconds) => Err(CallEventError::invalid(format!(
            "duration {seconds} for call {call_id} is not a non-negative number"
        ))),
    }
}

fn decode_analysis(
    analysis: &CallWebhookAnalysis,
    payload: &CallWebhookPayload,
) -> Result<CallAnalysis, CallEventError> {
    let sentiment = analysis.sentiment.unwrap_or(DEFAULT_SENTIMENT);
    if !(0.0..=1.0).contains(&sentiment) {
        return Err(CallEventError::invalid(format!(
            "sentiment {sentiment} outside 0.0..=1.0"
        )));
    }

    Ok(CallAnalysis {
        answers: screening_answers(&analysis.answers),
        custom_answers: custom_answers(&analysis.custom_answers),
        summary: analysis.summary.clone().unwrap_or_default(),
        sentiment,
        key_points: analysis.key_points.clone(),
        objections: analysis.objections.clone(),
        next_steps: non_empty(analysis.next_steps.as_deref()),
        transcript_url: non_empty(payload.transcript_url.as_deref()),
        recording_url: non_empty(payload.recording_url.as_deref()),
    })
}

// Providers occasionally send numbers or booleans as custom answers
fn custom_answers(raw: &HashMap<String, Value>) -> HashMap<String, String> {
    raw.iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), text))
        })
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
