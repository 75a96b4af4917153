use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

/// Lifecycle status of one outbound call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum CallStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl CallStatus {
    /// Completed and Failed never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallStatus::Completed | CallStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Pending => "pending",
            CallStatus::InProgress => "in-progress",
            CallStatus::Completed => "completed",
            CallStatus::Failed => "failed",
        }
    }
}

/// Durable state of one call, keyed by the provider's call id
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
#[ts(export)]
pub struct CallRecord {
    pub call_id: String,
    pub status: CallStatus,
    pub campaign_id: Option<String>,
    pub candidate_id: Option<String>,
    pub started_at: Option<i64>, // Unix timestamp
    pub ended_at: Option<i64>,
    pub duration_seconds: Option<i64>,
    pub error_message: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Result of one provider analysis, written at most once per call
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
#[ts(export)]
pub struct CallAnalysisRecord {
    pub id: i64,
    pub call_id: String,
    pub campaign_id: Option<String>,
    pub candidate_id: Option<String>,
    pub available_to_work: bool,
    pub interested: bool,
    pub knows_referee: bool,
    pub custom_answers: HashMap<String, String>,
    pub summary: String,
    pub sentiment: f64,
    pub key_points: Vec<String>,
    pub objections: Option<Vec<String>>,
    pub next_steps: Option<String>,
    pub transcript_url: Option<String>,
    pub recording_url: Option<String>,
    pub analyzed_at: i64,
    pub created_at: i64,
}

/// Which records a single event touched
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
pub struct ProcessingResult {
    pub call_record_updated: bool,
    pub analysis_record_created: bool,
    pub candidate_updated: bool,
}

impl ProcessingResult {
    pub fn touched_anything(&self) -> bool {
        self.call_record_updated || self.analysis_record_created || self.candidate_updated
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct CallsResponse {
    pub calls: Vec<CallRecord>,
}
