use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, PartialEq, Eq, Default)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum ContactStatus {
    #[default]
    NotContacted,
    Contacted,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::NotContacted => "not-contacted",
            ContactStatus::Contacted => "contacted",
        }
    }
}

/// Call-driven fields of a campaign candidate.
///
/// The three screening answers are tri-state: `None` means the candidate has
/// not been asked yet.
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Default)]
#[ts(export)]
pub struct CandidateContactOutcome {
    pub candidate_id: String,
    pub campaign_id: Option<String>,
    pub available_to_work: Option<bool>,
    pub interested: Option<bool>,
    pub knows_referee: Option<bool>,
    pub custom_responses: HashMap<String, String>,
    pub last_contact_at: Option<i64>,
    pub last_call_id: Option<String>,
    pub contact_status: ContactStatus,
}
