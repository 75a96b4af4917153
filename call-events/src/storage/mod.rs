pub mod memory;

pub use memory::MemoryCallStore;

use anyhow::Result;
use shared_types::{CallRecord, CandidateContactOutcome};
use std::collections::HashMap;
use std::sync::Arc;

use crate::event::{CallAnalysis, CallEvent};
use crate::transition::CallRecordUpdate;

/// Analysis fields to persist for one call
#[derive(Debug, Clone, PartialEq)]
pub struct NewCallAnalysis {
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
}

impl NewCallAnalysis {
    pub fn from_event(event: &CallEvent, analysis: &CallAnalysis) -> Self {
        Self {
            call_id: event.call_id.clone(),
            campaign_id: event.campaign_id.clone(),
            candidate_id: event.candidate_id.clone(),
            available_to_work: analysis.answers.available_to_work,
            interested: analysis.answers.interested,
            knows_referee: analysis.answers.knows_referee,
            custom_answers: analysis.custom_answers.clone(),
            summary: analysis.summary.clone(),
            sentiment: analysis.sentiment,
            key_points: analysis.key_points.clone(),
            objections: analysis.objections.clone(),
            next_steps: analysis.next_steps.clone(),
            transcript_url: analysis.transcript_url.clone(),
            recording_url: analysis.recording_url.clone(),
            analyzed_at: event.occurred_at,
        }
    }
}

/// Persistence boundary of the call event processor.
///
/// Implementations own row-level atomicity: `upsert_call_record` must apply
/// the update as one read-modify-write that never moves a terminal status
/// (see `transition::apply_update`).
pub trait CallStore: Send + Sync {
    fn get_call_record(&self, call_id: &str) -> Result<Option<CallRecord>>;

    fn upsert_call_record(&self, call_id: &str, update: &CallRecordUpdate) -> Result<()>;

    /// Returns false when an analysis already exists for the call
    fn insert_analysis_record(&self, analysis: &NewCallAnalysis) -> Result<bool>;

    fn get_candidate_outcome(&self, candidate_id: &str) -> Result<Option<CandidateContactOutcome>>;

    /// Upsert. A `None` campaign id keeps the stored one.
    fn update_candidate_outcome(
        &self,
        candidate_id: &str,
        outcome: &CandidateContactOutcome,
    ) -> Result<()>;
}

impl<T: CallStore + ?Sized> CallStore for Arc<T> {
    fn get_call_record(&self, call_id: &str) -> Result<Option<CallRecord>> {
        (**self).get_call_record(call_id)
    }

    fn upsert_call_record(&self, call_id: &str, update: &CallRecordUpdate) -> Result<()> {
        (**self).upsert_call_record(call_id, update)
    }

    fn insert_analysis_record(&self, analysis: &NewCallAnalysis) -> Result<bool> {
        (**self).insert_analysis_record(analysis)
    }

    fn get_candidate_outcome(&self, candidate_id: &str) -> Result<Option<CandidateContactOutcome>> {
        (**self).get_candidate_outcome(candidate_id)
    }

    fn update_candidate_outcome(
        &self,
        candidate_id: &str,
        outcome: &CandidateContactOutcome,
    ) -> Result<()> {
        (**self).update_candidate_outcome(candidate_id, outcome)
    }
}
