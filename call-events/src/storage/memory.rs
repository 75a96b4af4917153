use super::{CallStore, NewCallAnalysis};
use crate::transition::{apply_update, CallRecordUpdate};
use anyhow::{anyhow, Result};
use shared_types::{CallAnalysisRecord, CallRecord, CandidateContactOutcome};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    calls: HashMap<String, CallRecord>,
    analyses: HashMap<String, CallAnalysisRecord>,
    candidates: HashMap<String, CandidateContactOutcome>,
    next_analysis_id: i64,
}

/// In-process store. One mutex serializes every read-modify-write.
#[derive(Default)]
pub struct MemoryCallStore {
    state: Mutex<MemoryState>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryCallStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, to exercise persistence errors
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful write operations so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn analysis_count(&self) -> usize {
        self.lock().map(|state| state.analyses.len()).unwrap_or(0)
    }

    pub fn get_analysis(&self, call_id: &str) -> Result<Option<CallAnalysisRecord>> {
        Ok(self.lock()?.analyses.get(call_id).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("memory call store lock poisoned"))
    }

    fn begin_write(&self) -> Result<MutexGuard<'_, MemoryState>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("memory call store is rejecting writes"));
        }
        self.lock()
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

impl CallStore for MemoryCallStore {
    fn get_call_record(&self, call_id: &str) -> Result<Option<CallRecord>> {
        Ok(self.lock()?.calls.get(call_id).cloned())
    }

    fn upsert_call_record(&self, call_id: &str, update: &CallRecordUpdate) -> Result<()> {
        let mut state = self.begin_write()?;
        let existing = state.calls.remove(call_id);
        let record = apply_update(existing, call_id, update, Self::now());
        state.calls.insert(call_id.to_string(), record);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn insert_analysis_record(&self, analysis: &NewCallAnalysis) -> Result<bool> {
        let mut state = self.begin_write()?;
        if state.analyses.contains_key(&analysis.call_id) {
            return Ok(false);
        }

        state.next_analysis_id += 1;
        let record = CallAnalysisRecord {
            id: state.next_analysis_id,
            call_id: analysis.call_id.clone(),
            campaign_id: analysis.campaign_id.clone(),
            candidate_id: analysis.candidate_id.clone(),
            available_to_work: analysis.available_to_work,
            interested: analysis.interested,
            knows_referee: analysis.knows_referee,
            custom_answers: analysis.custom_answers.clone(),
            summary: analysis.summary.clone(),
            sentiment: analysis.sentiment,
            key_points: analysis.key_points.clone(),
            objections: analysis.objections.clone(),
            next_steps: analysis.next_steps.clone(),
            transcript_url: analysis.transcript_url.clone(),
            recording_url: analysis.recording_url.clone(),
            analyzed_at: analysis.analyzed_at,
            created_at: Self::now(),
        };
        state.analyses.insert(analysis.call_id.clone(), record);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    fn get_candidate_outcome(&self, candidate_id: &str) -> Result<Option<CandidateContactOutcome>> {
        Ok(self.lock()?.candidates.get(candidate_id).cloned())
    }

    fn update_candidate_outcome(
        &self,
        candidate_id: &str,
        outcome: &CandidateContactOutcome,
    ) -> Result<()> {
        let mut state = self.begin_write()?;
        let mut stored = outcome.clone();
        stored.candidate_id = candidate_id.to_string();
        if stored.campaign_id.is_none() {
            stored.campaign_id = state
                .candidates
                .get(candidate_id)
                .and_then(|c| c.campaign_id.clone());
        }
        state.candidates.insert(candidate_id.to_string(), stored);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
