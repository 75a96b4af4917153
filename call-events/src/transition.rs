//! Pure call-record state machine.
//!
//! `plan_call_update` decides what an event writes given the prior record;
//! `apply_update` is the guarded merge every store must perform atomically.

use shared_types::{CallRecord, CallStatus};

use crate::event::{CallEvent, CallEventKind};

pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Fields to write for one call. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallRecordUpdate {
    pub status: Option<CallStatus>,
    pub campaign_id: Option<String>,
    pub candidate_id: Option<String>,
    pub started_at: Option<i64>,
    pub ended_at: Option<i64>,
    pub duration_seconds: Option<i64>,
    pub error_message: Option<String>,
}

impl CallRecordUpdate {
    /// True when writing this update would not change `record`
    pub fn is_noop_for(&self, record: &CallRecord) -> bool {
        let status_unchanged = match self.status {
            None => true,
            Some(status) => !status_advances(record.status, status),
        };

        status_unchanged
            && same_or_unset(&self.campaign_id, &record.campaign_id)
            && same_or_unset(&self.candidate_id, &record.candidate_id)
            && same_or_unset(&self.started_at, &record.started_at)
            && same_or_unset(&self.ended_at, &record.ended_at)
            && same_or_unset(&self.duration_seconds, &record.duration_seconds)
            && same_or_unset(&self.error_message, &record.error_message)
    }
}

fn same_or_unset<T: PartialEq>(update: &Option<T>, current: &Option<T>) -> bool {
    update.is_none() || update == current
}

fn rank(status: CallStatus) -> u8 {
    match status {
        CallStatus::Pending => 0,
        CallStatus::InProgress => 1,
        CallStatus::Completed | CallStatus::Failed => 2,
    }
}

/// Status only moves forward, and never out of a terminal state
pub fn status_advances(current: CallStatus, next: CallStatus) -> bool {
    !current.is_terminal() && rank(next) > rank(current)
}

/// Work out the write an event implies. `None` means nothing to do.
///
/// Analyzed events never touch the call record.
pub fn plan_call_update(prior: Option<&CallRecord>, event: &CallEvent) -> Option<CallRecordUpdate> {
    let terminal = prior.map(|r| r.status.is_terminal()).unwrap_or(false);
    let completed = prior.map(|r| r.status == CallStatus::Completed).unwrap_or(false);
    let unset = |field: fn(&CallRecord) -> bool| prior.map(|r| !field(r)).unwrap_or(true);

    let mut update = match &event.kind {
        CallEventKind::Analyzed(_) => return None,
        CallEventKind::Started if terminal => CallRecordUpdate {
            started_at: unset(|r| r.started_at.is_some()).then_some(event.occurred_at),
            ..Default::default()
        },
        CallEventKind::Started => CallRecordUpdate {
            status: Some(CallStatus::InProgress),
            started_at: Some(event.occurred_at),
            ..Default::default()
        },
        CallEventKind::Ended { duration_seconds } if terminal => CallRecordUpdate {
            ended_at: unset(|r| r.ended_at.is_some()).then_some(event.occurred_at),
            duration_seconds: (completed && unset(|r| r.duration_seconds.is_some()))
                .then(|| duration_seconds.unwrap_or(0)),
            ..Default::default()
        },
        CallEventKind::Ended { duration_seconds } => CallRecordUpdate {
            status: Some(CallStatus::Completed),
            ended_at: Some(event.occurred_at),
            duration_seconds: Some(duration_seconds.unwrap_or(0)),
            ..Default::default()
        },
        CallEventKind::Failed { error_message } if terminal => CallRecordUpdate {
            ended_at: unset(|r| r.ended_at.is_some()).then_some(event.occurred_at),
            error_message: (!completed && unset(|r| r.error_message.is_some()))
                .then(|| error_text(error_message)),
            ..Default::default()
        },
        CallEventKind::Failed { error_message } => CallRecordUpdate {
            status: Some(CallStatus::Failed),
            ended_at: Some(event.occurred_at),
            error_message: Some(error_text(error_message)),
            ..Default::default()
        },
    };

    // First non-empty context wins
    if unset(|r| r.campaign_id.is_some()) {
        update.campaign_id = event.campaign_id.clone();
    }
    if unset(|r| r.candidate_id.is_some()) {
        update.candidate_id = event.candidate_id.clone();
    }

    match prior {
        Some(record) if update.is_noop_for(record) => None,
        _ => Some(update),
    }
}

fn error_text(error_message: &Option<String>) -> String {
    error_message
        .clone()
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

/// Merge an update into the stored record, creating it when absent.
///
/// Once the stored record is terminal its data fields are only filled, never
/// replaced. A completed call never takes an error message and a failed call
/// never takes a duration, so an update planned from a stale prior cannot mix
/// the details of two different endings.
pub fn apply_update(
    existing: Option<CallRecord>,
    call_id: &str,
    update: &CallRecordUpdate,
    now: i64,
) -> CallRecord {
    let mut record = existing.unwrap_or_else(|| CallRecord {
        call_id: call_id.to_string(),
        status: CallStatus::Pending,
        campaign_id: None,
        candidate_id: None,
        started_at: None,
        ended_at: None,
        duration_seconds: None,
        error_message: None,
        created_at: now,
        updated_at: now,
    });

    let was_terminal = record.status.is_terminal();

    if let Some(status) = update.status {
        if status_advances(record.status, status) {
            record.status = status;
        }
    }

    if let Some(campaign_id) = &update.campaign_id {
        record.campaign_id = Some(campaign_id.clone());
    }
    if let Some(candidate_id) = &update.candidate_id {
        record.candidate_id = Some(candidate_id.clone());
    }
    merge_field(&mut record.started_at, &update.started_at, was_terminal);
    merge_field(&mut record.ended_at, &update.ended_at, was_terminal);
    if !was_terminal || record.status == CallStatus::Completed {
        merge_field(&mut record.duration_seconds, &update.duration_seconds, was_terminal);
    }
    if !was_terminal || record.status == CallStatus::Failed {
        merge_field(&mut record.error_message, &update.error_message, was_terminal);
    }

    record.updated_at = now;
    record
}

fn merge_field<T: Clone>(current: &mut Option<T>, update: &Option<T>, fill_only: bool) {
    if update.is_none() || (fill_only && current.is_some()) {
        return;
    }
    *current = update.clone();
}
