use shared_types::ProcessingResult;
use tracing::{debug, info};

use crate::error::CallEventError;
use crate::event::{CallAnalysis, CallEvent, CallEventKind};
use crate::outcome::{next_outcome, CandidateOutcomePolicy};
use crate::storage::{CallStore, NewCallAnalysis};
use crate::transition::plan_call_update;

/// Applies call lifecycle events to call records, analyses and candidates.
///
/// Holds no mutable state of its own, so one processor can serve concurrent
/// requests; atomicity of each write is the store's job.
pub struct CallEventProcessor<S> {
    store: S,
    policy: CandidateOutcomePolicy,
}

impl<S: CallStore> CallEventProcessor<S> {
    pub fn new(store: S) -> Self {
        Self::with_policy(store, CandidateOutcomePolicy::default())
    }

    pub fn with_policy(store: S, policy: CandidateOutcomePolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> CandidateOutcomePolicy {
        self.policy
    }

    /// Apply one event. Safe to call again with the same event.
    pub fn process_event(&self, event: &CallEvent) -> Result<ProcessingResult, CallEventError> {
        event.validate()?;

        let mut result = ProcessingResult::default();
        match &event.kind {
            CallEventKind::Analyzed(analysis) => {
                result.analysis_record_created = self.record_analysis(event, analysis)?;
                result.candidate_updated = self.update_candidate(event, analysis)?;
            }
            _ => {
                result.call_record_updated = self.apply_call_transition(event)?;
            }
        }

        info!(
            call_id = %event.call_id,
            event_type = event.event_type(),
            call_record_updated = result.call_record_updated,
            analysis_record_created = result.analysis_record_created,
            candidate_updated = result.candidate_updated,
            "Processed call event"
        );

        Ok(result)
    }

    fn apply_call_transition(&self, event: &CallEvent) -> Result<bool, CallEventError> {
        let prior = self
            .store
            .get_call_record(&event.call_id)
            .map_err(|e| {
                CallEventError::persistence(format!("reading call record {}", event.call_id), e)
            })?;

        if let Some(record) = &prior {
            if record.status.is_terminal() {
                debug!(
                    call_id = %event.call_id,
                    status = record.status.as_str(),
                    event_type = event.event_type(),
                    "Call already terminal, status left unchanged"
                );
            }
        }

        let Some(update) = plan_call_update(prior.as_ref(), event) else {
            debug!(call_id = %event.call_id, "Duplicate event, call record unchanged");
            return Ok(false);
        };

        self.store
            .upsert_call_record(&event.call_id, &update)
            .map_err(|e| {
                CallEventError::persistence(
                    format!("upserting call record {} for {}", event.call_id, event.event_type()),
                    e,
                )
            })?;

        Ok(true)
    }

    fn record_analysis(
        &self,
        event: &CallEvent,
        analysis: &CallAnalysis,
    ) -> Result<bool, CallEventError> {
        let created = self
            .store
            .insert_analysis_record(&NewCallAnalysis::from_event(event, analysis))
            .map_err(|e| {
                CallEventError::persistence(
                    format!("inserting analysis for call {}", event.call_id),
                    e,
                )
            })?;

        if !created {
            debug!(call_id = %event.call_id, "Analysis already recorded, keeping the first one");
        }
        Ok(created)
    }

    fn update_candidate(
        &self,
        event: &CallEvent,
        analysis: &CallAnalysis,
    ) -> Result<bool, CallEventError> {
        let Some(candidate_id) = event.candidate_id.as_deref() else {
            debug!(call_id = %event.call_id, "Analysis has no candidate, skipping outcome update");
            return Ok(false);
        };

        let prior = if self.policy.needs_prior() {
            self.store.get_candidate_outcome(candidate_id).map_err(|e| {
                CallEventError::persistence(
                    format!("reading outcome for candidate {candidate_id}"),
                    e,
                )
            })?
        } else {
            None
        };

        let outcome = next_outcome(self.policy, prior.as_ref(), candidate_id, event, analysis);
        self.store
            .update_candidate_outcome(candidate_id, &outcome)
            .map_err(|e| {
                CallEventError::persistence(
                    format!("updating outcome for candidate {candidate_id}"),
                    e,
                )
            })?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ScreeningAnswers;
    use crate::storage::MemoryCallStore;
    use crate::transition::UNKNOWN_ERROR;
    use shared_types::{CallStatus, ContactStatus};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn processor() -> CallEventProcessor<MemoryCallStore> {
        CallEventProcessor::new(MemoryCallStore::new())
    }

    fn started(call_id: &str, at: i64) -> CallEvent {
        CallEvent::new(call_id, at, CallEventKind::Started)
    }

    fn ended(call_id: &str, at: i64, duration: Option<i64>) -> CallEvent {
        CallEvent::new(
            call_id,
            at,
            CallEventKind::Ended {
                duration_seconds: duration,
            },
        )
    }

    fn failed(call_id: &str, at: i64, error: Option<&str>) -> CallEvent {
        CallEvent::new(
            call_id,
            at,
            CallEventKind::Failed {
                error_message: error.map(str::to_string),
            },
        )
    }

    fn analyzed(call_id: &str, at: i64, answers: [bool; 3]) -> CallEvent {
        let analysis = CallAnalysis {
            answers: ScreeningAnswers {
                available_to_work: answers[0],
                interested: answers[1],
                knows_referee: answers[2],
            },
            summary: "Screening complete".to_string(),
            custom_answers: HashMap::from([("shift".to_string(), "night".to_string())]),
            ..Default::default()
        };
        CallEvent::new(call_id, at, CallEventKind::Analyzed(analysis))
    }

    fn status(processor: &CallEventProcessor<MemoryCallStore>, call_id: &str) -> CallStatus {
        processor
            .store()
            .get_call_record(call_id)
            .unwrap()
            .expect("call record should exist")
            .status
    }

    #[test]
    fn test_full_lifecycle() {
        let processor = processor();

        let result = processor.process_event(&started("call_1", 100)).unwrap();
        assert!(result.call_record_updated);
        assert_eq!(status(&processor, "call_1"), CallStatus::InProgress);

        processor.process_event(&ended("call_1", 142, Some(42))).unwrap();
        let record = processor.store().get_call_record("call_1").unwrap().unwrap();
        assert_eq!(record.status, CallStatus::Completed);
        assert_eq!(record.duration_seconds, Some(42));
        assert_eq!(record.started_at, Some(100));
        assert_eq!(record.ended_at, Some(142));

        let result = processor
            .process_event(&analyzed("call_1", 150, [true, true, false]).with_candidate("c9"))
            .unwrap();
        assert!(result.analysis_record_created);
        assert!(result.candidate_updated);
        assert!(!result.call_record_updated);

        let outcome = processor.store().get_candidate_outcome("c9").unwrap().unwrap();
        assert_eq!(outcome.available_to_work, Some(true));
        assert_eq!(outcome.interested, Some(true));
        assert_eq!(outcome.knows_referee, Some(false));
        assert_eq!(outcome.contact_status, ContactStatus::Contacted);
        assert_eq!(outcome.last_contact_at, Some(150));
        assert_eq!(outcome.last_call_id.as_deref(), Some("call_1"));
        assert_eq!(status(&processor, "call_1"), CallStatus::Completed);
    }

    #[test]
    fn test_duplicate_events_are_idempotent() {
        for event in [
            started("call_1", 100),
            ended("call_1", 160, Some(60)),
            failed("call_1", 160, Some("busy")),
        ] {
            let processor = processor();

            processor.process_event(&event).unwrap();
            let once = processor.store().get_call_record("call_1").unwrap();

            let second = processor.process_event(&event).unwrap();
            let twice = processor.store().get_call_record("call_1").unwrap();

            assert!(!second.call_record_updated, "{} rewrote the record", event.event_type());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_later_started_overwrites_start_time() {
        let processor = processor();
        processor.process_event(&started("call_1", 100)).unwrap();
        let result = processor.process_event(&started("call_1", 250)).unwrap();

        assert!(result.call_record_updated);
        let record = processor.store().get_call_record("call_1").unwrap().unwrap();
        assert_eq!(record.status, CallStatus::InProgress);
        assert_eq!(record.started_at, Some(250));
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        let processor = processor();
        processor.process_event(&ended("call_1", 160, Some(60))).unwrap();
        processor.process_event(&started("call_1", 200)).unwrap();
        processor.process_event(&ended("call_1", 210, Some(5))).unwrap();
        processor.process_event(&failed("call_1", 220, None)).unwrap();
        assert_eq!(status(&processor, "call_1"), CallStatus::Completed);

        let record = processor.store().get_call_record("call_1").unwrap().unwrap();
        assert_eq!(record.duration_seconds, Some(60));
        assert_eq!(record.ended_at, Some(160));

        processor.process_event(&failed("call_2", 100, Some("no answer"))).unwrap();
        processor.process_event(&started("call_2", 90)).unwrap();
        processor.process_event(&ended("call_2", 120, Some(30))).unwrap();
        assert_eq!(status(&processor, "call_2"), CallStatus::Failed);
    }

    #[test]
    fn test_ended_before_started_stays_completed() {
        let processor = processor();
        processor.process_event(&ended("call_1", 160, Some(60))).unwrap();
        let result = processor.process_event(&started("call_1", 100)).unwrap();

        let record = processor.store().get_call_record("call_1").unwrap().unwrap();
        assert_eq!(record.status, CallStatus::Completed);
        assert!(result.call_record_updated);
        assert_eq!(record.started_at, Some(100));
    }

    #[test]
    fn test_analysis_written_once() {
        let processor = processor();

        let first = processor
            .process_event(&analyzed("call_1", 100, [false, false, false]).with_candidate("c9"))
            .unwrap();
        let second = processor
            .process_event(&analyzed("call_1", 110, [true, true, true]).with_candidate("c9"))
            .unwrap();

        assert!(first.analysis_record_created);
        assert!(!second.analysis_record_created);
        assert!(second.candidate_updated);
        assert_eq!(processor.store().analysis_count(), 1);

        let analysis = processor.store().get_analysis("call_1").unwrap().unwrap();
        assert!(!analysis.available_to_work);

        // Overwrite policy: the later analysis wins on the candidate
        let outcome = processor.store().get_candidate_outcome("c9").unwrap().unwrap();
        assert_eq!(outcome.available_to_work, Some(true));
    }

    #[test]
    fn test_merge_policy_keeps_first_answers() {
        let processor =
            CallEventProcessor::with_policy(MemoryCallStore::new(), CandidateOutcomePolicy::Merge);

        processor
            .process_event(&analyzed("call_1", 100, [false, true, false]).with_candidate("c9"))
            .unwrap();
        processor
            .process_event(&analyzed("call_2", 200, [true, false, true]).with_candidate("c9"))
            .unwrap();

        let outcome = processor.store().get_candidate_outcome("c9").unwrap().unwrap();
        assert_eq!(outcome.available_to_work, Some(false));
        assert_eq!(outcome.interested, Some(true));
        assert_eq!(outcome.knows_referee, Some(false));
        assert_eq!(outcome.last_call_id.as_deref(), Some("call_2"));
        assert_eq!(processor.store().analysis_count(), 2);
    }

    #[test]
    fn test_analysis_without_candidate() {
        let processor = processor();
        let result = processor
            .process_event(&analyzed("call_1", 100, [true, true, true]))
            .unwrap();

        assert!(result.analysis_record_created);
        assert!(!result.candidate_updated);
        assert_eq!(processor.store().write_count(), 1);
    }

    #[test]
    fn test_late_analysis_on_failed_call() {
        let processor = processor();
        processor.process_event(&failed("call_1", 100, None)).unwrap();

        let result = processor
            .process_event(&analyzed("call_1", 120, [true, false, false]).with_candidate("c9"))
            .unwrap();

        assert!(result.analysis_record_created);
        assert!(result.candidate_updated);
        assert_eq!(status(&processor, "call_1"), CallStatus::Failed);
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let processor = processor();
        processor.process_event(&ended("call_1", 100, None)).unwrap();
        processor.process_event(&failed("call_2", 100, None)).unwrap();

        let ended = processor.store().get_call_record("call_1").unwrap().unwrap();
        assert_eq!(ended.duration_seconds, Some(0));

        let failed = processor.store().get_call_record("call_2").unwrap().unwrap();
        assert_eq!(failed.error_message.as_deref(), Some(UNKNOWN_ERROR));
        assert_eq!(failed.ended_at, Some(100));
    }

    #[test]
    fn test_empty_call_id_writes_nothing() {
        let processor = processor();
        let result = processor.process_event(&started("", 100));

        assert!(matches!(result, Err(CallEventError::InvalidEvent(_))));
        assert_eq!(processor.store().write_count(), 0);
    }

    #[test]
    fn test_context_ids_recorded_once() {
        let processor = processor();
        processor
            .process_event(&started("call_1", 100).with_campaign("camp_1").with_candidate("c9"))
            .unwrap();
        processor
            .process_event(&ended("call_1", 130, Some(30)).with_campaign("camp_2"))
            .unwrap();

        let record = processor.store().get_call_record("call_1").unwrap().unwrap();
        assert_eq!(record.campaign_id.as_deref(), Some("camp_1"));
        assert_eq!(record.candidate_id.as_deref(), Some("c9"));
    }

    #[test]
    fn test_persistence_failure_is_reported() {
        let processor = processor();
        processor.store().set_fail_writes(true);

        let err = processor.process_event(&started("call_1", 100)).unwrap_err();
        match err {
            CallEventError::Persistence { mutation, .. } => {
                assert!(mutation.contains("call_1"));
                assert!(mutation.contains("call.started"));
            }
            other => panic!("Expected persistence error, got {:?}", other),
        }

        processor.store().set_fail_writes(false);
        let result = processor.process_event(&started("call_1", 100)).unwrap();
        assert!(result.call_record_updated);
    }

    #[test]
    fn test_concurrent_duplicates_on_shared_store() {
        let store = Arc::new(MemoryCallStore::new());
        let processor = Arc::new(CallEventProcessor::new(store.clone()));
        processor.process_event(&started("call_1", 100)).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let processor = processor.clone();
                std::thread::spawn(move || {
                    let event = if i % 2 == 0 {
                        ended("call_1", 160, Some(60))
                    } else {
                        started("call_1", 100)
                    };
                    processor.process_event(&event).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let record = store.get_call_record("call_1").unwrap().unwrap();
        assert_eq!(record.status, CallStatus::Completed);
        assert_eq!(record.duration_seconds, Some(60));
    }
}
