use call_events::{CallRecordUpdate, CallStore, NewCallAnalysis};
use shared_types::{CallRecord, CandidateContactOutcome};

use super::{analyses, calls, candidates, DbConnection};

/// `CallStore` over the SQLite pool. Each operation is one statement on one
/// pooled connection, which gives the row-level atomicity the processor needs.
#[derive(Clone)]
pub struct SqliteCallStore {
    conn: DbConnection,
}

impl SqliteCallStore {
    pub fn new(conn: DbConnection) -> Self {
        Self { conn }
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

impl CallStore for SqliteCallStore {
    fn get_call_record(&self, call_id: &str) -> anyhow::Result<Option<CallRecord>> {
        let conn = self.conn.get()?;
        calls::get_call_record(&conn, call_id)
    }

    fn upsert_call_record(&self, call_id: &str, update: &CallRecordUpdate) -> anyhow::Result<()> {
        let conn = self.conn.get()?;
        calls::upsert_call_record(&conn, call_id, update, Self::now())
    }

    fn insert_analysis_record(&self, analysis: &NewCallAnalysis) -> anyhow::Result<bool> {
        let conn = self.conn.get()?;
        analyses::insert_analysis(&conn, analysis, Self::now())
    }

    fn get_candidate_outcome(
        &self,
        candidate_id: &str,
    ) -> anyhow::Result<Option<CandidateContactOutcome>> {
        let conn = self.conn.get()?;
        candidates::get_candidate_outcome(&conn, candidate_id)
    }

    fn update_candidate_outcome(
        &self,
        candidate_id: &str,
        outcome: &CandidateContactOutcome,
    ) -> anyhow::Result<()> {
        let conn = self.conn.get()?;
        candidates::upsert_candidate_outcome(&conn, candidate_id, outcome, Self::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use call_events::{CallEvent, CallEventKind, CallEventProcessor};
    use shared_types::{CallStatus, ContactStatus};

    #[test]
    fn test_processor_over_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("calls.sqlite")).unwrap();
        let processor = CallEventProcessor::new(db.call_store());

        processor
            .process_event(&CallEvent::new("call_1", 100, CallEventKind::Started))
            .unwrap();
        processor
            .process_event(&CallEvent::new(
                "call_1",
                142,
                CallEventKind::Ended {
                    duration_seconds: Some(42),
                },
            ))
            .unwrap();
        let late_start = processor
            .process_event(&CallEvent::new("call_1", 200, CallEventKind::Started))
            .unwrap();
        assert!(!late_start.call_record_updated);

        let analyzed = CallEvent::new("call_1", 150, CallEventKind::Analyzed(Default::default()))
            .with_candidate("c9");
        let first = processor.process_event(&analyzed).unwrap();
        let second = processor.process_event(&analyzed).unwrap();
        assert!(first.analysis_record_created);
        assert!(!second.analysis_record_created);

        let store = processor.store();
        let record = store.get_call_record("call_1").unwrap().unwrap();
        assert_eq!(record.status, CallStatus::Completed);
        assert_eq!(record.duration_seconds, Some(42));

        let outcome = store.get_candidate_outcome("c9").unwrap().unwrap();
        assert_eq!(outcome.contact_status, ContactStatus::Contacted);
        assert_eq!(outcome.available_to_work, Some(false));
    }
}
