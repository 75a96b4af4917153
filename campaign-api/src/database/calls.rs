use anyhow::Result;
use call_events::CallRecordUpdate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use shared_types::{CallRecord, CallStatus};

const CALL_COLUMNS: &str = "call_id, status, campaign_id, candidate_id, started_at, ended_at,
     duration_seconds, error_message, created_at, updated_at";

fn parse_status(index: usize, status: &str) -> rusqlite::Result<CallStatus> {
    match status {
        "pending" => Ok(CallStatus::Pending),
        "in-progress" => Ok(CallStatus::InProgress),
        "completed" => Ok(CallStatus::Completed),
        "failed" => Ok(CallStatus::Failed),
        other => Err(unknown_status(index, other)),
    }
}

pub(crate) fn unknown_status(index: usize, status: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        format!("unknown status {status:?}").into(),
    )
}

fn call_from_row(row: &Row) -> rusqlite::Result<CallRecord> {
    let status: String = row.get(1)?;
    Ok(CallRecord {
        call_id: row.get(0)?,
        status: parse_status(1, &status)?,
        campaign_id: row.get(2)?,
        candidate_id: row.get(3)?,
        started_at: row.get(4)?,
        ended_at: row.get(5)?,
        duration_seconds: row.get(6)?,
        error_message: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub fn get_call_record(conn: &Connection, call_id: &str) -> Result<Option<CallRecord>> {
    let record = conn
        .query_row(
            &format!("SELECT {CALL_COLUMNS} FROM call_records WHERE call_id = ?1"),
            [call_id],
            call_from_row,
        )
        .optional()?;

    Ok(record)
}

/// Insert or merge in a single statement.
///
/// The CASEs mirror `transition::apply_update`: terminal rows keep their
/// status, nothing moves back to pending, and a terminal row only has empty
/// fields filled (never an error on a completed call or a duration on a
/// failed one).
pub fn upsert_call_record(
    conn: &Connection,
    call_id: &str,
    update: &CallRecordUpdate,
    now: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO call_records
         (call_id, status, campaign_id, candidate_id, started_at, ended_at,
          duration_seconds, error_message, created_at, updated_at)
         VALUES (?1, COALESCE(?2, 'pending'), ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
         ON CONFLICT(call_id) DO UPDATE SET
            status = CASE
                WHEN call_records.status IN ('completed', 'failed') THEN call_records.status
                WHEN ?2 IS NULL OR ?2 = 'pending' THEN call_records.status
                ELSE ?2
            END,
            campaign_id = COALESCE(?3, call_records.campaign_id),
            candidate_id = COALESCE(?4, call_records.candidate_id),
            started_at = CASE
                WHEN call_records.status IN ('completed', 'failed')
                    THEN COALESCE(call_records.started_at, ?5)
                ELSE COALESCE(?5, call_records.started_at)
            END,
            ended_at = CASE
                WHEN call_records.status IN ('completed', 'failed')
                    THEN COALESCE(call_records.ended_at, ?6)
                ELSE COALESCE(?6, call_records.ended_at)
            END,
            duration_seconds = CASE
                WHEN call_records.status = 'failed' THEN call_records.duration_seconds
                WHEN call_records.status = 'completed'
                    THEN COALESCE(call_records.duration_seconds, ?7)
                ELSE COALESCE(?7, call_records.duration_seconds)
            END,
            error_message = CASE
                WHEN call_records.status = 'completed' THEN call_records.error_message
                WHEN call_records.status = 'failed'
                    THEN COALESCE(call_records.error_message, ?8)
                ELSE COALESCE(?8, call_records.error_message)
            END,
            updated_at = ?9",
        params![
            call_id,
            update.status.map(|s| s.as_str()),
            update.campaign_id,
            update.candidate_id,
            update.started_at,
            update.ended_at,
            update.duration_seconds,
            update.error_message,
            now,
        ],
    )?;

    Ok(())
}

pub fn list_call_records(conn: &Connection, limit: usize) -> Result<Vec<CallRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CALL_COLUMNS} FROM call_records ORDER BY updated_at DESC, call_id LIMIT ?1"
    ))?;

    let calls = stmt
        .query_map([limit as i64], call_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(calls)
}
