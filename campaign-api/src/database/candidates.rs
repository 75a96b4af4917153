use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use shared_types::{CandidateContactOutcome, ContactStatus};

use super::calls::unknown_status;
use super::{from_json_column, to_json_column};

pub fn get_candidate_outcome(
    conn: &Connection,
    candidate_id: &str,
) -> Result<Option<CandidateContactOutcome>> {
    let outcome = conn
        .query_row(
            "SELECT candidate_id, campaign_id, available_to_work, interested, knows_referee,
                    custom_responses, last_contact_at, last_call_id, contact_status
             FROM candidate_outcomes
             WHERE candidate_id = ?1",
            [candidate_id],
            |row| {
                let custom_responses: String = row.get(5)?;
                let contact_status: String = row.get(8)?;

                Ok(CandidateContactOutcome {
                    candidate_id: row.get(0)?,
                    campaign_id: row.get(1)?,
                    available_to_work: row.get(2)?,
                    interested: row.get(3)?,
                    knows_referee: row.get(4)?,
                    custom_responses: from_json_column(5, &custom_responses)?,
                    last_contact_at: row.get(6)?,
                    last_call_id: row.get(7)?,
                    contact_status: match contact_status.as_str() {
                        "contacted" => ContactStatus::Contacted,
                        "not-contacted" => ContactStatus::NotContacted,
                        other => return Err(unknown_status(8, other)),
                    },
                })
            },
        )
        .optional()?;

    Ok(outcome)
}

/// Insert or replace the outcome. A NULL campaign keeps the stored one.
pub fn upsert_candidate_outcome(
    conn: &Connection,
    candidate_id: &str,
    outcome: &CandidateContactOutcome,
    now: i64,
) -> Result<()> {
    let custom_responses_json = to_json_column(&outcome.custom_responses)?;

    conn.execute(
        "INSERT INTO candidate_outcomes
         (candidate_id, campaign_id, available_to_work, interested, knows_referee,
          custom_responses, last_contact_at, last_call_id, contact_status, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(candidate_id) DO UPDATE SET
            campaign_id = COALESCE(excluded.campaign_id, candidate_outcomes.campaign_id),
            available_to_work = excluded.available_to_work,
            interested = excluded.interested,
            knows_referee = excluded.knows_referee,
            custom_responses = excluded.custom_responses,
            last_contact_at = excluded.last_contact_at,
            last_call_id = excluded.last_call_id,
            contact_status = excluded.contact_status,
            updated_at = excluded.updated_at",
        params![
            candidate_id,
            outcome.campaign_id,
            outcome.available_to_work,
            outcome.interested,
            outcome.knows_referee,
            custom_responses_json,
            outcome.last_contact_at,
            outcome.last_call_id,
            outcome.contact_status.as_str(),
            now,
        ],
    )?;

    Ok(())
}
