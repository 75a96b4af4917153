use anyhow::Result;
use call_events::NewCallAnalysis;
use rusqlite::{params, Connection, OptionalExtension};
use shared_types::CallAnalysisRecord;

use super::{from_json_column, to_json_column};

/// Insert unless the call already has an analysis. Returns true when inserted.
pub fn insert_analysis(conn: &Connection, analysis: &NewCallAnalysis, now: i64) -> Result<bool> {
    let custom_answers_json = to_json_column(&analysis.custom_answers)?;
    let key_points_json = to_json_column(&analysis.key_points)?;
    let objections_json = analysis
        .objections
        .as_ref()
        .map(to_json_column)
        .transpose()?;

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO call_analyses
         (call_id, campaign_id, candidate_id, available_to_work, interested, knows_referee,
          custom_answers, summary, sentiment, key_points, objections, next_steps,
          transcript_url, recording_url, analyzed_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            analysis.call_id,
            analysis.campaign_id,
            analysis.candidate_id,
            analysis.available_to_work,
            analysis.interested,
            analysis.knows_referee,
            custom_answers_json,
            analysis.summary,
            analysis.sentiment,
            key_points_json,
            objections_json,
            analysis.next_steps,
            analysis.transcript_url,
            analysis.recording_url,
            analysis.analyzed_at,
            now,
        ],
    )?;

    Ok(inserted == 1)
}

pub fn get_analysis(conn: &Connection, call_id: &str) -> Result<Option<CallAnalysisRecord>> {
    let analysis = conn
        .query_row(
            "SELECT id, call_id, campaign_id, candidate_id, available_to_work, interested,
                    knows_referee, custom_answers, summary, sentiment, key_points, objections,
                    next_steps, transcript_url, recording_url, analyzed_at, created_at
             FROM call_analyses
             WHERE call_id = ?1",
            [call_id],
            |row| {
                let custom_answers: String = row.get(7)?;
                let key_points: String = row.get(10)?;
                let objections: Option<String> = row.get(11)?;

                Ok(CallAnalysisRecord {
                    id: row.get(0)?,
                    call_id: row.get(1)?,
                    campaign_id: row.get(2)?,
                    candidate_id: row.get(3)?,
                    available_to_work: row.get(4)?,
                    interested: row.get(5)?,
                    knows_referee: row.get(6)?,
                    custom_answers: from_json_column(7, &custom_answers)?,
                    summary: row.get(8)?,
                    sentiment: row.get(9)?,
                    key_points: from_json_column(10, &key_points)?,
                    objections: objections
                        .map(|text| from_json_column(11, &text))
                        .transpose()?,
                    next_steps: row.get(12)?,
                    transcript_url: row.get(13)?,
                    recording_url: row.get(14)?,
                    analyzed_at: row.get(15)?,
                    created_at: row.get(16)?,
                })
            },
        )
        .optional()?;

    Ok(analysis)
}
