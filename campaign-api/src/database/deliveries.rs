use anyhow::Result;
use rusqlite::{params, Connection, Row};
use shared_types::{DeliveryStatus, WebhookDelivery};

use super::calls::unknown_status;

pub struct NewDelivery<'a> {
    pub call_id: Option<&'a str>,
    pub event_type: Option<&'a str>,
    pub status: DeliveryStatus,
    pub error: Option<String>,
    pub payload: &'a str,
    pub received_at: i64,
    pub processed_at: i64,
}

fn parse_status(index: usize, status: &str) -> rusqlite::Result<DeliveryStatus> {
    match status {
        "processed" => Ok(DeliveryStatus::Processed),
        "ignored" => Ok(DeliveryStatus::Ignored),
        "invalid" => Ok(DeliveryStatus::Invalid),
        "failed" => Ok(DeliveryStatus::Failed),
        other => Err(unknown_status(index, other)),
    }
}

fn delivery_from_row(row: &Row) -> rusqlite::Result<WebhookDelivery> {
    let status: String = row.get(3)?;
    Ok(WebhookDelivery {
        id: row.get(0)?,
        call_id: row.get(1)?,
        event_type: row.get(2)?,
        status: parse_status(3, &status)?,
        error: row.get(4)?,
        payload: row.get(5)?,
        received_at: row.get(6)?,
        processed_at: row.get(7)?,
    })
}

pub fn insert_delivery(conn: &Connection, delivery: &NewDelivery) -> Result<i64> {
    let id: i64 = conn.query_row(
        "INSERT INTO webhook_deliveries
         (call_id, event_type, status, error, payload, received_at, processed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         RETURNING id",
        params![
            delivery.call_id,
            delivery.event_type,
            delivery.status.as_str(),
            delivery.error,
            delivery.payload,
            delivery.received_at,
            delivery.processed_at,
        ],
        |row| row.get(0),
    )?;

    Ok(id)
}

pub fn update_delivery_status(
    conn: &Connection,
    id: i64,
    status: DeliveryStatus,
    error: Option<&str>,
    processed_at: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE webhook_deliveries SET status = ?1, error = ?2, processed_at = ?3
            WHERE id = ?4",
        params![status.as_str(), error, processed_at, id],
    )?;

    Ok(())
}

/// Most recent first, optionally filtered by status
pub fn list_deliveries(
    conn: &Connection,
    status: Option<DeliveryStatus>,
    limit: usize,
) -> Result<Vec<WebhookDelivery>> {
    let mut stmt = conn.prepare(
        "SELECT id, call_id, event_type, status, error, payload, received_at, processed_at
         FROM webhook_deliveries
         WHERE ?1 IS NULL OR status = ?1
         ORDER BY received_at DESC, id DESC
         LIMIT ?2",
    )?;

    let deliveries = stmt
        .query_map(
            params![status.map(|s| s.as_str()), limit as i64],
            delivery_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(deliveries)
}

/// Delete deliveries received before `cutoff`. Failed ones stay until replayed.
pub fn prune_deliveries(conn: &Connection, cutoff: i64) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM webhook_deliveries WHERE received_at < ?1 AND status != 'failed'",
        [cutoff],
    )?;

    Ok(deleted)
}

/// Oldest first, so replays apply in arrival order
pub fn list_failed_deliveries(conn: &Connection) -> Result<Vec<WebhookDelivery>> {
    let mut stmt = conn.prepare(
        "SELECT id, call_id, event_type, status, error, payload, received_at, processed_at
         FROM webhook_deliveries
         WHERE status = 'failed'
         ORDER BY received_at ASC, id ASC",
    )?;

    let deliveries = stmt
        .query_map([], delivery_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(deliveries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::migrations::run_migrations;

    fn delivery(status: DeliveryStatus, received_at: i64) -> NewDelivery<'static> {
        NewDelivery {
            call_id: Some("call_1"),
            event_type: Some("call.ended"),
            status,
            error: None,
            payload: r#"{"type":"call.ended","call_id":"call_1"}"#,
            received_at,
            processed_at: received_at,
        }
    }

    #[test]
    fn test_list_filters_by_status() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        insert_delivery(&conn, &delivery(DeliveryStatus::Processed, 100)).unwrap();
        let failed_id = insert_delivery(&conn, &delivery(DeliveryStatus::Failed, 200)).unwrap();

        let all = list_deliveries(&conn, None, 10).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, failed_id);

        let failed = list_deliveries(&conn, Some(DeliveryStatus::Failed), 10).unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_unknown_stored_status_is_not_replayed() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute_batch(
            "PRAGMA ignore_check_constraints = ON;
             INSERT INTO webhook_deliveries (status, payload, received_at)
             VALUES ('lost', '{}', 100);",
        )
        .unwrap();

        assert!(list_deliveries(&conn, None, 10).is_err());
        assert!(list_failed_deliveries(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_prune_keeps_recent_and_failed() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        insert_delivery(&conn, &delivery(DeliveryStatus::Processed, 100)).unwrap();
        insert_delivery(&conn, &delivery(DeliveryStatus::Invalid, 150)).unwrap();
        insert_delivery(&conn, &delivery(DeliveryStatus::Failed, 100)).unwrap();
        insert_delivery(&conn, &delivery(DeliveryStatus::Processed, 500)).unwrap();

        assert_eq!(prune_deliveries(&conn, 200).unwrap(), 2);

        let remaining = list_deliveries(&conn, None, 10).unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0].received_at, 500);
        assert_eq!(remaining[1].status, DeliveryStatus::Failed);
    }

    #[test]
    fn test_mark_failed_delivery_processed() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let id = insert_delivery(&conn, &delivery(DeliveryStatus::Failed, 100)).unwrap();
        assert_eq!(list_failed_deliveries(&conn).unwrap().len(), 1);

        update_delivery_status(&conn, id, DeliveryStatus::Processed, None, 300).unwrap();
        assert!(list_failed_deliveries(&conn).unwrap().is_empty());

        let all = list_deliveries(&conn, None, 10).unwrap();
        assert_eq!(all[0].status, DeliveryStatus::Processed);
        assert_eq!(all[0].processed_at, Some(300));
    }
}
