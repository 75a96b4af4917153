use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    // One row per provider call
    conn.execute(
        "CREATE TABLE IF NOT EXISTS call_records (
            call_id VARCHAR PRIMARY KEY,
            status VARCHAR NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'in-progress', 'completed', 'failed')),
            campaign_id VARCHAR,
            candidate_id VARCHAR,
            started_at BIGINT,
            ended_at BIGINT,
            duration_seconds BIGINT,
            error_message VARCHAR,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_call_records_updated
            ON call_records(updated_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_call_records_candidate
            ON call_records(candidate_id)",
        [],
    )?;

    // Analyses are append-only, at most one per call
    conn.execute(
        "CREATE TABLE IF NOT EXISTS call_analyses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            call_id VARCHAR NOT NULL UNIQUE,
            campaign_id VARCHAR,
            candidate_id VARCHAR,
            available_to_work BOOLEAN NOT NULL,
            interested BOOLEAN NOT NULL,
            knows_referee BOOLEAN NOT NULL,
            custom_answers VARCHAR NOT NULL DEFAULT '{}',
            summary VARCHAR NOT NULL DEFAULT '',
            sentiment REAL NOT NULL DEFAULT 0.5,
            key_points VARCHAR NOT NULL DEFAULT '[]',
            objections VARCHAR,
            next_steps VARCHAR,
            transcript_url VARCHAR,
            recording_url VARCHAR,
            analyzed_at BIGINT NOT NULL,
            created_at BIGINT NOT NULL
        )",
        [],
    )?;

    // Call-driven fields of campaign candidates; NULL answers are unknown
    conn.execute(
        "CREATE TABLE IF NOT EXISTS candidate_outcomes (
            candidate_id VARCHAR PRIMARY KEY,
            campaign_id VARCHAR,
            available_to_work BOOLEAN,
            interested BOOLEAN,
            knows_referee BOOLEAN,
            custom_responses VARCHAR NOT NULL DEFAULT '{}',
            last_contact_at BIGINT,
            last_call_id VARCHAR,
            contact_status VARCHAR NOT NULL DEFAULT 'not-contacted' CHECK (contact_status IN ('not-contacted', 'contacted')),
            updated_at BIGINT NOT NULL
        )",
        [],
    )?;

    // Raw webhook bodies, kept for replay
    conn.execute(
        "CREATE TABLE IF NOT EXISTS webhook_deliveries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            call_id VARCHAR,
            event_type VARCHAR,
            status VARCHAR NOT NULL CHECK (status IN ('processed', 'ignored', 'invalid', 'failed')),
            error VARCHAR,
            payload VARCHAR NOT NULL,
            received_at BIGINT NOT NULL,
            processed_at BIGINT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_webhook_deliveries_status
            ON webhook_deliveries(status, received_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_webhook_deliveries_received
            ON webhook_deliveries(received_at)",
        [],
    )?;

    Ok(())
}
