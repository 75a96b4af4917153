//! Re-run call webhook deliveries through the processor.
//!
//! ```text
//! replay-call-events --failed
//! replay-call-events --file deliveries.jsonl --dry-run
//! ```

use anyhow::Context;
use call_events::{decode, CallEventError};
use campaign_api::config::ApiConfig;
use campaign_api::database::deliveries;
use campaign_api::helpers::database::initialize_database;
use campaign_api::ingest::{delivery_status, CallWebhookIngestor};
use clap::Parser;
use shared_types::{DeliveryStatus, ProcessingResult};
use std::io::BufRead;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay call lifecycle webhooks", long_about = None)]
struct Args {
    /// Replay every delivery recorded as failed
    #[arg(long, conflicts_with = "file")]
    failed: bool,

    /// Replay a JSON-lines file of webhook bodies
    #[arg(long, value_name = "PATH")]
    file: Option<String>,

    /// Decode and report without writing anything
    #[arg(long)]
    dry_run: bool,

    #[arg(long)]
    config: Option<String>,
}

#[derive(Debug, Default)]
struct Summary {
    processed: usize,
    ignored: usize,
    invalid: usize,
    failed: usize,
}

impl Summary {
    fn count(&mut self, status: DeliveryStatus) {
        match status {
            DeliveryStatus::Processed => self.processed += 1,
            DeliveryStatus::Ignored => self.ignored += 1,
            DeliveryStatus::Invalid => self.invalid += 1,
            DeliveryStatus::Failed => self.failed += 1,
        }
    }
}

/// Decode-only status for dry runs
fn dry_run_status(body: &[u8], received_at: i64) -> Result<ProcessingResult, CallEventError> {
    decode::decode_body(body, received_at).map(|event| {
        println!("  {} {} at {}", event.call_id, event.event_type(), event.occurred_at);
        ProcessingResult::default()
    })
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if !args.failed && args.file.is_none() {
        anyhow::bail!("Nothing to replay: pass --failed or --file PATH");
    }

    let (config, _) = match &args.config {
        Some(path) => ApiConfig::load_from(std::path::Path::new(path)),
        None => ApiConfig::load(),
    }
    .context("Failed to load config")?;

    let db = initialize_database(&config)?;
    let ingestor = CallWebhookIngestor::new(
        &db,
        config.webhooks.candidate_outcome_policy,
        config.webhooks.record_deliveries,
    )
    .with_retention(config.webhooks.delivery_retention_days);
    let mut summary = Summary::default();

    if args.failed {
        let failed = {
            let conn = db.connection.get()?;
            deliveries::list_failed_deliveries(&conn)?
        };
        println!("Replaying {} failed deliveries", failed.len());

        for delivery in &failed {
            let result = if args.dry_run {
                dry_run_status(delivery.payload.as_bytes(), delivery.received_at)
            } else {
                ingestor.replay_delivery(delivery)
            };
            let status = delivery_status(&result);
            if let Err(e) = &result {
                println!("  delivery {}: {} ({})", delivery.id, status.as_str(), e);
            }
            summary.count(status);
        }
    }

    if let Some(path) = &args.file {
        let file = std::fs::File::open(path).with_context(|| format!("Failed to open {}", path))?;
        let now = chrono::Utc::now().timestamp();

        for (index, line) in std::io::BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", index + 1))?;
            if line.trim().is_empty() {
                continue;
            }

            let result = if args.dry_run {
                dry_run_status(line.as_bytes(), now)
            } else {
                ingestor.ingest(line.as_bytes(), now)
            };
            let status = delivery_status(&result);
            if let Err(e) = &result {
                println!("  line {}: {} ({})", index + 1, status.as_str(), e);
            }
            summary.count(status);
        }
    }

    println!(
        "{}processed: {}, ignored: {}, invalid: {}, failed: {}",
        if args.dry_run { "[dry run] " } else { "" },
        summary.processed,
        summary.ignored,
        summary.invalid,
        summary.failed
    );

    if summary.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
