use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for API types
    let mut types = Vec::new();

    // Call types
    types.push(clean_type(CallStatus::export_to_string()?));
    types.push(clean_type(CallRecord::export_to_string()?));
    types.push(clean_type(CallAnalysisRecord::export_to_string()?));
    types.push(clean_type(ProcessingResult::export_to_string()?));
    types.push(clean_type(CallsResponse::export_to_string()?));

    // Candidate types
    types.push(clean_type(ContactStatus::export_to_string()?));
    types.push(clean_type(CandidateContactOutcome::export_to_string()?));

    // Webhook types
    types.push(clean_type(WebhookAck::export_to_string()?));
    types.push(clean_type(DeliveryStatus::export_to_string()?));
    types.push(clean_type(WebhookDelivery::export_to_string()?));
    types.push(clean_type(WebhookDeliveriesResponse::export_to_string()?));

    let output_dir = Path::new("../gui/src/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = format!("{}\n", types.join("\n\n"));

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

/// Strip per-file headers. Everything lands in one `types.ts`, so the
/// cross-type imports ts-rs emits are dropped too.
fn clean_type(type_def: String) -> String {
    type_def
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
