//! # Validated Title Application Utility
//!
//! Reads a validation report that a human has ticked off and applies the
//! accepted title changes.
//!
//! ## Usage
//!
//! ```
//! # Apply the default report
//! cargo run --bin apply_validated_titles
//!
//! # Apply a specific report
//! cargo run --bin apply_validated_titles temp/titres-a-valider.txt
//! ```
//!
//! ## Configuration
//!
//! - `DATABASE_URL`: Postgres connection string (required)

use anyhow::{Context, Result};
use chrono::Utc;
use coaching_ops::db::Database;
use coaching_ops::review::parse_validated;
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AppliedResult {
    video_id: String,
    new_title: String,
    rows_affected: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplyReport {
    applied_at: chrono::DateTime<Utc>,
    report_file: String,
    applied: Vec<AppliedResult>,
    errors: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    coaching_ops::logging::configure_logging();

    let args: Vec<String> = env::args().collect();
    let report_path = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new("temp").join("titres-a-valider.txt"));

    let report = std::fs::read_to_string(&report_path)
        .with_context(|| format!("Failed to read {}", report_path.display()))?;

    let accepted = parse_validated(&report);
    if accepted.is_empty() {
        println!("Aucun titre coché [x] OUI dans {}.", report_path.display());
        return Ok(());
    }
    info!("{} validated title(s) to apply", accepted.len());

    let db = Database::instance().await;

    let mut applied = Vec::new();
    let mut errors: Vec<String> = Vec::new();
    for update in &accepted {
        match db.update_title(&update.video_id, &update.new_title).await {
            Ok(rows) => {
                println!("✅ {} -> \"{}\"", update.video_id, update.new_title);
                applied.push(AppliedResult {
                    video_id: update.video_id.clone(),
                    new_title: update.new_title.clone(),
                    rows_affected: rows,
                });
            }
            Err(e) => {
                error!("Failed to apply title for {}: {}", update.video_id, e);
                errors.push(format!("{}: {}", update.video_id, e));
            }
        }
    }

    let results_path = report_path.with_file_name("titres-appliques.json");
    let results = ApplyReport {
        applied_at: Utc::now(),
        report_file: report_path.display().to_string(),
        applied,
        errors: errors.clone(),
    };
    std::fs::write(&results_path, serde_json::to_string_pretty(&results)?)
        .with_context(|| format!("Failed to write {}", results_path.display()))?;

    println!();
    println!("Titres appliqués: {}", results.applied.len());
    if !errors.is_empty() {
        println!("Échecs: {}", errors.len());
        for error in &errors {
            println!("  - {}", error);
        }
    }
    println!("Résultats: {}", results_path.display());

    Ok(())
}
