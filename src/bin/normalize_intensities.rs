//! # Intensity Normalization Utility
//!
//! Rewrites every stored intensity value to one of the seven canonical
//! French levels.
//!
//! ## Usage
//!
//! ```
//! # Preview the mapping without touching the database (default)
//! cargo run --bin normalize_intensities
//!
//! # Apply the mapping
//! cargo run --bin normalize_intensities -- --execute
//! ```
//!
//! ## Configuration
//!
//! - `DATABASE_URL`: Postgres connection string (required)

use anyhow::Result;
use coaching_ops::db::Database;
use coaching_ops::metadata::intensity;
use coaching_ops::metadata::Intensity;
use std::env;
use tracing::{info, warn};

const VIDEO_TYPE: &str = "PILATES";

#[tokio::main]
async fn main() -> Result<()> {
    coaching_ops::logging::configure_logging();

    let args: Vec<String> = env::args().collect();
    let execute = args.iter().any(|a| a == "--execute");

    let db = Database::instance().await;

    let stored = db.distinct_intensities(VIDEO_TYPE).await?;
    info!("Found {} distinct intensity values", stored.len());

    println!("Valeurs d'intensité actuelles:");
    for entry in &stored {
        println!("  {:4}× \"{}\"", entry.count, entry.intensity);
    }
    println!();

    // Build the rewrite plan before touching anything.
    let mut plan: Vec<(&str, &'static str, i64)> = Vec::new();
    let mut already_canonical = 0i64;
    for entry in &stored {
        let canonical = intensity::normalize(&entry.intensity).label();
        if canonical == entry.intensity {
            already_canonical += entry.count;
        } else {
            plan.push((entry.intensity.as_str(), canonical, entry.count));
        }
    }

    println!("Plan de normalisation:");
    if plan.is_empty() {
        println!("  (rien à faire, tout est déjà canonique)");
    }
    for (old, new, count) in &plan {
        println!("  {:4}× \"{}\" -> \"{}\"", count, old, new);
    }
    println!();

    if !execute {
        println!(
            "Mode simulation: {} valeur(s) seraient réécrites, {} déjà canoniques.",
            plan.iter().map(|(_, _, c)| c).sum::<i64>(),
            already_canonical
        );
        println!("Relancez avec --execute pour appliquer.");
        return Ok(());
    }

    let mut updated = 0u64;
    for (old, new, _) in &plan {
        match db.update_intensity_value(VIDEO_TYPE, old, new).await {
            Ok(rows) => {
                info!("Rewrote \"{}\" -> \"{}\" ({} rows)", old, new, rows);
                updated += rows;
            }
            Err(e) => {
                warn!("Failed to rewrite \"{}\": {}", old, e);
            }
        }
    }

    // Post-check: every remaining value must be one of the seven levels.
    let remaining = db.distinct_intensities(VIDEO_TYPE).await?;
    let stragglers: Vec<_> = remaining
        .iter()
        .filter(|entry| !Intensity::is_canonical(&entry.intensity))
        .collect();

    println!("{} ligne(s) mises à jour.", updated);
    if stragglers.is_empty() {
        println!("Vérification: toutes les intensités sont canoniques. ✅");
    } else {
        for entry in &stragglers {
            warn!(
                "Non-canonical intensity still present: \"{}\" ({} rows)",
                entry.intensity, entry.count
            );
        }
        println!(
            "Vérification: {} valeur(s) non canoniques restantes. ❌",
            stragglers.len()
        );
    }

    Ok(())
}
