use anyhow::{Context, Result};
use clap::Parser;
use coaching_ops::db::Database;
use coaching_ops::metadata::intensity;
use coaching_ops::metadata::matching::{find_best_matches, MatchConfig};
use coaching_ops::metadata::ExerciseRecord;
use std::path::PathBuf;
use tracing::{error, info};

/// Fill in missing exercise metadata by fuzzy-matching video titles
/// against extracted records.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Extracted metadata JSON produced by parse_metadata
    metadata: PathBuf,

    /// Video type to consider
    #[arg(long, default_value = "PILATES")]
    video_type: String,

    /// Minimum combined similarity a match must exceed
    #[arg(long, default_value = "0.4")]
    threshold: f64,

    /// Let each record be claimed by at most one video
    #[arg(long)]
    one_to_one: bool,

    /// Write matched metadata to the database (default: preview only)
    #[arg(long)]
    execute: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    coaching_ops::logging::configure_logging();

    let cli = Cli::parse();

    let raw = std::fs::read_to_string(&cli.metadata)
        .with_context(|| format!("Failed to read {}", cli.metadata.display()))?;
    let records: Vec<ExerciseRecord> =
        serde_json::from_str(&raw).context("Metadata file is not valid JSON")?;

    let db = Database::instance().await;
    let videos = db.fetch_videos_missing_metadata(&cli.video_type).await?;
    info!(
        "{} videos missing metadata, {} extracted records",
        videos.len(),
        records.len()
    );

    if videos.is_empty() {
        println!("Aucune vidéo sans métadonnées. ✅");
        return Ok(());
    }

    let video_titles: Vec<String> = videos.iter().map(|v| v.title.clone()).collect();
    let record_titles: Vec<String> = records.iter().map(|r| r.title.clone()).collect();

    let config = MatchConfig {
        min_score: cli.threshold,
        enforce_one_to_one: cli.one_to_one,
    };
    let candidates = find_best_matches(&video_titles, &record_titles, &config);

    let mut matched = 0usize;
    let mut updated = 0u64;
    let mut errors: Vec<String> = Vec::new();

    for candidate in &candidates {
        let video = &videos[candidate.a_index];
        let Some(b_index) = candidate.b_index else {
            println!("❌ \"{}\" — aucune correspondance", video.title);
            continue;
        };
        let record = &records[b_index];
        matched += 1;

        println!(
            "✅ \"{}\" <- \"{}\" (score {:.2}, mots: {})",
            video.title,
            record.title,
            candidate.score.total(),
            candidate.score.overlapping.join(", ")
        );

        if !cli.execute {
            continue;
        }

        // Tidy the free-text fields before they reach the app
        let mut tidy = record.clone();
        tidy.starting_position = intensity::tidy_field(&record.starting_position);
        tidy.movement = intensity::tidy_field(&record.movement);
        tidy.series = intensity::tidy_field(&record.series);
        tidy.constraints = intensity::tidy_field(&record.constraints);
        tidy.theme = intensity::tidy_field(&record.theme);

        let label = intensity::normalize(&record.intensity).label();
        match db.update_exercise_metadata(&video.id, &tidy, label).await {
            Ok(rows) => updated += rows,
            Err(e) => {
                error!("Failed to update metadata for {}: {}", video.id, e);
                errors.push(format!("{}: {}", video.id, e));
            }
        }
    }

    println!();
    println!("Correspondances: {}/{}", matched, videos.len());
    if cli.execute {
        println!("Lignes mises à jour: {}", updated);
        if !errors.is_empty() {
            println!("Échecs: {}", errors.len());
            for error in &errors {
                println!("  - {}", error);
            }
        }
    } else {
        println!("Mode simulation: relancez avec --execute pour écrire.");
    }

    Ok(())
}
