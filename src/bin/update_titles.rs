use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use coaching_ops::db::Database;
use coaching_ops::metadata::titles::{clean_title, compare_titles};
use coaching_ops::metadata::{ExerciseRecord, MatchType};
use coaching_ops::review::{render_report, ReportJson, ReviewPolicy, ReviewState, TitleUpdate};
use std::path::PathBuf;
use tracing::{error, info};

/// Propose and apply video title corrections from extracted exercise metadata.
///
/// High-confidence matches are applied directly; medium-confidence matches
/// are written to a validation report for a human to tick off.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Extracted metadata JSON produced by parse_metadata
    metadata: PathBuf,

    /// Video type to consider
    #[arg(long, default_value = "PILATES")]
    video_type: String,

    /// Directory for the validation report
    #[arg(long, default_value = "temp")]
    report_dir: PathBuf,

    /// Score everything but do not write to the database
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    coaching_ops::logging::configure_logging();

    let cli = Cli::parse();

    let raw = std::fs::read_to_string(&cli.metadata)
        .with_context(|| format!("Failed to read {}", cli.metadata.display()))?;
    let records: Vec<ExerciseRecord> =
        serde_json::from_str(&raw).context("Metadata file is not valid JSON")?;
    info!("Loaded {} exercise records", records.len());

    let db = Database::instance().await;
    let videos = db.fetch_published_videos(&cli.video_type).await?;
    info!("Loaded {} published videos", videos.len());

    let policy = ReviewPolicy::default();
    let mut auto_applied: Vec<TitleUpdate> = Vec::new();
    let mut pending: Vec<TitleUpdate> = Vec::new();
    let mut rejected: Vec<TitleUpdate> = Vec::new();
    let mut unmatched: Vec<String> = Vec::new();
    let mut unchanged = 0usize;
    let mut errors: Vec<String> = Vec::new();

    for video in &videos {
        // Best-scoring record for this video.
        let mut best: Option<(&ExerciseRecord, u8, MatchType)> = None;
        for record in &records {
            let (score, match_type) = compare_titles(&video.title, &record.title);
            if score > best.as_ref().map_or(0, |(_, s, _)| *s) {
                best = Some((record, score, match_type));
            }
        }

        // A zero score means no record shared anything with this title
        let Some((record, score, match_type)) = best.filter(|(_, s, _)| *s > 0) else {
            unmatched.push(video.title.clone());
            continue;
        };

        let new_title = clean_title(&record.title);
        if new_title == video.title {
            unchanged += 1;
            continue;
        }

        let update = TitleUpdate {
            video_id: video.id.clone(),
            old_title: video.title.clone(),
            new_title,
            score,
            match_type,
        };

        match policy.classify(score) {
            ReviewState::AutoApplied => {
                if !cli.dry_run {
                    if let Err(e) = db.update_title(&update.video_id, &update.new_title).await {
                        error!("Failed to update title for {}: {}", update.video_id, e);
                        errors.push(format!("{}: {}", update.video_id, e));
                        continue;
                    }
                }
                auto_applied.push(update);
            }
            ReviewState::PendingReview => pending.push(update),
            // Below the review threshold: reported apart from true no-matches
            _ => rejected.push(update),
        }
    }

    let generated_at = Utc::now();
    let report = render_report(generated_at, &auto_applied, &pending, &rejected, &unmatched);

    std::fs::create_dir_all(&cli.report_dir)
        .with_context(|| format!("Failed to create {}", cli.report_dir.display()))?;
    let text_path = cli.report_dir.join("titres-a-valider.txt");
    let json_path = cli.report_dir.join("titres-a-valider.json");
    std::fs::write(&text_path, &report)
        .with_context(|| format!("Failed to write {}", text_path.display()))?;

    let mut matches = auto_applied.clone();
    matches.extend(pending.iter().cloned());
    let json = ReportJson {
        generated_at,
        auto_applied: auto_applied.len(),
        pending_review: pending.len(),
        rejected: rejected.len(),
        unmatched: unmatched.len(),
        matches,
        rejected_matches: rejected.clone(),
        unmatched_titles: unmatched.clone(),
    };
    std::fs::write(&json_path, serde_json::to_string_pretty(&json)?)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;

    println!("Titres appliqués automatiquement: {}", auto_applied.len());
    if cli.dry_run {
        println!("  (mode simulation, aucune écriture)");
    }
    println!("Titres en attente de validation:  {}", pending.len());
    println!("Titres écartés (score < 80):      {}", rejected.len());
    println!("Titres déjà corrects:             {}", unchanged);
    println!("Sans correspondance:              {}", unmatched.len());
    if !errors.is_empty() {
        println!("Échecs de mise à jour:            {}", errors.len());
        for error in &errors {
            println!("  - {}", error);
        }
    }
    println!();
    println!("Rapport de validation: {}", text_path.display());
    println!("Rapport JSON:          {}", json_path.display());

    Ok(())
}
