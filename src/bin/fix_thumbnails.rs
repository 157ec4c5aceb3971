use anyhow::Result;
use clap::Parser;
use coaching_ops::db::Database;
use coaching_ops::metadata::matching::{containment_match, score_titles};
use coaching_ops::metadata::MatchType;
use coaching_ops::storage::Storage;
use std::time::Duration;
use tracing::{error, info};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Repair missing thumbnail URLs by pairing videos with bucket images.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Key prefix holding the thumbnails
    #[arg(long, default_value = "thumbnails/")]
    prefix: String,

    /// Minimum token similarity when no containment match exists
    #[arg(long, default_value = "0.4")]
    threshold: f64,

    /// Seconds to pause between database writes
    #[arg(long, default_value = "2")]
    throttle: u64,

    /// Write matched URLs to the database (default: preview only)
    #[arg(long)]
    execute: bool,
}

fn is_image_key(key: &str) -> bool {
    key.rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn filename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[tokio::main]
async fn main() -> Result<()> {
    coaching_ops::logging::configure_logging();

    let cli = Cli::parse();

    let storage = Storage::from_env()?;
    let db = Database::instance().await;

    let videos = db.fetch_videos_missing_thumbnail().await?;
    if videos.is_empty() {
        println!("Toutes les vidéos ont une miniature. ✅");
        return Ok(());
    }

    info!("Listing s3://{}/{}", storage.bucket(), cli.prefix);
    let objects = storage.list(&cli.prefix).await?;
    let images: Vec<_> = objects.iter().filter(|o| is_image_key(&o.key)).collect();
    println!(
        "{} vidéos sans miniature, {} images sous {}",
        videos.len(),
        images.len(),
        cli.prefix
    );
    println!();

    let mut matched = 0usize;
    let mut updated = 0u64;
    let mut errors: Vec<String> = Vec::new();

    for video in &videos {
        // Filename containment is the strongest signal; fall back to
        // token overlap when the naming drifted.
        let mut best = images
            .iter()
            .find(|image| containment_match(&video.title, filename(&image.key)))
            .map(|image| (image, MatchType::Containment));

        if best.is_none() {
            let mut top_score = cli.threshold;
            for image in &images {
                let score = score_titles(&video.title, filename(&image.key)).total();
                if score > top_score {
                    top_score = score;
                    best = Some((image, MatchType::Keywords));
                }
            }
        }

        let Some((image, match_type)) = best else {
            println!("❌ \"{}\" — aucune miniature trouvée", video.title);
            continue;
        };
        matched += 1;

        let url = match storage.public_url(&image.key) {
            Ok(url) => url,
            Err(e) => {
                error!("Cannot build URL for {}: {}", image.key, e);
                errors.push(format!("{}: {}", image.key, e));
                continue;
            }
        };
        println!("✅ \"{}\" <- {} ({})", video.title, image.key, match_type);

        if !cli.execute {
            continue;
        }

        match db.update_thumbnail(&video.id, &url).await {
            Ok(rows) => updated += rows,
            Err(e) => {
                error!("Failed to update thumbnail for {}: {}", video.id, e);
                errors.push(format!("{}: {}", video.id, e));
            }
        }
        if cli.throttle > 0 {
            tokio::time::sleep(Duration::from_secs(cli.throttle)).await;
        }
    }

    println!();
    println!("Miniatures trouvées: {}/{}", matched, videos.len());
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
