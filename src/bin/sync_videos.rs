use anyhow::Result;
use clap::Parser;
use coaching_ops::db::Database;
use coaching_ops::metadata::titles::title_from_filename;
use coaching_ops::storage::Storage;
use tracing::{error, info, warn};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "webm"];

/// Register bucket videos that are missing from the database.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Key prefix to scan
    #[arg(long, default_value = "videos/pilates/")]
    prefix: String,

    /// Video type to register new rows under
    #[arg(long, default_value = "PILATES")]
    video_type: String,

    /// List what would be inserted without writing
    #[arg(long)]
    dry_run: bool,
}

fn is_video_key(key: &str) -> bool {
    key.rsplit_once('.')
        .map(|(_, ext)| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// The folder right above the file names the body region
/// (videos/pilates/Abdominaux/18. Crunch inversé.mp4).
fn region_from_key<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    let relative = key.strip_prefix(prefix)?;
    let (folder, _file) = relative.rsplit_once('/')?;
    folder.rsplit('/').next().filter(|s| !s.is_empty())
}

/// Keys under the predefined-program folders get their own catalog category;
/// everything else is filed under the muscle-group browser.
fn category_from_key(key: &str) -> &'static str {
    if key.contains("programmes-predefinis") {
        "Predefined Programs"
    } else {
        "Muscle Groups"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    coaching_ops::logging::configure_logging();

    let cli = Cli::parse();

    let storage = Storage::from_env()?;
    let db = Database::instance().await;

    info!("Listing s3://{}/{}", storage.bucket(), cli.prefix);
    let objects = storage.list(&cli.prefix).await?;
    let videos: Vec<_> = objects.iter().filter(|o| is_video_key(&o.key)).collect();
    println!(
        "{} objets trouvés sous {}, dont {} vidéos",
        objects.len(),
        cli.prefix,
        videos.len()
    );

    let mut existing = 0usize;
    let mut inserted = 0usize;
    let mut errors: Vec<String> = Vec::new();

    for object in &videos {
        let url = match storage.public_url(&object.key) {
            Ok(url) => url,
            Err(e) => {
                warn!("Skipping unencodable key {}: {}", object.key, e);
                errors.push(format!("{}: {}", object.key, e));
                continue;
            }
        };

        if db.video_url_exists(&url).await? {
            existing += 1;
            continue;
        }

        let filename = object.key.rsplit('/').next().unwrap_or(&object.key);
        let title = title_from_filename(filename);
        let region = region_from_key(&object.key, &cli.prefix);
        let category = category_from_key(&object.key);

        if cli.dry_run {
            println!("+ \"{}\" ({})", title, object.key);
            inserted += 1;
            continue;
        }

        match db
            .insert_video_from_listing(&title, &url, region, category, &cli.video_type)
            .await
        {
            Ok(id) => {
                info!("Registered {} as {}", object.key, id);
                println!("+ \"{}\" -> {}", title, id);
                inserted += 1;
            }
            Err(e) => {
                error!("Failed to register {}: {}", object.key, e);
                errors.push(format!("{}: {}", object.key, e));
            }
        }
    }

    println!();
    println!("Déjà enregistrées: {}", existing);
    if cli.dry_run {
        println!("À insérer (simulation): {}", inserted);
    } else {
        println!("Insérées: {}", inserted);
    }
    if !errors.is_empty() {
        println!("Échecs: {}", errors.len());
        for error in &errors {
            println!("  - {}", error);
        }
    }

    let stats = db.collect_stats().await?;
    info!(
        target: coaching_ops::TARGET_DB,
        "Catalog stats (published:unpublished:missing-thumbnail): {}", stats
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_video_key() {
        assert!(is_video_key("videos/pilates/Abdominaux/18. Crunch.mp4"));
        assert!(is_video_key("videos/pilates/Dos/Extension.MOV"));
        assert!(!is_video_key("videos/pilates/Abdominaux/notes.txt"));
        assert!(!is_video_key("videos/pilates/Abdominaux/"));
    }

    #[test]
    fn test_region_from_key() {
        assert_eq!(
            region_from_key(
                "videos/pilates/Abdominaux/18. Crunch inversé.mp4",
                "videos/pilates/"
            ),
            Some("Abdominaux")
        );
        // Files sitting directly under the prefix have no region folder.
        assert_eq!(
            region_from_key("videos/pilates/intro.mp4", "videos/pilates/"),
            None
        );
        assert_eq!(region_from_key("other/area/clip.mp4", "videos/pilates/"), None);
    }

    #[test]
    fn test_category_from_key() {
        assert_eq!(
            category_from_key("videos/programmes-predefinis/debutant/seance1.mp4"),
            "Predefined Programs"
        );
        assert_eq!(
            category_from_key("videos/pilates/Abdominaux/18. Crunch.mp4"),
            "Muscle Groups"
        );
    }
}
