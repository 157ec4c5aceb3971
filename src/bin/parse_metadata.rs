use anyhow::{Context, Result};
use clap::Parser;
use coaching_ops::metadata::extraction::extract_plain_text;
use coaching_ops::metadata::extractor::extract_exercises;
use std::path::PathBuf;
use tracing::info;

/// Parse a plain-text exercise document and emit structured metadata.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the exported document (plain text or markdown)
    file: PathBuf,

    /// Body region the document covers (e.g. "Abdominaux")
    #[arg(short, long)]
    region: String,

    /// Where to write the extracted JSON (default: data/metadata-<region>.json)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    coaching_ops::logging::configure_logging();

    let cli = Cli::parse();

    let source = cli
        .file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| cli.file.display().to_string());

    info!("Parsing {} for region {}", cli.file.display(), cli.region);
    let text = extract_plain_text(&cli.file)?;
    let exercises = extract_exercises(&text, &cli.region, &source);

    let complete = exercises.iter().filter(|e| e.is_complete()).count();
    let partial = exercises.iter().filter(|e| e.is_partial()).count();
    let with_constraints = exercises.iter().filter(|e| e.has_constraints()).count();

    println!("Exercices extraits: {}", exercises.len());
    println!("  Complets: {}", complete);
    println!("  Partiels: {}", partial);
    println!("  Avec contre-indications: {}", with_constraints);
    println!();

    for exercise in &exercises {
        let marker = if exercise.is_complete() {
            "✅"
        } else if exercise.is_partial() {
            "⚠️ "
        } else {
            "❌"
        };
        println!("{} {}", marker, exercise.title);
        if !exercise.targeted_muscles.is_empty() {
            println!("     Muscles: {}", exercise.targeted_muscles.join(", "));
        }
        if !exercise.intensity.is_empty() {
            println!("     Intensité: {}", exercise.intensity);
        }
    }

    let output = cli.output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "data/metadata-{}.json",
            cli.region.to_lowercase().replace(' ', "-")
        ))
    });
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&exercises)?;
    std::fs::write(&output, json)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!();
    println!("Métadonnées écrites dans {}", output.display());

    Ok(())
}
