use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use super::TARGET_METADATA;

/// Load a metadata document as plain text with normalized line endings.
///
/// Word documents are converted to Markdown/plain text upstream; this side
/// only ever sees UTF-8 text files.
pub fn extract_plain_text(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read metadata file: {}", path.display()))?;
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    info!(
        target: TARGET_METADATA,
        "Extracted {} characters from {}",
        text.len(),
        path.display()
    );
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_file_reports_path_in_error() {
        let missing = PathBuf::from("data/nonexistent-metadata.txt");
        let err = extract_plain_text(&missing).unwrap_err();
        assert!(err.to_string().contains("nonexistent-metadata.txt"));
    }
}
