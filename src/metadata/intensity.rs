use tracing::warn;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::types::Intensity;
use super::TARGET_METADATA;

/// Lowercase and strip diacritics, so "Débutant", "DEBUTANT" and "debutant"
/// all compare equal.
pub fn fold(raw: &str) -> String {
    raw.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// Map any raw intensity string to one of the seven canonical levels.
///
/// Total and deterministic; unmapped input falls back to "Tout niveau" with
/// a warning, since it indicates an unanticipated value worth reviewing.
pub fn normalize(raw: &str) -> Intensity {
    match recognize(raw, true) {
        Some(intensity) => intensity,
        None => {
            warn!(
                target: TARGET_METADATA,
                "Unmapped intensity value: \"{}\" -> \"Tout niveau\" (default)", raw
            );
            Intensity::ToutNiveau
        }
    }
}

/// Returns `None` instead of warning when nothing matched, for callers that
/// want to surface unmapped values themselves.
pub fn try_normalize(raw: &str) -> Option<Intensity> {
    recognize(raw, true)
}

// The rules overlap, so the order matters: combined levels are tested before
// their single-level substrings.
fn recognize(raw: &str, allow_prefix_strip: bool) -> Option<Intensity> {
    let folded = fold(raw);

    if folded.is_empty() {
        return Some(Intensity::ToutNiveau);
    }

    // "tour niveau" is a recorded typo in the source documents
    if folded.contains("tout niveau")
        || folded.contains("tous les niveaux")
        || folded.contains("tour niveau")
    {
        return Some(Intensity::ToutNiveau);
    }

    if folded.contains("tres avance") {
        return Some(Intensity::TresAvance);
    }

    if folded.contains("debutant") && folded.contains("intermediaire") {
        return Some(Intensity::DebutantIntermediaire);
    }

    // Either order; "avancer" is a recurring misspelling of "avancé"
    if folded.contains("intermediaire") && folded.contains("avance") {
        return Some(Intensity::IntermediaireAvance);
    }

    if folded == "debutant" {
        return Some(Intensity::Debutant);
    }

    if folded == "intermediaire" {
        return Some(Intensity::Intermediaire);
    }

    if folded == "avance" {
        return Some(Intensity::Avance);
    }

    if allow_prefix_strip {
        if let Some(stripped) = strip_niveau_prefix(raw) {
            return recognize(stripped, false);
        }
    }

    None
}

fn strip_niveau_prefix(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let folded = fold(trimmed);
    if folded.starts_with("niveau ") {
        // The prefix is ASCII, so the folded match maps to the same byte offset
        let prefix_len = "niveau ".len();
        trimmed.get(prefix_len..).map(str::trim)
    } else {
        None
    }
}

/// Cosmetic cleanup for display-only free-text fields: strip a leading colon,
/// trailing periods, and capitalize the first letter.
pub fn tidy_field(raw: &str) -> String {
    let stripped = raw
        .trim()
        .trim_start_matches(':')
        .trim()
        .trim_end_matches('.')
        .trim();

    let mut chars = stripped.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_is_total_over_all_canonical_labels() {
        for intensity in Intensity::ALL {
            assert_eq!(normalize(intensity.label()), intensity);
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "debutant",
            "Niveau avancé",
            "Avancé et intermédiaire",
            "tour niveau",
            "n'importe quoi",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(once.label()), once);
        }
    }

    #[test]
    fn test_case_and_accent_insensitive() {
        assert_eq!(normalize("debutant"), Intensity::Debutant);
        assert_eq!(normalize("DEBUTANT "), Intensity::Debutant);
        assert_eq!(normalize("Débutant"), Intensity::Debutant);
        assert_eq!(normalize("tres avance"), Intensity::TresAvance);
    }

    #[test]
    fn test_typo_corrections() {
        assert_eq!(normalize("Tour niveau"), Intensity::ToutNiveau);
        assert_eq!(
            normalize("Intermédiaire et avancer"),
            Intensity::IntermediaireAvance
        );
    }

    #[test]
    fn test_combined_levels_are_order_canonicalized() {
        assert_eq!(
            normalize("Avancé et intermédiaire"),
            Intensity::IntermediaireAvance
        );
        assert_eq!(
            normalize("Intermédiaire et avancé"),
            Intensity::IntermediaireAvance
        );
        assert_eq!(
            normalize("Débutant et intermédiaire"),
            Intensity::DebutantIntermediaire
        );
        assert_eq!(
            normalize("intermédiaire-avancé"),
            Intensity::IntermediaireAvance
        );
    }

    #[test]
    fn test_empty_and_unknown_default_to_tout_niveau() {
        assert_eq!(normalize(""), Intensity::ToutNiveau);
        assert_eq!(normalize("   "), Intensity::ToutNiveau);
        assert_eq!(normalize("quelque chose d'autre"), Intensity::ToutNiveau);
        assert!(try_normalize("quelque chose d'autre").is_none());
    }

    #[test]
    fn test_niveau_prefix_stripped_then_rematched() {
        assert_eq!(normalize("Niveau avancé"), Intensity::Avance);
        assert_eq!(normalize("niveau débutant"), Intensity::Debutant);
        // Only one round of prefix stripping
        assert!(try_normalize("Niveau Niveau avancé").is_none());
    }

    #[test]
    fn test_single_levels_require_exact_value() {
        assert_eq!(normalize("avancé"), Intensity::Avance);
        assert_eq!(normalize("Très avancé"), Intensity::TresAvance);
        assert_eq!(normalize("intermédiaire"), Intensity::Intermediaire);
    }

    #[test]
    fn test_tidy_field() {
        assert_eq!(tidy_field(": débutant"), "Débutant");
        assert_eq!(tidy_field("intermédiaire."), "Intermédiaire");
        assert_eq!(tidy_field("  avancé  "), "Avancé");
        assert_eq!(tidy_field(""), "");
    }
}
