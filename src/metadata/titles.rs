use lazy_static::lazy_static;
use regex::Regex;

use super::intensity::fold;
use super::types::MatchType;

lazy_static! {
    // Leading ordinals: "18.", "10.1", "10.1. "
    static ref LEADING_ORDINAL: Regex = Regex::new(r"^\d+(?:\.\d+)?\.?\s*").unwrap();
    // Trailing or isolated f/h/x filming codes left over from filenames
    static ref TRAILING_CODE: Regex = Regex::new(r"\s+[fhx]\s*$").unwrap();
    static ref ISOLATED_CODE: Regex = Regex::new(r"\s+[fhx]\s+").unwrap();
    static ref NON_WORD: Regex = Regex::new(r"[^a-z0-9\s+]").unwrap();
    static ref PLUS_RUN: Regex = Regex::new(r"\s*\+\s*").unwrap();
    static ref SPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Strip a leading ordinal and collapse whitespace, keeping the display form.
pub fn clean_title(title: &str) -> String {
    let without_ordinal = LEADING_ORDINAL.replace(title.trim(), "");
    SPACE_RUN.replace_all(without_ordinal.trim(), " ").to_string()
}

/// Comparison form: cleaned, lowercased, accent-folded, filming codes and
/// punctuation removed. '+' is kept as a meaningful separator (combined
/// exercises).
pub fn normalize_title(title: &str) -> String {
    let cleaned = fold(&clean_title(title));
    let cleaned = TRAILING_CODE.replace(&cleaned, "");
    let cleaned = ISOLATED_CODE.replace_all(&cleaned, " ");
    let cleaned = NON_WORD.replace_all(&cleaned, " ");
    let cleaned = PLUS_RUN.replace_all(&cleaned, " + ");
    SPACE_RUN.replace_all(cleaned.trim(), " ").to_string()
}

/// Title filename form: derive a display title from an object key's file
/// name (ordinal stripped, separators to spaces, first letter capitalized).
pub fn title_from_filename(filename: &str) -> String {
    let stem = match filename.rsplit_once('.') {
        Some((stem, _ext)) => stem,
        None => filename,
    };
    let cleaned = LEADING_ORDINAL.replace(stem.trim(), "");
    let with_spaces = cleaned.replace(['-', '_'], " ");
    let collapsed = SPACE_RUN.replace_all(with_spaces.trim(), " ").to_string();

    let mut chars = collapsed.chars();
    match chars.next() {
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        }
        None => collapsed,
    }
}

/// Compare two titles on a 0-100 scale.
///
/// Exact normalized equality scores 100; containment scores by length
/// ratio (capped 90); two or more shared keywords score 60-95; anything
/// else scores 0.
pub fn compare_titles(a: &str, b: &str) -> (u8, MatchType) {
    let norm_a = normalize_title(a);
    let norm_b = normalize_title(b);

    if norm_a.is_empty() || norm_b.is_empty() {
        return (0, MatchType::None);
    }

    if norm_a == norm_b {
        return (100, MatchType::Exact);
    }

    if norm_a.contains(&norm_b) || norm_b.contains(&norm_a) {
        let (longer, shorter) = if norm_a.len() > norm_b.len() {
            (norm_a.len(), norm_b.len())
        } else {
            (norm_b.len(), norm_a.len())
        };
        let ratio = shorter as f64 / longer as f64;
        return ((ratio * 90.0).round() as u8, MatchType::Partial);
    }

    let words_a: Vec<&str> = norm_a.split_whitespace().filter(|w| w.len() > 2).collect();
    let words_b: Vec<&str> = norm_b.split_whitespace().filter(|w| w.len() > 2).collect();
    let common = words_a.iter().filter(|w| words_b.contains(w)).count();

    if common >= 2 {
        let total = words_a.len().max(words_b.len());
        let ratio = common as f64 / total as f64;
        let score = (60.0 + ratio * 30.0).round().min(95.0) as u8;
        return (score, MatchType::Keywords);
    }

    (0, MatchType::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title_strips_ordinals() {
        assert_eq!(clean_title("18.        Crunch inversé"), "Crunch inversé");
        assert_eq!(clean_title("10.1 Gainage latéral"), "Gainage latéral");
        assert_eq!(clean_title("Crunch inversé"), "Crunch inversé");
    }

    #[test]
    fn test_normalize_title_removes_filming_codes() {
        assert_eq!(normalize_title("Crunch inversé f"), "crunch inverse");
        assert_eq!(normalize_title("Crunch h au sol"), "crunch au sol");
        assert_eq!(normalize_title("Squat + fente"), "squat + fente");
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(
            title_from_filename("10.1 gainage-lateral.mp4"),
            "Gainage lateral"
        );
        assert_eq!(title_from_filename("2. Crunch_inverse.mov"), "Crunch inverse");
    }

    #[test]
    fn test_compare_exact_after_normalization() {
        let (score, match_type) = compare_titles("18. Crunch inversé", "Crunch inverse");
        assert_eq!(score, 100);
        assert_eq!(match_type, MatchType::Exact);
    }

    #[test]
    fn test_compare_containment_scores_by_ratio() {
        let (score, match_type) = compare_titles("Gainage", "Gainage latéral");
        assert_eq!(match_type, MatchType::Partial);
        assert!(score < 90);
        assert!(score > 0);
    }

    #[test]
    fn test_compare_keyword_overlap() {
        let (score, match_type) =
            compare_titles("Crunch inversé au sol", "Crunch sol avec poulie");
        assert_eq!(match_type, MatchType::Keywords);
        assert!((60..=95).contains(&score));
    }

    #[test]
    fn test_compare_unrelated_scores_zero() {
        let (score, match_type) = compare_titles("Crunch inversé", "Développé militaire");
        assert_eq!(score, 0);
        assert_eq!(match_type, MatchType::None);
    }
}
