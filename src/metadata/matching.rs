use std::collections::HashSet;
use tracing::debug;

use super::intensity::fold;
use super::types::{MatchCandidate, TokenScore};
use super::TARGET_METADATA;

/// Articles and prepositions that carry no signal for title matching.
pub const FRENCH_STOP_WORDS: &[&str] = &[
    "le", "la", "les", "de", "du", "des", "avec", "sur", "au", "aux", "et", "en", "pour", "dans",
    "par",
];

/// Matcher behavior, passed explicitly by each call site.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    // Minimum total score for a pair to count as a match
    pub min_score: f64,
    // Claim each B-record at most once (greedy, highest score first)
    pub enforce_one_to_one: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            min_score: 0.4,
            enforce_one_to_one: false,
        }
    }
}

/// Break a title into sorted, deduplicated key tokens: accent-folded,
/// lowercased, split on non-alphanumeric runs, short tokens and stop words
/// discarded. Sorting keeps debugging output stable.
pub fn tokenize(title: &str) -> Vec<String> {
    let folded = fold(title);
    let mut tokens: Vec<String> = folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 2 && !FRENCH_STOP_WORDS.contains(token))
        .map(|token| token.to_string())
        .collect();
    tokens.sort();
    tokens.dedup();
    tokens
}

/// Jaccard plus bidirectional coverage over two token sets.
pub fn score_tokens(a: &[String], b: &[String]) -> TokenScore {
    let set_a: HashSet<&String> = a.iter().collect();
    let set_b: HashSet<&String> = b.iter().collect();

    let mut overlapping: Vec<String> = set_a
        .intersection(&set_b)
        .map(|token| (*token).clone())
        .collect();
    overlapping.sort();

    let union = set_a.union(&set_b).count();
    let inter = overlapping.len();

    // Two empty token sets have nothing to agree on
    let ratio = |num: usize, den: usize| {
        if den == 0 {
            0.0
        } else {
            num as f64 / den as f64
        }
    };

    TokenScore {
        jaccard: ratio(inter, union),
        coverage_a: ratio(inter, set_a.len()),
        coverage_b: ratio(inter, set_b.len()),
        overlapping,
    }
}

/// Convenience: tokenize both titles and score them.
pub fn score_titles(a: &str, b: &str) -> TokenScore {
    score_tokens(&tokenize(a), &tokenize(b))
}

/// For every A-title, pick the best B-title above the score gate.
///
/// With `enforce_one_to_one` disabled (the default), each A-record
/// independently picks its best B-record, so two A-records may claim the
/// same B-record. Ties go to the first B occurrence.
pub fn find_best_matches(a: &[String], b: &[String], config: &MatchConfig) -> Vec<MatchCandidate> {
    let a_tokens: Vec<Vec<String>> = a.iter().map(|t| tokenize(t)).collect();
    let b_tokens: Vec<Vec<String>> = b.iter().map(|t| tokenize(t)).collect();

    if config.enforce_one_to_one {
        return assign_one_to_one(&a_tokens, &b_tokens, config);
    }

    let mut results = Vec::with_capacity(a.len());
    for (a_index, tokens) in a_tokens.iter().enumerate() {
        let mut best: Option<(usize, TokenScore)> = None;
        for (b_index, other) in b_tokens.iter().enumerate() {
            let score = score_tokens(tokens, other);
            if score.total() <= config.min_score {
                continue;
            }
            let better = match &best {
                Some((_, current)) => score.total() > current.total(),
                None => true,
            };
            if better {
                best = Some((b_index, score));
            }
        }

        match best {
            Some((b_index, score)) => {
                debug!(
                    target: TARGET_METADATA,
                    "Matched A[{}] -> B[{}] with total {:.3}", a_index, b_index, score.total()
                );
                results.push(MatchCandidate {
                    a_index,
                    b_index: Some(b_index),
                    score,
                });
            }
            None => results.push(MatchCandidate {
                a_index,
                b_index: None,
                score: TokenScore::default(),
            }),
        }
    }
    results
}

// Greedy assignment: all gated pairs sorted by score descending, each A and
// each B claimed at most once.
fn assign_one_to_one(
    a_tokens: &[Vec<String>],
    b_tokens: &[Vec<String>],
    config: &MatchConfig,
) -> Vec<MatchCandidate> {
    let mut pairs: Vec<(usize, usize, TokenScore)> = Vec::new();
    for (a_index, tokens) in a_tokens.iter().enumerate() {
        for (b_index, other) in b_tokens.iter().enumerate() {
            let score = score_tokens(tokens, other);
            if score.total() > config.min_score {
                pairs.push((a_index, b_index, score));
            }
        }
    }

    pairs.sort_by(|x, y| {
        y.2.total()
            .total_cmp(&x.2.total())
            .then(x.0.cmp(&y.0))
            .then(x.1.cmp(&y.1))
    });

    let mut claimed_a = vec![false; a_tokens.len()];
    let mut claimed_b = vec![false; b_tokens.len()];
    let mut assigned: Vec<Option<(usize, TokenScore)>> = vec![None; a_tokens.len()];

    for (a_index, b_index, score) in pairs {
        if claimed_a[a_index] || claimed_b[b_index] {
            continue;
        }
        claimed_a[a_index] = true;
        claimed_b[b_index] = true;
        assigned[a_index] = Some((b_index, score));
    }

    assigned
        .into_iter()
        .enumerate()
        .map(|(a_index, best)| match best {
            Some((b_index, score)) => MatchCandidate {
                a_index,
                b_index: Some(b_index),
                score,
            },
            None => MatchCandidate {
                a_index,
                b_index: None,
                score: TokenScore::default(),
            },
        })
        .collect()
}

/// Near-exact shortcut used before token scoring in the filename-repair
/// path: strip everything but letters and digits and test containment.
pub fn containment_match(a: &str, b: &str) -> bool {
    let normalize = |s: &str| {
        fold(s)
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
    };
    let norm_a = normalize(a);
    let norm_b = normalize(b);
    if norm_a.is_empty() || norm_b.is_empty() {
        return false;
    }
    norm_a.contains(&norm_b) || norm_b.contains(&norm_a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(a: &str, b: &str) -> f64 {
        score_titles(a, b).total()
    }

    #[test]
    fn test_tokenize_folds_accents_and_drops_stop_words() {
        let tokens = tokenize("Élévation latérale avec les haltères");
        assert_eq!(tokens, vec!["elevation", "halteres", "laterale"]);
    }

    #[test]
    fn test_score_bounds() {
        let pairs = [
            ("Crunch inversé", "Crunch inversé"),
            ("Crunch inversé", "Développé couché"),
            ("Gainage latéral", "Gainage"),
            ("", ""),
        ];
        for (a, b) in pairs {
            let t = total(a, b);
            assert!((0.0..=1.0).contains(&t), "score {} out of bounds", t);
        }
    }

    #[test]
    fn test_identical_sets_score_one() {
        assert_eq!(total("Crunch inversé", "crunch INVERSE"), 1.0);
    }

    #[test]
    fn test_disjoint_sets_score_zero() {
        assert_eq!(total("Crunch inversé", "Développé couché"), 0.0);
    }

    #[test]
    fn test_shared_token_strictly_increases_score() {
        let without = total("crunch sol", "developpe banc");
        let with = total("crunch sol poulie", "developpe banc poulie");
        assert!(with > without);
    }

    #[test]
    fn test_matcher_is_deterministic() {
        let a = vec![
            "Crunch inversé".to_string(),
            "Gainage latéral".to_string(),
            "Pont fessier".to_string(),
        ];
        let b = vec![
            "Gainage latéral sur coude".to_string(),
            "Crunch inversé au sol".to_string(),
            "Extension triceps".to_string(),
        ];
        let config = MatchConfig::default();
        let first = find_best_matches(&a, &b, &config);
        let second = find_best_matches(&a, &b, &config);
        assert_eq!(first.len(), second.len());
        for (x, y) in first.iter().zip(second.iter()) {
            assert_eq!(x.b_index, y.b_index);
            assert_eq!(x.score.total(), y.score.total());
        }
        assert_eq!(first[0].b_index, Some(1));
        assert_eq!(first[1].b_index, Some(0));
    }

    #[test]
    fn test_unmatched_records_are_surfaced_not_dropped() {
        let a = vec!["Curl biceps marteau".to_string()];
        let b = vec!["Squat sumo".to_string()];
        let results = find_best_matches(&a, &b, &MatchConfig::default());
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_matched());
    }

    #[test]
    fn test_independent_best_pick_allows_duplicate_claims() {
        let a = vec![
            "Crunch au sol".to_string(),
            "Crunch au sol lesté".to_string(),
        ];
        let b = vec!["Crunch sol".to_string()];
        let results = find_best_matches(&a, &b, &MatchConfig::default());
        assert_eq!(results[0].b_index, Some(0));
        assert_eq!(results[1].b_index, Some(0));
    }

    #[test]
    fn test_one_to_one_claims_each_b_once() {
        let a = vec![
            "Crunch au sol".to_string(),
            "Crunch au sol lesté".to_string(),
        ];
        let b = vec!["Crunch sol".to_string()];
        let config = MatchConfig {
            enforce_one_to_one: true,
            ..Default::default()
        };
        let results = find_best_matches(&a, &b, &config);
        let matched: Vec<_> = results.iter().filter(|r| r.is_matched()).collect();
        assert_eq!(matched.len(), 1);
        // The higher-scoring A-record wins the single B-record
        assert_eq!(results[0].b_index, Some(0));
        assert_eq!(results[1].b_index, None);
    }

    #[test]
    fn test_containment_match_ignores_punctuation_and_accents() {
        assert!(containment_match(
            "Gainage latéral",
            "10.1 Gainage-latéral-thumb.jpg"
        ));
        assert!(!containment_match("Crunch", "Squat"));
        assert!(!containment_match("", "Squat"));
    }
}
