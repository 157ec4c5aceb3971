use serde::{Deserialize, Serialize};
use std::fmt;

/// The seven canonical intensity levels. The French labels are the domain's
/// actual vocabulary and are stored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intensity {
    ToutNiveau,
    Debutant,
    DebutantIntermediaire,
    Intermediaire,
    IntermediaireAvance,
    Avance,
    TresAvance,
}

impl Intensity {
    pub const ALL: [Intensity; 7] = [
        Intensity::ToutNiveau,
        Intensity::Debutant,
        Intensity::DebutantIntermediaire,
        Intensity::Intermediaire,
        Intensity::IntermediaireAvance,
        Intensity::Avance,
        Intensity::TresAvance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Intensity::ToutNiveau => "Tout niveau",
            Intensity::Debutant => "Débutant",
            Intensity::DebutantIntermediaire => "Débutant et intermédiaire",
            Intensity::Intermediaire => "Intermédiaire",
            Intensity::IntermediaireAvance => "Intermédiaire et avancé",
            Intensity::Avance => "Avancé",
            Intensity::TresAvance => "Très Avancé",
        }
    }

    /// Parse an exact canonical label back into its variant.
    pub fn from_label(label: &str) -> Option<Intensity> {
        Intensity::ALL.into_iter().find(|i| i.label() == label)
    }

    pub fn is_canonical(label: &str) -> bool {
        Intensity::from_label(label).is_some()
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One exercise's metadata, regardless of whether it came from a Markdown
/// document, an extracted Word text, or a database row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub title: String,

    // Ordinal parsed from the title; decimals are named sub-variants
    // (10.1 sorts after 10 and before 11).
    pub order_number: Option<f64>,

    pub targeted_muscles: Vec<String>,
    pub starting_position: String,
    pub movement: String,

    // Raw intensity text, before normalization
    pub intensity: String,

    pub series: String,
    pub constraints: String,
    pub theme: String,
    pub region: String,

    // Originating document, for traceability
    pub source: String,
}

impl ExerciseRecord {
    pub fn new(title: &str, order_number: Option<f64>, region: &str, source: &str) -> Self {
        ExerciseRecord {
            title: title.to_string(),
            order_number,
            region: region.to_string(),
            source: source.to_string(),
            ..Default::default()
        }
    }

    /// A record is complete only when all three critical fields are present.
    pub fn is_complete(&self) -> bool {
        !self.targeted_muscles.is_empty()
            && !self.starting_position.is_empty()
            && !self.movement.is_empty()
    }

    /// Titled but missing at least one critical field.
    pub fn is_partial(&self) -> bool {
        !self.is_complete()
    }

    /// "Aucune" is the documents' way of writing "none"; it is stored
    /// verbatim but does not count as a real contraindication.
    pub fn has_constraints(&self) -> bool {
        let value = self.constraints.trim();
        !value.is_empty() && !value.eq_ignore_ascii_case("aucune")
    }
}

/// How a pair of titles was matched by the 0-100 comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Partial,
    Keywords,
    Containment,
    None,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::Exact => write!(f, "exact"),
            MatchType::Partial => write!(f, "partial"),
            MatchType::Keywords => write!(f, "keywords"),
            MatchType::Containment => write!(f, "containment"),
            MatchType::None => write!(f, "none"),
        }
    }
}

/// Token-overlap similarity between two titles, each component in [0, 1].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenScore {
    pub jaccard: f64,
    pub coverage_a: f64,
    pub coverage_b: f64,
    pub overlapping: Vec<String>,
}

impl TokenScore {
    /// Arithmetic mean of the three components.
    pub fn total(&self) -> f64 {
        (self.jaccard + self.coverage_a + self.coverage_b) / 3.0
    }
}

/// Best-effort correspondence for one record of collection A.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub a_index: usize,
    // None when no B candidate cleared the score gate
    pub b_index: Option<usize>,
    pub score: TokenScore,
}

impl MatchCandidate {
    pub fn is_matched(&self) -> bool {
        self.b_index.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_labels_round_trip() {
        for intensity in Intensity::ALL {
            assert_eq!(Intensity::from_label(intensity.label()), Some(intensity));
        }
        assert!(Intensity::from_label("avancé").is_none());
        assert!(Intensity::is_canonical("Très Avancé"));
        assert!(!Intensity::is_canonical("tres avance"));
    }

    #[test]
    fn test_completeness_requires_all_critical_fields() {
        let mut record = ExerciseRecord::new("Crunch", Some(18.0), "abdos", "abdominaux.md");
        assert!(!record.is_complete());

        record.targeted_muscles = vec!["Grand droit".to_string()];
        record.starting_position = "Allongé sur le dos.".to_string();
        assert!(!record.is_complete());

        record.movement = "Enrouler le buste.".to_string();
        assert!(record.is_complete());
        assert!(!record.is_partial());
    }

    #[test]
    fn test_constraints_aucune_counts_as_absent() {
        let mut record = ExerciseRecord::new("Gainage", None, "abdos", "abdominaux.md");
        record.constraints = "Aucune".to_string();
        assert!(!record.has_constraints());
        // A record with only a title and "Aucune" is not complete
        assert!(!record.is_complete());

        record.constraints = "Hernie discale".to_string();
        assert!(record.has_constraints());
    }

    #[test]
    fn test_decimal_ordinals_sort_between_integers() {
        let mut numbers = [11.0_f64, 10.2, 10.0, 10.1];
        numbers.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(numbers, [10.0, 10.1, 10.2, 11.0]);
    }
}
