use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::types::ExerciseRecord;
use super::TARGET_METADATA;

/// Which section of an exercise block subsequent lines belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Muscles,
    StartingPosition,
    Movement,
    Intensity,
    Series,
    Constraints,
    Theme,
}

impl Section {
    /// Starting position and movement span multiple source lines; the other
    /// sections take the first captured value only.
    fn accumulates(self) -> bool {
        matches!(self, Section::StartingPosition | Section::Movement)
    }
}

struct HeaderRule {
    section: Section,
    pattern: Regex,
}

lazy_static! {
    // Ordered dispatcher: each rule recognizes one section header, with or
    // without bold markers, and positions the capture after the separator.
    static ref HEADER_RULES: Vec<HeaderRule> = vec![
        HeaderRule {
            section: Section::Muscles,
            pattern: Regex::new(r"(?i)\*{0,2}Muscle\s+cible\s*\*{0,2}\s*[:.]?\s*").unwrap(),
        },
        HeaderRule {
            section: Section::StartingPosition,
            pattern: Regex::new(r"(?i)\*{0,2}Position\s+(?:de\s+)?d[ée]part\s*\*{0,2}\s*[:.]?\s*")
                .unwrap(),
        },
        HeaderRule {
            section: Section::Movement,
            pattern: Regex::new(r"(?i)\*{0,2}Mouvement\s*\*{0,2}\s*[:.]?\s*").unwrap(),
        },
        HeaderRule {
            section: Section::Intensity,
            pattern: Regex::new(r"(?i)\*{0,2}Intensit[ée]\s*\*{0,2}\s*[:.]?\s*").unwrap(),
        },
        HeaderRule {
            section: Section::Series,
            pattern: Regex::new(r"(?i)\*{0,2}S[ée]rie\s*:?\s*\*{0,2}\s*[:.]?\s*").unwrap(),
        },
        HeaderRule {
            section: Section::Constraints,
            pattern: Regex::new(r"(?i)\*{0,2}Contre\s*-?\s*indication\s*:?\s*\*{0,2}\s*[:.]?\s*")
                .unwrap(),
        },
        HeaderRule {
            section: Section::Theme,
            pattern: Regex::new(r"(?i)\*{0,2}Th[èe]me\s*:?\s*\*{0,2}\s*[:.]?\s*").unwrap(),
        },
    ];

    // Title forms: bold with ordinal, then plain with ordinal. The ordinal
    // may be decimal (sub-variant) and may run into the title with no space.
    static ref BOLD_TITLE: Regex =
        Regex::new(r"^\*\*(\d+(?:\.\d+)?)\.?\s*(.+?)\*\*$").unwrap();
    static ref PLAIN_TITLE: Regex = Regex::new(r"^(\d+(?:\.\d+)?)\.?\s*(\S.*)$").unwrap();

    // Word-extracted documents set unnumbered titles apart with a blank
    // line, then open the block with the muscle or position header.
    static ref UNNUMBERED_GUARD: Regex =
        Regex::new(r"(?i)^(?:\*{0,2})(?:Muscle\s+cible|Position)").unwrap();
}

// A numbered line is only a title if the muscle-target header follows soon
// after; this guards against body text that happens to start with a number.
const TITLE_LOOKAHEAD: usize = 5;

/// Extract every exercise block found in a document.
///
/// `source` identifies the originating document, `region` is the body-area
/// group the document covers.
pub fn extract_exercises(text: &str, region: &str, source: &str) -> Vec<ExerciseRecord> {
    // Blank lines carry structure (they delimit unnumbered titles), so the
    // raw line positions are kept and blanks skipped in the loop instead.
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut exercises: Vec<ExerciseRecord> = Vec::new();
    let mut current: Option<ExerciseRecord> = None;
    let mut section: Option<Section> = None;

    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }

        if let Some((order_number, title)) = detect_title(line, &lines, i) {
            finalize(&mut exercises, current.take());
            current = Some(ExerciseRecord::new(&title, order_number, region, source));
            section = None;
            continue;
        }

        let Some(record) = current.as_mut() else {
            // Section data before any title is discarded
            continue;
        };

        let headers = match_headers(line);
        if !headers.is_empty() {
            for (rule_section, value) in &headers {
                apply_header_value(record, *rule_section, value);
            }
            section = Some(headers.last().map(|(s, _)| *s).unwrap());
            continue;
        }

        if let Some(active) = section {
            append_content(record, active, line);
        }
    }

    finalize(&mut exercises, current.take());
    debug!(
        target: TARGET_METADATA,
        "Extracted {} exercise(s) from {}",
        exercises.len(),
        source
    );
    exercises
}

fn finalize(exercises: &mut Vec<ExerciseRecord>, record: Option<ExerciseRecord>) {
    if let Some(record) = record {
        if !record.title.is_empty() {
            exercises.push(record);
        }
    }
}

/// Recognize a title line. Numbered titles are gated by the lookahead for
/// the muscle-target header; unnumbered ones additionally require a blank
/// line and then a section header right after, so that continuation lines
/// of a multi-line section are never promoted to titles.
fn detect_title(line: &str, lines: &[&str], index: usize) -> Option<(Option<f64>, String)> {
    if is_header_line(line) {
        return None;
    }

    if followed_by_muscle_header(lines, index) {
        for pattern in [&*BOLD_TITLE, &*PLAIN_TITLE] {
            if let Some(captures) = pattern.captures(line) {
                let ordinal = captures[1].parse::<f64>().ok();
                let title = clean_title_text(&captures[2]);
                if !title.is_empty() {
                    return Some((ordinal, title));
                }
            }
        }
    }

    // Unnumbered title lines exist in the Word-extracted documents
    let next = lines.get(index + 1).copied().unwrap_or("");
    let after = lines.get(index + 2).copied().unwrap_or("");
    if next.is_empty()
        && UNNUMBERED_GUARD.is_match(after)
        && !line.starts_with('-')
        && !line.starts_with('#')
        && !line.starts_with('*')
        && line.len() > 5
    {
        return Some((None, clean_title_text(line)));
    }

    None
}

fn followed_by_muscle_header(lines: &[&str], index: usize) -> bool {
    lines
        .iter()
        .skip(index + 1)
        .take(TITLE_LOOKAHEAD)
        .any(|line| line.to_lowercase().contains("muscle cible"))
}

fn is_header_line(line: &str) -> bool {
    HEADER_RULES
        .iter()
        .any(|rule| matches_as_header(&rule.pattern, line).is_some())
}

/// A header occurrence only counts at line start or in bold, so prose that
/// merely mentions "mouvement" is not treated as a section switch.
fn matches_as_header<'a>(pattern: &Regex, line: &'a str) -> Option<regex::Match<'a>> {
    pattern
        .find(line)
        .filter(|m| m.start() == 0 || line[m.start()..].starts_with("**"))
}

/// Locate every section header on one physical line, in order of position,
/// with the value text that belongs to each.
fn match_headers(line: &str) -> Vec<(Section, String)> {
    let mut found: Vec<(usize, usize, Section)> = Vec::new();
    for rule in HEADER_RULES.iter() {
        if let Some(m) = matches_as_header(&rule.pattern, line) {
            found.push((m.start(), m.end(), rule.section));
        }
    }
    found.sort_by_key(|(start, _, _)| *start);

    let mut results = Vec::new();
    for (i, (_, value_start, section)) in found.iter().enumerate() {
        let value_end = found
            .get(i + 1)
            .map(|(next_start, _, _)| *next_start)
            .unwrap_or(line.len());
        let raw = &line[*value_start..value_end.max(*value_start)];
        results.push((*section, clean_value(raw)));
    }
    results
}

fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_end_matches("**")
        .trim_start_matches("**")
        .trim()
        .trim_start_matches(':')
        .trim()
        .to_string()
}

fn clean_title_text(raw: &str) -> String {
    raw.trim()
        .trim_start_matches("**")
        .trim_end_matches("**")
        .trim()
        .to_string()
}

fn apply_header_value(record: &mut ExerciseRecord, section: Section, value: &str) {
    match section {
        Section::Muscles => {
            if !value.is_empty() {
                record.targeted_muscles = split_muscles(value);
            }
        }
        Section::StartingPosition => {
            if !value.is_empty() {
                record.starting_position = value.to_string();
            }
        }
        Section::Movement => {
            if !value.is_empty() {
                record.movement = value.to_string();
            }
        }
        Section::Intensity => {
            if !value.is_empty() {
                record.intensity = strip_trailing_period(value);
            }
        }
        Section::Series => {
            if !value.is_empty() {
                record.series = strip_trailing_period(value);
            }
        }
        Section::Constraints => {
            // An empty value after the colon stays an empty string
            record.constraints = strip_trailing_period(value);
        }
        Section::Theme => {
            if !value.is_empty() {
                record.theme = strip_trailing_period(value);
            }
        }
    }
}

fn append_content(record: &mut ExerciseRecord, section: Section, line: &str) {
    if section.accumulates() {
        let target = match section {
            Section::StartingPosition => &mut record.starting_position,
            Section::Movement => &mut record.movement,
            _ => unreachable!(),
        };
        if !target.is_empty() {
            target.push(' ');
        }
        target.push_str(line);
        return;
    }

    // Single-capture sections take the first following line only when the
    // header itself carried no value
    match section {
        Section::Muscles => {
            if record.targeted_muscles.is_empty() {
                record.targeted_muscles = split_muscles(line);
            }
        }
        Section::Intensity => {
            if record.intensity.is_empty() {
                record.intensity = strip_trailing_period(line);
            }
        }
        Section::Series => {
            if record.series.is_empty() {
                record.series = strip_trailing_period(line);
            }
        }
        Section::Constraints => {
            if record.constraints.is_empty() {
                record.constraints = strip_trailing_period(line);
            }
        }
        Section::Theme => {
            if record.theme.is_empty() {
                record.theme = strip_trailing_period(line);
            }
        }
        _ => {}
    }
}

fn split_muscles(text: &str) -> Vec<String> {
    text.trim_end_matches('.')
        .split(',')
        .map(|muscle| muscle.trim().to_string())
        .filter(|muscle| !muscle.is_empty())
        .collect()
}

fn strip_trailing_period(value: &str) -> String {
    value.trim().trim_end_matches('.').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_ordinal_title_block() {
        let text = "\
**10.1Gainage latéral**
Muscle cible : Obliques, épaule.
Position départ :
En appui sur l'avant-bras.
Mouvement :
Lever le bassin.
Intensité. Intermédiaire.
";
        let exercises = extract_exercises(text, "abdos", "abdominaux.md");
        assert_eq!(exercises.len(), 1);

        let record = &exercises[0];
        assert_eq!(record.order_number, Some(10.1));
        assert_eq!(record.title, "Gainage latéral");
        assert_eq!(record.targeted_muscles, vec!["Obliques", "épaule"]);
        assert_eq!(record.starting_position, "En appui sur l'avant-bras.");
        assert_eq!(record.movement, "Lever le bassin.");
        assert_eq!(record.intensity, "Intermédiaire");
        assert!(record.is_complete());
    }

    #[test]
    fn test_two_sections_on_one_line_split_correctly() {
        let text = "\
**3. Crunch**
**Muscle cible**: Grand droit **Position départ**: Allongé sur le dos
Mouvement : Enrouler le buste.
";
        let exercises = extract_exercises(text, "abdos", "abdominaux.md");
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].targeted_muscles, vec!["Grand droit"]);
        assert_eq!(exercises[0].starting_position, "Allongé sur le dos");
        assert_eq!(exercises[0].movement, "Enrouler le buste.");
    }

    #[test]
    fn test_multi_line_accumulation_joins_with_spaces() {
        let text = "\
12. Pont fessier
Muscle cible : Fessiers
Position de départ :
Allongé sur le dos,
pieds au sol.
Mouvement :
Monter le bassin
puis redescendre.
Série : 3x12 répétitions.
";
        let exercises = extract_exercises(text, "fessiers-jambes", "fessiers.md");
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].order_number, Some(12.0));
        assert_eq!(
            exercises[0].starting_position,
            "Allongé sur le dos, pieds au sol."
        );
        assert_eq!(exercises[0].movement, "Monter le bassin puis redescendre.");
        assert_eq!(exercises[0].series, "3x12 répétitions");
    }

    #[test]
    fn test_numbered_line_without_muscle_header_is_not_a_title() {
        let text = "\
1. Ceci est du texte de corps
qui continue sur une autre ligne
sans aucune section reconnue.
";
        let exercises = extract_exercises(text, "dos", "dos.md");
        assert!(exercises.is_empty());
    }

    #[test]
    fn test_sections_before_any_title_are_discarded() {
        let text = "\
Muscle cible : Dorsaux
Mouvement : Tirer la barre.
**4. Tirage vertical**
Muscle cible : Dorsaux, biceps
Position départ : Assis face à la machine.
Mouvement : Tirer la barre vers la poitrine.
";
        let exercises = extract_exercises(text, "dos", "dos.md");
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].title, "Tirage vertical");
        assert_eq!(exercises[0].targeted_muscles, vec!["Dorsaux", "biceps"]);
    }

    #[test]
    fn test_empty_contraindication_is_empty_string() {
        let text = "\
7. Squat
Muscle cible : Quadriceps
Position départ : Debout.
Mouvement : Fléchir les jambes.
Contre-indication :
Thème : Renforcement
";
        let exercises = extract_exercises(text, "fessiers-jambes", "fessiers.md");
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].constraints, "");
        assert_eq!(exercises[0].theme, "Renforcement");
    }

    #[test]
    fn test_aucune_is_stored_literally() {
        let text = "\
8. Fente avant
Muscle cible : Quadriceps, fessiers
Position départ : Debout, un pied devant.
Mouvement : Descendre le genou arrière.
Contre -indication : Aucune.
";
        let exercises = extract_exercises(text, "fessiers-jambes", "fessiers.md");
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].constraints, "Aucune");
        assert!(!exercises[0].has_constraints());
    }

    #[test]
    fn test_continuation_lines_stay_in_their_section() {
        // The tail of a multi-line movement sits within lookahead range of
        // the next exercise's muscle header and must not become a title.
        let text = "\
**1. Crunch**
Muscle cible : Grand droit
Position départ : Allongé sur le dos.
Mouvement :
Enrouler le buste
vers les genoux.
**2. Planche**
Muscle cible : Transverse
Position départ : En appui sur les avant-bras.
Mouvement : Tenir la position.
";
        let exercises = extract_exercises(text, "abdos", "abdominaux.md");
        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].title, "Crunch");
        assert_eq!(
            exercises[0].movement,
            "Enrouler le buste vers les genoux."
        );
        assert_eq!(exercises[1].title, "Planche");
    }

    #[test]
    fn test_unnumbered_title_requires_blank_line_then_section_header() {
        let text = "\
Crunch inversé

Muscle cible : Grand droit
Position départ : Allongé sur le dos.
Mouvement : Enrouler le buste.
";
        let exercises = extract_exercises(text, "abdos", "abdominaux.md");
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].title, "Crunch inversé");
        assert_eq!(exercises[0].order_number, None);
        assert_eq!(exercises[0].targeted_muscles, vec!["Grand droit"]);
    }

    #[test]
    fn test_successive_exercises_finalize_previous() {
        let text = "\
**1. Crunch**
Muscle cible : Grand droit
Position départ : Allongé.
Mouvement : Enrouler.
**2. Planche**
Muscle cible : Transverse
Position départ : En appui sur les avant-bras.
Mouvement : Tenir la position.
";
        let exercises = extract_exercises(text, "abdos", "abdominaux.md");
        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].title, "Crunch");
        assert_eq!(exercises[1].title, "Planche");
        assert_eq!(exercises[1].order_number, Some(2.0));
    }
}
