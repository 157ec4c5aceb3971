use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::metadata::MatchType;

/// Score bands that gate how a proposed title change is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewPolicy {
    /// Score at or above which a change applies without review.
    pub auto_apply_min: u8,
    /// Score at or above which a change is written to the review report.
    /// Anything below is discarded.
    pub review_min: u8,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        ReviewPolicy {
            auto_apply_min: 90,
            review_min: 80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    /// Scored but not yet dispatched.
    Proposed,
    /// High confidence, applied without human review.
    AutoApplied,
    /// Medium confidence, waiting in the validation report.
    PendingReview,
    /// Checked off in the validation report and applied.
    Applied,
    /// Below the review threshold, dropped.
    Rejected,
}

impl ReviewPolicy {
    pub fn classify(&self, score: u8) -> ReviewState {
        if score >= self.auto_apply_min {
            ReviewState::AutoApplied
        } else if score >= self.review_min {
            ReviewState::PendingReview
        } else {
            ReviewState::Rejected
        }
    }
}

/// One proposed title change, as serialized into the JSON report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleUpdate {
    // The production id column is TEXT holding a uuid-shaped string
    pub video_id: String,
    pub old_title: String,
    pub new_title: String,
    pub score: u8,
    pub match_type: MatchType,
}

/// Machine-readable companion to the text report.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportJson {
    pub generated_at: DateTime<Utc>,
    pub auto_applied: usize,
    pub pending_review: usize,
    pub rejected: usize,
    pub unmatched: usize,
    pub matches: Vec<TitleUpdate>,
    pub rejected_matches: Vec<TitleUpdate>,
    pub unmatched_titles: Vec<String>,
}

lazy_static! {
    static ref REPORT_ID: Regex = Regex::new(r"(?i)ID:\s+([a-f0-9-]+)").unwrap();
    static ref REPORT_OLD: Regex = Regex::new(r#"Ancien titre:\s*"(.+)""#).unwrap();
    static ref REPORT_NEW: Regex = Regex::new(r#"Nouveau titre:\s*"(.+)""#).unwrap();
    static ref REPORT_OUI: Regex = Regex::new(r"(?i)\[x\]\s*OUI").unwrap();
}

fn push_entry(out: &mut String, index: usize, update: &TitleUpdate, marker: &str) {
    let _ = writeln!(out, "{}. ID: {}", index, update.video_id);
    let _ = writeln!(out, "   Ancien titre: \"{}\"", update.old_title);
    let _ = writeln!(out, "   Nouveau titre: \"{}\"", update.new_title);
    let _ = writeln!(out, "   Score: {}/100 ({})", update.score, update.match_type);
    let _ = writeln!(out, "   {}VALIDATION: [ ] OUI  [ ] NON", marker);
    out.push('\n');
}

/// Render the human validation report. High-confidence entries are listed
/// first as a record of what was auto-applied; medium-confidence entries
/// carry checkboxes the reviewer ticks before running the apply pass.
/// Matches rejected for scoring too low are listed apart from videos with
/// no correspondence at all.
pub fn render_report(
    generated_at: DateTime<Utc>,
    auto_applied: &[TitleUpdate],
    pending: &[TitleUpdate],
    rejected: &[TitleUpdate],
    unmatched: &[String],
) -> String {
    let separator = "=".repeat(100);
    let mut out = String::new();

    let _ = writeln!(out, "{}", separator);
    let _ = writeln!(out, "RAPPORT DE MISE À JOUR DES TITRES");
    let _ = writeln!(out, "Généré le: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out, "{}", separator);
    out.push('\n');

    let _ = writeln!(out, "RÉSUMÉ:");
    let _ = writeln!(out, "  Titres appliqués automatiquement (score >= 90): {}", auto_applied.len());
    let _ = writeln!(out, "  Titres en attente de validation (score 80-89): {}", pending.len());
    let _ = writeln!(out, "  Titres écartés (score < 80): {}", rejected.len());
    let _ = writeln!(out, "  Titres sans correspondance: {}", unmatched.len());
    out.push('\n');

    if !auto_applied.is_empty() {
        let _ = writeln!(out, "{}", separator);
        let _ = writeln!(out, "APPLIQUÉS AUTOMATIQUEMENT (confiance élevée)");
        let _ = writeln!(out, "{}", separator);
        out.push('\n');
        for (i, update) in auto_applied.iter().enumerate() {
            push_entry(&mut out, i + 1, update, "✅ ");
        }
    }

    if !pending.is_empty() {
        let _ = writeln!(out, "{}", separator);
        let _ = writeln!(out, "À VALIDER (confiance moyenne) — cochez [x] OUI pour appliquer");
        let _ = writeln!(out, "{}", separator);
        out.push('\n');
        for (i, update) in pending.iter().enumerate() {
            push_entry(&mut out, i + 1, update, "⚠️  ");
        }
    }

    if !rejected.is_empty() {
        let _ = writeln!(out, "{}", separator);
        let _ = writeln!(out, "ÉCARTÉS (confiance trop faible, non appliqués)");
        let _ = writeln!(out, "{}", separator);
        for update in rejected {
            let _ = writeln!(
                out,
                "  - \"{}\" ~ \"{}\" ({}/100, {})",
                update.old_title, update.new_title, update.score, update.match_type
            );
        }
        out.push('\n');
    }

    if !unmatched.is_empty() {
        let _ = writeln!(out, "{}", separator);
        let _ = writeln!(out, "SANS CORRESPONDANCE");
        let _ = writeln!(out, "{}", separator);
        for title in unmatched {
            let _ = writeln!(out, "  - \"{}\"", title);
        }
        out.push('\n');
    }

    out
}

/// A change the reviewer accepted by ticking `[x] OUI`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpdate {
    pub video_id: String,
    pub old_title: Option<String>,
    pub new_title: String,
}

/// Parse a filled-in validation report and return the accepted changes.
///
/// The parser keys on the most recent `ID:` / `Ancien titre:` /
/// `Nouveau titre:` lines; a ticked `[x] OUI` accepts the block currently
/// in scope and resets it. Unticked blocks and `[x] NON` are ignored.
pub fn parse_validated(report: &str) -> Vec<ValidatedUpdate> {
    let mut accepted = Vec::new();
    let mut current_id: Option<String> = None;
    let mut current_old: Option<String> = None;
    let mut current_new: Option<String> = None;

    for line in report.lines() {
        if let Some(caps) = REPORT_ID.captures(line) {
            current_id = Some(caps[1].to_string());
            current_old = None;
            current_new = None;
        }
        if let Some(caps) = REPORT_OLD.captures(line) {
            current_old = Some(caps[1].to_string());
        }
        if let Some(caps) = REPORT_NEW.captures(line) {
            current_new = Some(caps[1].to_string());
        }
        if REPORT_OUI.is_match(line) {
            if let (Some(id), Some(new_title)) = (current_id, current_new.take()) {
                accepted.push(ValidatedUpdate {
                    video_id: id,
                    old_title: current_old.take(),
                    new_title,
                });
            }
            current_id = None;
            current_old = None;
        }
    }

    accepted
}
