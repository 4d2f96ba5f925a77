//! Citizen-facing summary built only from detected mechanism kinds.
//!
//! No new facts: each bullet restates a kind that was detected, in hedged
//! language. The limitations travel with the bullets.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::artifact::{Mechanism, MechanismKind};

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+[\d.,]*\b").expect("valid regex"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitizenSummary {
    pub bullets: Vec<String>,
    pub limitations: Vec<String>,
}

const NOTHING_DETECTED: &str = "No clear legal mechanisms were detected automatically.";
const INCOMPLETE: &str = "The result is incomplete: detection relies on conservative lexical \
                          triggers and may miss changes.";
const PATTERN_ONLY: &str = "This summary restates detected patterns only; it does not interpret \
                            legislative intent and may miss exceptions or negations.";
const CITE_QUOTES: &str = "Every mechanism carries short quotes in the mechanisms artifact; \
                           show them alongside this summary as the source.";
const NUMERIC_THRESHOLDS: &str = "Numeric thresholds or values (amounts, deadlines) are present \
                                  and may change how the provisions apply.";

/// Bullet order is fixed and independent of mechanism order.
const KIND_BULLETS: [(MechanismKind, &str); 5] = [
    (
        MechanismKind::Amendment,
        "The document appears to modify, complete or repeal existing provisions (automatic detection).",
    ),
    (
        MechanismKind::Sanction,
        "The document appears to introduce or change sanctions, penalties or fines (automatic detection).",
    ),
    (
        MechanismKind::Obligation,
        "The document appears to introduce obligations for certain entities (automatic detection).",
    ),
    (
        MechanismKind::Prohibition,
        "The document appears to introduce prohibitions (automatic detection).",
    ),
    (
        MechanismKind::Definition,
        "The document appears to define terms or clarify legal meanings (automatic detection).",
    ),
];

pub fn explain(mechanisms: &[Mechanism]) -> CitizenSummary {
    if mechanisms.is_empty() {
        return CitizenSummary {
            bullets: vec![NOTHING_DETECTED.to_string()],
            limitations: vec![INCOMPLETE.to_string()],
        };
    }

    let kinds: BTreeSet<MechanismKind> = mechanisms.iter().map(|m| m.kind).collect();
    let mut bullets: Vec<String> = KIND_BULLETS
        .iter()
        .filter(|(kind, _)| kinds.contains(kind))
        .map(|(_, text)| text.to_string())
        .collect();

    if has_numeric_threshold(mechanisms) {
        bullets.push(NUMERIC_THRESHOLDS.to_string());
    }

    debug!(bullets = bullets.len(), "built citizen summary");

    CitizenSummary {
        bullets,
        limitations: vec![PATTERN_ONLY.to_string(), CITE_QUOTES.to_string()],
    }
}

fn has_numeric_threshold(mechanisms: &[Mechanism]) -> bool {
    mechanisms
        .iter()
        .flat_map(|m| &m.evidence)
        .any(|e| NUMBER.is_match(&e.quote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ChunkRow, ChunkType};
    use crate::mechanism::extract_mechanisms;

    fn mechanisms(text: &str) -> Vec<Mechanism> {
        extract_mechanisms(&[ChunkRow {
            id: 1,
            document_version_id: 1,
            chunk_type: ChunkType::FullText,
            label: None,
            parent_chunk_id: None,
            page_start: 1,
            page_end: 1,
            text: text.to_string(),
        }])
    }

    #[test]
    fn empty_input() {
        let s = explain(&[]);
        assert_eq!(s.bullets, vec![NOTHING_DETECTED]);
        assert_eq!(s.limitations, vec![INCOMPLETE]);
    }

    #[test]
    fn bullets_follow_fixed_order() {
        // obligation is detected before amendment but listed after it
        let s = explain(&mechanisms("Operatorii sunt obligați. Prezenta lege se modifică."));
        assert_eq!(s.bullets.len(), 2);
        assert!(s.bullets[0].contains("modify"));
        assert!(s.bullets[1].contains("obligations"));
        assert_eq!(s.limitations.len(), 2);
    }

    #[test]
    fn numbers_in_evidence_add_a_bullet() {
        let s = explain(&mechanisms("Se sancționează cu amendă de 1.500 lei."));
        assert_eq!(s.bullets.last().map(String::as_str), Some(NUMERIC_THRESHOLDS));
    }

    #[test]
    fn duplicate_kinds_give_one_bullet() {
        let mut mechs = mechanisms("Se interzice fumatul.");
        mechs.extend(mechanisms("Se interzice accesul."));
        assert_eq!(explain(&mechs).bullets.len(), 1);
    }
}
