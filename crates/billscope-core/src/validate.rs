//! Post-hoc mechanism checks emitting informational quality flags.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::artifact::{Mechanism, MechanismKind, MechanismValidationIssue};

static NEGATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(nu|nici|fără)\b").expect("valid regex"));

static EXCEPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(cu excepția|exceptând|prin derogare)\b").expect("valid regex"));

static SANCTION_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(amend[ăa]\s+de\s+\d+[\d\.]*\s*(lei|ron))\b").expect("valid regex")
});

pub const CONTAINS_NEGATION: &str = "contains_negation";
pub const CONTAINS_EXCEPTION_PHRASE: &str = "contains_exception_phrase";
pub const SANCTION_AMOUNT_MISSING: &str = "sanction_amount_missing";

/// Run every check over every mechanism. Issues never alter the mechanisms.
pub fn validate_mechanisms(mechanisms: &[Mechanism]) -> Vec<MechanismValidationIssue> {
    let mut issues = Vec::new();

    for m in mechanisms {
        let evidence_text = m
            .evidence
            .iter()
            .map(|e| e.quote.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut flag = |code: &str, message: &str| {
            issues.push(MechanismValidationIssue {
                mechanism_id: m.mechanism_id.clone(),
                code: code.to_string(),
                message: message.to_string(),
            });
        };

        if NEGATION.is_match(&evidence_text) {
            flag(
                CONTAINS_NEGATION,
                "Evidence contains negation; mechanism may need condition/exception parsing.",
            );
        }
        if EXCEPTION.is_match(&evidence_text) {
            flag(
                CONTAINS_EXCEPTION_PHRASE,
                "Evidence contains an exception or derogation phrase; mechanism may be conditional.",
            );
        }
        if m.kind == MechanismKind::Sanction && !SANCTION_AMOUNT.is_match(&evidence_text) {
            flag(
                SANCTION_AMOUNT_MISSING,
                "Sanction detected but no fine amount with currency found.",
            );
        }
    }

    debug!(count = issues.len(), "validated mechanisms");
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ChunkRow, ChunkType};
    use crate::mechanism::extract_mechanisms;

    fn mechanisms_for(text: &str) -> Vec<Mechanism> {
        extract_mechanisms(&[ChunkRow {
            id: 1,
            document_version_id: 1,
            chunk_type: ChunkType::Alin,
            label: Some("(2)".into()),
            parent_chunk_id: None,
            page_start: 1,
            page_end: 1,
            text: text.to_string(),
        }])
    }

    fn codes(issues: &[MechanismValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.code.as_str()).collect()
    }

    #[test]
    fn sanction_with_amount_is_clean() {
        let mechs = mechanisms_for("(2) Contravenientul se sancționează cu amendă de 500 lei.");
        assert_eq!(mechs[0].kind, MechanismKind::Sanction);
        assert!(validate_mechanisms(&mechs).is_empty());
    }

    #[test]
    fn sanction_without_amount_is_flagged() {
        let mechs = mechanisms_for("Faptele constituie contravenții și se sancționează potrivit legii.");
        let issues = validate_mechanisms(&mechs);
        assert_eq!(codes(&issues), vec![SANCTION_AMOUNT_MISSING]);
        assert_eq!(issues[0].mechanism_id, mechs[0].mechanism_id);
    }

    #[test]
    fn amount_with_thousands_separator_and_ron() {
        let mechs = mechanisms_for("se aplică amenda de 10.000 RON");
        assert!(validate_mechanisms(&mechs).is_empty());
    }

    #[test]
    fn negation_and_exception_both_flagged() {
        let mechs =
            mechanisms_for("Se interzice accesul, cu excepția personalului care nu este autorizat.");
        let issues = validate_mechanisms(&mechs);
        assert_eq!(
            codes(&issues),
            vec![CONTAINS_NEGATION, CONTAINS_EXCEPTION_PHRASE]
        );
    }

    #[test]
    fn negation_needs_word_boundary() {
        // "nume" and "unic" contain "nu" but are not negations.
        let mechs = mechanisms_for("Se interzice utilizarea unui nume unic.");
        assert!(validate_mechanisms(&mechs).is_empty());
    }

    #[test]
    fn mechanisms_are_not_mutated() {
        let mechs = mechanisms_for("Nu se sancționează fapta.");
        let before = mechs.clone();
        let _ = validate_mechanisms(&mechs);
        assert_eq!(mechs, before);
    }
}
