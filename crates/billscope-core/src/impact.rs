//! Conservative impact statements derived from mechanism kinds.

use tracing::debug;

use crate::artifact::{Dimension, ImpactStatement, Mechanism, MechanismKind};

/// Mapping for one mechanism kind: dimension, polarity, confidence, rationale.
struct ImpactRule {
    dimension: Dimension,
    polarity: i8,
    confidence: f64,
    rationale: &'static str,
}

fn rule_for(kind: MechanismKind) -> Option<ImpactRule> {
    let rule = match kind {
        MechanismKind::Sanction => ImpactRule {
            dimension: Dimension::G,
            polarity: 1,
            confidence: 0.4,
            rationale: "Introduces or mentions sanctions; may improve enforceability (governance).",
        },
        MechanismKind::Obligation => ImpactRule {
            dimension: Dimension::G,
            polarity: 1,
            confidence: 0.35,
            rationale: "Introduces or mentions obligations; may increase compliance requirements (governance).",
        },
        MechanismKind::Prohibition => ImpactRule {
            dimension: Dimension::E,
            polarity: 1,
            confidence: 0.35,
            rationale: "Introduces or mentions prohibitions; may reduce harmful activities (environment).",
        },
        MechanismKind::Definition => ImpactRule {
            dimension: Dimension::G,
            polarity: 0,
            confidence: 0.25,
            rationale: "Adds or mentions definitions; may clarify scope but impact is uncertain.",
        },
        _ => return None,
    };
    Some(rule)
}

/// One impact per mechanism whose kind has a mapping. The index in the id is
/// the mechanism's position in `mechanisms`, so ids stay stable when
/// unmapped kinds are skipped.
pub fn derive_impacts(mechanisms: &[Mechanism]) -> Vec<ImpactStatement> {
    let impacts: Vec<ImpactStatement> = mechanisms
        .iter()
        .enumerate()
        .filter_map(|(i, m)| {
            let rule = rule_for(m.kind)?;
            Some(ImpactStatement {
                impact_id: format!("imp:{}:{i}", m.mechanism_id),
                dimension: rule.dimension,
                polarity: rule.polarity,
                rationale: rule.rationale.to_string(),
                mechanism_ids: vec![m.mechanism_id.clone()],
                evidence: m.evidence.clone(),
                confidence: rule.confidence,
            })
        })
        .collect();

    debug!(count = impacts.len(), "derived impacts");
    impacts
}
