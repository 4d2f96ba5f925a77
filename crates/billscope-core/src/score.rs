//! Coarse keyword-dimension sustainability scorecard.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::artifact::{Dimension, SpanRef};

static ENVIRONMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(emisi\w*|poluar\w*|de\s*[șş]euri|de\s*seuri|de[șş]eu\w*|deseu\w*|biodivers\w*|habitat\w*)\b")
        .expect("valid regex")
});

static SOCIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(s[ăa]n[ăa]t\w*|siguran\w*|munc\w*|vulnerab\w*)\b").expect("valid regex")
});

static GOVERNANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(raport\w*|audit\w*|transparen\w*|control\w*|inspec\w*)\b").expect("valid regex")
});

static ECONOMIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(buget\w*|tax\w*|cost\w*|tarif\w*|competitiv\w*|administrativ\w*)\b").expect("valid regex")
});

pub const ECONOMIC_DIRECTION_UNCERTAIN: &str = "economic_direction_uncertain";
pub const NO_TEXT: &str = "no_text";

const DIMENSION_MIN: i32 = -2;
const DIMENSION_MAX: i32 = 2;

/// Externally assessed document quality, best (Q1) to worst (Q4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityLevel {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl QualityLevel {
    /// Unknown levels are treated as absent rather than as an error.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "Q1" => Some(Self::Q1),
            "Q2" => Some(Self::Q2),
            "Q3" => Some(Self::Q3),
            "Q4" => Some(Self::Q4),
            _ => None,
        }
    }

    pub fn confidence(self) -> f64 {
        match self {
            Self::Q1 => 0.85,
            Self::Q2 => 0.65,
            Self::Q3 => 0.4,
            Self::Q4 => 0.1,
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
        })
    }
}

/// Confidence used when no quality level is known.
pub const UNKNOWN_QUALITY_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub dimension: Dimension,
    pub delta: i32,
    pub rationale: String,
    /// At most one representative evidence item.
    pub evidence: Vec<SpanRef>,
    pub rule_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SustainabilityIndex {
    pub grade: String,
    pub overall: f64,
    pub confidence: f64,
    pub dimensions: BTreeMap<Dimension, i32>,
    pub components: Vec<ScoreComponent>,
    pub flags: Vec<String>,
}

struct Rule {
    dimension: Dimension,
    delta: i32,
    regex: &'static LazyLock<Regex>,
    rationale: &'static str,
    rule_id: &'static str,
}

static RULES: [Rule; 4] = [
    Rule {
        dimension: Dimension::E,
        delta: 1,
        regex: &ENVIRONMENT,
        rationale: "Text mentions environmental terms (keyword signal).",
        rule_id: "E.KEYWORDS",
    },
    Rule {
        dimension: Dimension::S,
        delta: 1,
        regex: &SOCIAL,
        rationale: "Text mentions social or health terms (keyword signal).",
        rule_id: "S.KEYWORDS",
    },
    Rule {
        dimension: Dimension::G,
        delta: 1,
        regex: &GOVERNANCE,
        rationale: "Text mentions governance or reporting terms (keyword signal).",
        rule_id: "G.KEYWORDS",
    },
    Rule {
        dimension: Dimension::Ec,
        delta: -1,
        regex: &ECONOMIC,
        rationale: "Text mentions cost or budget terms (keyword signal, direction uncertain).",
        rule_id: "EC.KEYWORDS",
    },
];

/// Score `text` on the four dimensions.
///
/// `evidence` supplies the representative item attached to every component.
pub fn score_sustainability(
    text: &str,
    evidence: &[SpanRef],
    quality_level: Option<QualityLevel>,
) -> SustainabilityIndex {
    let mut dimensions: BTreeMap<Dimension, i32> = Dimension::ALL.iter().map(|d| (*d, 0)).collect();
    let mut components = Vec::new();
    let mut flags = Vec::new();

    for rule in &RULES {
        if !rule.regex.is_match(text) {
            continue;
        }
        let total = dimensions.entry(rule.dimension).or_insert(0);
        *total = (*total + rule.delta).clamp(DIMENSION_MIN, DIMENSION_MAX);
        components.push(ScoreComponent {
            dimension: rule.dimension,
            delta: rule.delta,
            rationale: rule.rationale.to_string(),
            evidence: evidence.iter().take(1).cloned().collect(),
            rule_id: rule.rule_id.to_string(),
        });
        if rule.dimension == Dimension::Ec {
            flags.push(ECONOMIC_DIRECTION_UNCERTAIN.to_string());
        }
    }

    let overall = dimensions.values().sum::<i32>() as f64 / Dimension::ALL.len() as f64;

    let confidence = if text.trim().is_empty() {
        flags.push(NO_TEXT.to_string());
        0.0
    } else {
        quality_level.map_or(UNKNOWN_QUALITY_CONFIDENCE, QualityLevel::confidence)
    };

    debug!(components = components.len(), overall, "scored sustainability");

    SustainabilityIndex {
        grade: grade_for(overall).to_string(),
        overall,
        confidence,
        dimensions,
        components,
        flags,
    }
}

pub fn grade_for(overall: f64) -> &'static str {
    if overall >= 1.0 {
        "A"
    } else if overall >= 0.25 {
        "B"
    } else if overall <= -0.25 {
        "D"
    } else {
        "C"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_scores_nothing() {
        let idx = score_sustainability("  \n ", &[], Some(QualityLevel::Q1));
        assert_eq!(idx.confidence, 0.0);
        assert_eq!(idx.flags, vec![NO_TEXT]);
        assert!(idx.dimensions.values().all(|v| *v == 0));
        assert_eq!(idx.dimensions.len(), 4);
        assert_eq!(idx.grade, "C");
        assert!(idx.components.is_empty());
    }

    #[test]
    fn environment_and_governance_hits() {
        let ev = vec![
            SpanRef::page_quote(3, "Se interzice poluarea."),
            SpanRef::page_quote(4, "altceva"),
        ];
        let idx = score_sustainability(
            "Reducerea emisiilor și raportarea anuală.",
            &ev,
            Some(QualityLevel::Q2),
        );
        assert_eq!(idx.dimensions[&Dimension::E], 1);
        assert_eq!(idx.dimensions[&Dimension::G], 1);
        assert_eq!(idx.dimensions[&Dimension::S], 0);
        assert_eq!(idx.overall, 0.5);
        assert_eq!(idx.grade, "B");
        assert_eq!(idx.confidence, 0.65);
        let rules: Vec<_> = idx.components.iter().map(|c| c.rule_id.as_str()).collect();
        assert_eq!(rules, vec!["E.KEYWORDS", "G.KEYWORDS"]);
        assert!(idx.components.iter().all(|c| c.evidence == ev[..1]));
    }

    #[test]
    fn economic_hit_is_negative_and_flagged() {
        let idx = score_sustainability("Costurile bugetare cresc.", &[], None);
        assert_eq!(idx.dimensions[&Dimension::Ec], -1);
        assert_eq!(idx.overall, -0.25);
        assert_eq!(idx.grade, "D");
        assert_eq!(idx.flags, vec![ECONOMIC_DIRECTION_UNCERTAIN]);
        assert_eq!(idx.confidence, UNKNOWN_QUALITY_CONFIDENCE);
        assert!(idx.components[0].evidence.is_empty());
    }

    #[test]
    fn all_four_dimensions() {
        let text = "deșeuri, sănătatea lucrătorilor, audit, taxe";
        let idx = score_sustainability(text, &[], Some(QualityLevel::Q4));
        assert_eq!(idx.components.len(), 4);
        assert_eq!(idx.overall, 0.5);
        assert_eq!(idx.confidence, 0.1);
    }

    #[test]
    fn grade_thresholds() {
        assert_eq!(grade_for(1.0), "A");
        assert_eq!(grade_for(0.75), "B");
        assert_eq!(grade_for(0.25), "B");
        assert_eq!(grade_for(0.0), "C");
        assert_eq!(grade_for(-0.25), "D");
    }

    #[test]
    fn quality_level_parse() {
        assert_eq!(QualityLevel::parse("q3"), Some(QualityLevel::Q3));
        assert_eq!(QualityLevel::parse("Q9"), None);
        assert_eq!(QualityLevel::Q1.to_string(), "Q1");
    }

    #[test]
    fn dimensions_serialise_in_fixed_order() {
        let idx = score_sustainability("", &[], None);
        let json = serde_json::to_string(&idx.dimensions).unwrap();
        assert_eq!(json, r#"{"E":0,"S":0,"G":0,"Ec":0}"#);
    }
}
