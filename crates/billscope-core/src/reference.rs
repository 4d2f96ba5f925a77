//! Intra-document reference extraction (`art. 5`, `art. 5 alin. (2)`, `art. 2-10`).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::artifact::{ChunkRow, ReferenceEdge, ReferenceKind};

static ART_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bart\.?\s*(\d+[A-Za-z]?)\b").expect("valid regex"));

static ALIN_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\balin\.?\s*\(?\s*(\d+)\s*\)?").expect("valid regex"));

static NUMBER_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\s*[–\-]\s*(\d+)\b").expect("valid regex"));

/// Characters after an `art.` mention searched for an alin or range.
pub const LOOKAHEAD_CHARS: usize = 120;

pub const ALIN_CONFIDENCE: f64 = 0.75;
pub const ARTICLE_CONFIDENCE: f64 = 0.6;
pub const RANGE_CONFIDENCE: f64 = 0.55;

/// A parsed normalised reference target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceTarget {
    /// `art:{n}`
    Article(String),
    /// `art:{n} alin:{m}`
    Paragraph { article: String, alin: String },
    /// `art:{start}-{end}`
    Range { start: String, end: String },
}

impl ReferenceTarget {
    /// Parse a normalised target string. Anything not starting with `art:`
    /// (or otherwise malformed) yields `None`.
    pub fn parse(target: &str) -> Option<Self> {
        let rest = target.strip_prefix("art:")?;
        if let Some((article, alin)) = rest.split_once(" alin:") {
            return Some(Self::Paragraph {
                article: article.trim().to_string(),
                alin: alin.trim().to_string(),
            });
        }
        if let Some((start, end)) = rest.split_once('-') {
            return Some(Self::Range {
                start: start.trim().to_string(),
                end: end.trim().to_string(),
            });
        }
        let article = rest.trim();
        if article.is_empty() {
            return None;
        }
        Some(Self::Article(article.to_string()))
    }
}

impl fmt::Display for ReferenceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Article(n) => write!(f, "art:{n}"),
            Self::Paragraph { article, alin } => write!(f, "art:{article} alin:{alin}"),
            Self::Range { start, end } => write!(f, "art:{start}-{end}"),
        }
    }
}

/// Extract one `refers_to` edge per `art.` mention in every chunk.
///
/// Mentions are not deduplicated; chunk order and in-text order are
/// preserved, so identical input yields an identical edge list.
pub fn extract_reference_edges(chunks: &[ChunkRow]) -> Vec<ReferenceEdge> {
    let mut edges = Vec::new();

    for ch in chunks {
        let source_node_id = ch.node_id();
        for m in ART_MENTION.captures_iter(&ch.text) {
            let (Some(whole), Some(art)) = (m.get(0), m.get(1)) else {
                continue;
            };
            let window = lookahead(&ch.text, whole.end(), LOOKAHEAD_CHARS);
            // A range starts at the article number itself ("art. 2-10").
            let range_window = lookahead(&ch.text, art.start(), LOOKAHEAD_CHARS);

            let (target, raw_text, confidence) = if let Some(alin) = ALIN_MENTION.captures(window) {
                (
                    ReferenceTarget::Paragraph {
                        article: art.as_str().to_string(),
                        alin: alin[1].to_string(),
                    },
                    format!("{} {}", whole.as_str(), &alin[0]),
                    ALIN_CONFIDENCE,
                )
            } else if let Some(range) = NUMBER_RANGE.captures(range_window) {
                (
                    ReferenceTarget::Range {
                        start: range[1].to_string(),
                        end: range[2].to_string(),
                    },
                    whole.as_str().to_string(),
                    RANGE_CONFIDENCE,
                )
            } else {
                (
                    ReferenceTarget::Article(art.as_str().to_string()),
                    whole.as_str().to_string(),
                    ARTICLE_CONFIDENCE,
                )
            };

            edges.push(ReferenceEdge {
                source_node_id: source_node_id.clone(),
                raw_text: raw_text.trim().to_string(),
                target: target.to_string(),
                kind: ReferenceKind::RefersTo,
                confidence,
            });
        }
    }

    debug!(count = edges.len(), "extracted reference edges");
    edges
}

/// Up to `max_chars` characters of `text` starting at byte offset `from`.
fn lookahead(text: &str, from: usize, max_chars: usize) -> &str {
    crate::artifact::excerpt(&text[from..], max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ChunkType;

    fn chunk(id: i64, text: &str) -> ChunkRow {
        ChunkRow {
            id,
            document_version_id: 1,
            chunk_type: ChunkType::Article,
            label: None,
            parent_chunk_id: None,
            page_start: 1,
            page_end: 1,
            text: text.to_string(),
        }
    }

    #[test]
    fn article_with_alin() {
        let edges = extract_reference_edges(&[chunk(3, "potrivit art. 7 alin. (2) din lege")]);
        assert_eq!(edges.len(), 1);
        let e = &edges[0];
        assert_eq!(e.source_node_id, "chunk:3");
        assert_eq!(e.target, "art:7 alin:2");
        assert_eq!(e.confidence, 0.75);
        assert_eq!(e.raw_text, "art. 7 alin. (2)");
        assert_eq!(e.kind, ReferenceKind::RefersTo);
    }

    #[test]
    fn bare_alin_number() {
        let edges = extract_reference_edges(&[chunk(1, "art. 4 alin 3")]);
        assert_eq!(edges[0].target, "art:4 alin:3");
    }

    #[test]
    fn article_range() {
        let edges = extract_reference_edges(&[chunk(1, "dispozițiile art. 2–10 se aplică")]);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, "art:2-10");
        assert_eq!(edges[0].confidence, 0.55);
    }

    #[test]
    fn plain_article_with_suffix() {
        let edges = extract_reference_edges(&[chunk(1, "conform Art.12A din prezenta lege")]);
        assert_eq!(edges[0].target, "art:12A");
        assert_eq!(edges[0].confidence, 0.6);
        assert_eq!(edges[0].raw_text, "Art.12A");
    }

    #[test]
    fn alin_takes_priority_over_range() {
        let edges = extract_reference_edges(&[chunk(1, "art. 3 alin. (1) și 4-5")]);
        assert_eq!(edges[0].target, "art:3 alin:1");
    }

    #[test]
    fn repeated_mentions_are_kept() {
        let edges = extract_reference_edges(&[chunk(1, "art. 5 și din nou art. 5")]);
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.target == "art:5"));
    }

    #[test]
    fn lookahead_is_bounded() {
        let text = format!("art. 9 {} alin. (4)", "x".repeat(200));
        let edges = extract_reference_edges(&[chunk(1, &text)]);
        assert_eq!(edges[0].target, "art:9");
    }

    #[test]
    fn rerun_is_identical() {
        let chunks = vec![
            chunk(1, "art. 1 și art. 2 alin. (3)"),
            chunk(2, "art. 4-6, apoi art. 8"),
        ];
        let a = crate::artifact::artifact_json(&extract_reference_edges(&chunks)).unwrap();
        let b = crate::artifact::artifact_json(&extract_reference_edges(&chunks)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn no_mentions_no_edges() {
        assert!(extract_reference_edges(&[chunk(1, "Parlamentul adoptă prezenta lege.")]).is_empty());
    }

    #[test]
    fn target_parse_round_trips() {
        for s in ["art:5", "art:5 alin:2", "art:2-10", "art:12A"] {
            assert_eq!(ReferenceTarget::parse(s).unwrap().to_string(), s);
        }
        assert_eq!(ReferenceTarget::parse("lege:123/2012"), None);
        assert_eq!(ReferenceTarget::parse("art:"), None);
    }
}
