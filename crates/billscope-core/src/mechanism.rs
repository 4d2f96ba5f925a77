//! Lexical-trigger mechanism extraction.
//!
//! Each chunk is tested independently against a fixed, ordered table of
//! trigger patterns. Every matching trigger yields one mechanism, in table
//! order, sharing the chunk's evidence excerpt.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::artifact::{ChunkRow, ChunkType, Mechanism, MechanismKind, SpanRef, excerpt};

/// Maximum characters of a mechanism's evidence excerpt.
pub const EVIDENCE_CHARS: usize = 500;

/// Placeholder confidence for the `kind` field.
pub const KIND_CONFIDENCE: f64 = 0.7;

struct Trigger {
    kind: MechanismKind,
    regex: Regex,
}

/// Trigger-check order is the emission order. Verb forms accept both the
/// comma-below and cedilla spellings of ș/ț.
static TRIGGERS: LazyLock<Vec<Trigger>> = LazyLock::new(|| {
    vec![
        trigger(
            MechanismKind::Obligation,
            r"(?i)\b(are obliga\w+|au obliga\w+|este obliga[tțţ]\w*|sunt obliga[tțţ]\w*)",
        ),
        trigger(
            MechanismKind::Prohibition,
            r"(?i)\b(se interzice|este interzi[sșş]\w*|sunt interzi[sșş]\w*)",
        ),
        trigger(
            MechanismKind::Definition,
            r"(?i)\b(în sensul prezentei legi|se [îi]n[țţ]elege prin|înseamnă)\b",
        ),
        trigger(
            MechanismKind::Sanction,
            r"(?i)\b(contraven\w+|se sanc[țţt]ioneaz\w+|amend\w+|pedeaps\w+)\b",
        ),
        trigger(
            MechanismKind::Amendment,
            r"(?i)\b(se modific\w+|se completeaz\w+|se abrog\w+)\b",
        ),
    ]
});

fn trigger(kind: MechanismKind, pattern: &str) -> Trigger {
    Trigger {
        kind,
        regex: Regex::new(pattern).expect("invalid mechanism trigger pattern"),
    }
}

/// Kinds triggered by `text`, in trigger-check order.
pub fn triggered_kinds(text: &str) -> Vec<MechanismKind> {
    TRIGGERS
        .iter()
        .filter(|t| t.regex.is_match(text))
        .map(|t| t.kind)
        .collect()
}

/// Mechanism id, stable within one run.
pub fn mechanism_id(chunk_id: i64, kind: MechanismKind, index: usize) -> String {
    format!("m:{chunk_id}:{kind}:{index}")
}

/// Extract mechanisms from ARTICLE, ALIN and FULL_TEXT chunks.
///
/// Chunks whose text is empty after trimming yield nothing, whatever matches.
pub fn extract_mechanisms(chunks: &[ChunkRow]) -> Vec<Mechanism> {
    let mut mechanisms = Vec::new();

    for ch in chunks {
        if !matches!(
            ch.chunk_type,
            ChunkType::Article | ChunkType::Alin | ChunkType::FullText
        ) {
            continue;
        }
        let quote = excerpt(ch.text.trim(), EVIDENCE_CHARS);
        if quote.is_empty() {
            continue;
        }
        let evidence = vec![SpanRef::page_quote(ch.page_start, quote)];

        for (i, kind) in triggered_kinds(&ch.text).into_iter().enumerate() {
            mechanisms.push(Mechanism {
                mechanism_id: mechanism_id(ch.id, kind, i),
                kind,
                actor: None,
                action: None,
                obj: None,
                conditions: Vec::new(),
                exceptions: Vec::new(),
                effective_date: None,
                references: Vec::new(),
                source_node_id: ch.node_id(),
                evidence: evidence.clone(),
                field_confidence: BTreeMap::from([("kind".to_string(), KIND_CONFIDENCE)]),
            });
        }
    }

    debug!(count = mechanisms.len(), "extracted mechanisms");
    mechanisms
}
