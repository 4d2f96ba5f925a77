//! Amendment change-list extraction over ARTICLE / ALIN chunks.
//!
//! A chunk yields a [`ChangeItem`] only when it carries both an action
//! trigger (modifică / completează / abrogă) and a resolvable article
//! target. The "new wording" excerpt is best-effort.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::artifact::{ChangeAction, ChangeItem, ChunkRow, ChunkType, SpanRef, excerpt};

static ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(se\s+modific\w+|se\s+completeaz\w+|se\s+abrog\w+)\b").expect("valid regex")
});

static TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bArt\.?\s*(?P<art>\d+[A-Za-z]?)\b(?:[^\n]{0,80}?\b(?:alin\.?\s*\(?\s*(?P<alin>\d+)\s*\)?)\b)?",
    )
    .expect("valid regex")
});

static NEW_WORDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)va\s+avea\s+urm[aă]torul\s+cuprins\s*:?").expect("valid regex")
});

pub const EVIDENCE_CHARS: usize = 700;
pub const NEW_WORDING_CHARS: usize = 600;

/// A resolved change target.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeTarget {
    pub raw: String,
    pub normalized: String,
    /// 1.0 when an alin was resolved, 0.8 for an article alone.
    pub confidence: f64,
}

/// Extract amendment actions with their targets from ARTICLE / ALIN chunks.
pub fn extract_change_list(chunks: &[ChunkRow]) -> Vec<ChangeItem> {
    let mut items = Vec::new();

    for ch in chunks {
        if !matches!(ch.chunk_type, ChunkType::Article | ChunkType::Alin) {
            continue;
        }
        let text = ch.text.trim();
        if text.is_empty() {
            continue;
        }
        let Some(action) = detect_action(text) else {
            continue;
        };
        let Some(target) = detect_target(text) else {
            continue;
        };

        let new_text_excerpt = new_wording_excerpt(text).unwrap_or_default();
        let has_excerpt = if new_text_excerpt.is_empty() { 0.0 } else { 1.0 };
        let confidence = (0.55 + 0.25 * target.confidence + 0.15 * has_excerpt).min(0.95);

        items.push(ChangeItem {
            change_id: format!("chg:{}", ch.id),
            action,
            target: target.normalized,
            target_raw: target.raw,
            new_text_excerpt,
            evidence: vec![SpanRef::page_quote(ch.page_start, excerpt(text, EVIDENCE_CHARS))],
            confidence,
        });
    }

    debug!(count = items.len(), "extracted change list");
    items
}

/// First amendment action verb in `text`.
pub fn detect_action(text: &str) -> Option<ChangeAction> {
    let verb = ACTION.find(text)?.as_str().to_lowercase();
    if verb.contains("modific") {
        Some(ChangeAction::Modifies)
    } else if verb.contains("completeaz") {
        Some(ChangeAction::Completes)
    } else if verb.contains("abrog") {
        Some(ChangeAction::Repeals)
    } else {
        None
    }
}

/// First `Art. N` in `text`, extended with an `alin.` group found within
/// 80 characters on the same line.
pub fn detect_target(text: &str) -> Option<ChangeTarget> {
    let caps = TARGET.captures(text)?;
    let art = caps.name("art")?.as_str();
    let raw = caps.get(0)?.as_str().trim().to_string();

    Some(match caps.name("alin") {
        Some(alin) => ChangeTarget {
            raw,
            normalized: format!("art:{art} alin:{}", alin.as_str()),
            confidence: 1.0,
        },
        None => ChangeTarget {
            raw,
            normalized: format!("art:{art}"),
            confidence: 0.8,
        },
    })
}

/// Text following "va avea următorul cuprins", trimmed and capped.
pub fn new_wording_excerpt(text: &str) -> Option<String> {
    let m = NEW_WORDING.find(text)?;
    let tail = text[m.end()..].trim();
    Some(excerpt(tail, NEW_WORDING_CHARS).to_string())
}
