//! Article / alineat segmentation of per-page bill text.
//!
//! Pages are flattened into one line stream tagged with page numbers. Lines
//! opening with an article heading (`Art. 12`, `Art.12A`, or a numbered
//! amendment item `11. Art.12`) start ARTICLE segments; within an article,
//! lines opening with `(N)` start ALIN segments. Each segment runs until the
//! next start of the same level. Without any article heading the whole
//! stream becomes one FULL_TEXT segment.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::artifact::{ChunkRow, ChunkType};
use crate::page::PageText;

static ARTICLE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:\d+\.)?\s*Art\.?\s*(\d+[A-Za-z]?)\b").expect("valid regex")
});

static ALIN_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\((\d+)\)\s+").expect("valid regex"));

/// Label given to the fallback segment.
pub const FULL_TEXT_LABEL: &str = "FULL_TEXT";

/// A structural segment produced by one segmentation pass, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub chunk_type: ChunkType,
    pub label: Option<String>,
    /// `ARTICLE::{label}` of the enclosing article (ALIN only).
    pub parent_key: Option<String>,
    pub page_start: u32,
    pub page_end: u32,
    pub text: String,
}

/// Synthetic key linking an ALIN to the ARTICLE segment that precedes it.
pub fn article_key(label: &str) -> String {
    format!("ARTICLE::{label}")
}

type Line<'a> = (u32, &'a str);

/// Segment selected page texts into ARTICLE / ALIN segments, or a single
/// FULL_TEXT segment when no article heading exists. Zero pages (or pages
/// without lines) yield zero segments.
pub fn segment_pages(pages: &[PageText]) -> Vec<Segment> {
    let lines: Vec<Line<'_>> = pages
        .iter()
        .flat_map(|p| p.text.lines().map(move |l| (p.page_number, l)))
        .collect();

    let article_starts = find_starts(&lines, &ARTICLE_HEADING, |n| format!("Art. {n}"));

    if article_starts.is_empty() {
        let Some(seg) = full_text_segment(&lines) else {
            return Vec::new();
        };
        debug!(lines = lines.len(), "no article headings; full-text fallback");
        return vec![seg];
    }

    let mut segments = Vec::new();
    for (art_lines, art_label) in partition(&lines, &article_starts) {
        let key = article_key(&art_label);
        segments.push(build_segment(ChunkType::Article, art_label, None, art_lines));

        let alin_starts = find_starts(art_lines, &ALIN_START, |n| format!("({n})"));
        for (alin_lines, alin_label) in partition(art_lines, &alin_starts) {
            segments.push(build_segment(
                ChunkType::Alin,
                alin_label,
                Some(key.clone()),
                alin_lines,
            ));
        }
    }

    debug!(
        count = segments.len(),
        articles = article_starts.len(),
        "segmented pages"
    );
    segments
}

/// Indices of lines matching `pattern`, with the label built from capture 1.
fn find_starts(
    lines: &[Line<'_>],
    pattern: &Regex,
    label: impl Fn(&str) -> String,
) -> Vec<(usize, String)> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(i, (_, line))| pattern.captures(line).map(|c| (i, label(&c[1]))))
        .collect()
}

/// Split `lines` at each start; every part runs to the line before the next start.
fn partition<'l, 'a>(
    lines: &'l [Line<'a>],
    starts: &[(usize, String)],
) -> Vec<(&'l [Line<'a>], String)> {
    starts
        .iter()
        .enumerate()
        .map(|(idx, (start, label))| {
            let end = starts.get(idx + 1).map_or(lines.len(), |(next, _)| *next);
            (&lines[*start..end], label.clone())
        })
        .filter(|(part, _)| !part.is_empty())
        .collect()
}

fn build_segment(
    chunk_type: ChunkType,
    label: String,
    parent_key: Option<String>,
    lines: &[Line<'_>],
) -> Segment {
    let (page_start, page_end) = page_span(lines);
    Segment {
        chunk_type,
        label: Some(label),
        parent_key,
        page_start,
        page_end,
        text: join_lines(lines),
    }
}

fn full_text_segment(lines: &[Line<'_>]) -> Option<Segment> {
    if lines.is_empty() {
        return None;
    }
    Some(build_segment(
        ChunkType::FullText,
        FULL_TEXT_LABEL.to_string(),
        None,
        lines,
    ))
}

fn page_span(lines: &[Line<'_>]) -> (u32, u32) {
    let start = lines.iter().map(|(p, _)| *p).min().unwrap_or(1);
    let end = lines.iter().map(|(p, _)| *p).max().unwrap_or(start);
    (start, end)
}

fn join_lines(lines: &[Line<'_>]) -> String {
    lines
        .iter()
        .map(|(_, l)| *l)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Assign sequential chunk ids starting at `first_id` and resolve each
/// ALIN's `parent_key` to its article's id.
///
/// Mirrors what the run store does on insert, for runs without a store.
pub fn materialize_chunks(
    document_version_id: i64,
    segments: &[Segment],
    first_id: i64,
) -> Vec<ChunkRow> {
    let mut key_to_id: HashMap<String, i64> = HashMap::new();
    let mut chunks = Vec::with_capacity(segments.len());

    for (id, seg) in (first_id..).zip(segments) {
        let parent_chunk_id = seg
            .parent_key
            .as_ref()
            .and_then(|k| key_to_id.get(k).copied());

        if seg.chunk_type == ChunkType::Article
            && let Some(label) = &seg.label
        {
            key_to_id.insert(article_key(label), id);
        }

        chunks.push(ChunkRow {
            id,
            document_version_id,
            chunk_type: seg.chunk_type,
            label: seg.label.clone(),
            parent_chunk_id,
            page_start: seg.page_start,
            page_end: seg.page_end,
            text: seg.text.clone(),
        });
    }

    chunks
}
