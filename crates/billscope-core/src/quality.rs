//! Self-diagnostic metrics over a persisted chunk set.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::artifact::{ChunkRow, ChunkType};

static LEADING_INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

pub const DEFAULT_LOW_COVERAGE_THRESHOLD: f64 = 0.8;

pub const NO_STRUCTURE_DETECTED: &str = "no_structure_detected";
pub const USED_FULL_TEXT_FALLBACK: &str = "used_full_text_fallback";
pub const DUPLICATE_ARTICLE_LABELS: &str = "duplicate_article_labels";
pub const NON_MONOTONIC_ARTICLE_NUMBERS: &str = "non_monotonic_article_numbers";
pub const LOW_PAGE_COVERAGE: &str = "low_page_coverage";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationQuality {
    pub article_count: usize,
    pub alin_count: usize,
    pub has_full_text_fallback: bool,
    pub article_labels: Vec<String>,
    pub article_label_duplicates: Vec<String>,
    pub article_label_non_monotonic: bool,
    pub page_coverage_ratio: f64,
    pub warnings: Vec<String>,
}

impl SegmentationQuality {
    /// True when any warning was raised.
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Audit `chunks` against the pages known to exist for the version.
///
/// Coverage below `low_coverage_threshold` raises `low_page_coverage`.
pub fn audit_segmentation(
    chunks: &[ChunkRow],
    page_numbers_present: &[u32],
    low_coverage_threshold: f64,
) -> SegmentationQuality {
    let count = |t: ChunkType| chunks.iter().filter(|c| c.chunk_type == t).count();
    let article_count = count(ChunkType::Article);
    let alin_count = count(ChunkType::Alin);
    let has_full_text_fallback = count(ChunkType::FullText) > 0;

    let article_labels: Vec<String> = chunks
        .iter()
        .filter(|c| c.chunk_type == ChunkType::Article)
        .filter_map(|c| c.label.clone())
        .filter(|l| !l.is_empty())
        .collect();

    let article_label_duplicates = duplicate_labels(&article_labels);
    let article_label_non_monotonic = non_monotonic(&article_labels);

    let covered = covered_ranges(chunks);
    let present: BTreeSet<u32> = page_numbers_present.iter().copied().collect();
    let page_coverage_ratio = if present.is_empty() {
        0.0
    } else {
        present.iter().filter(|p| is_covered(&covered, **p)).count() as f64 / present.len() as f64
    };

    let mut warnings = Vec::new();
    if article_count == 0 && !has_full_text_fallback {
        warnings.push(NO_STRUCTURE_DETECTED.to_string());
    }
    if has_full_text_fallback {
        warnings.push(USED_FULL_TEXT_FALLBACK.to_string());
    }
    if !article_label_duplicates.is_empty() {
        warnings.push(DUPLICATE_ARTICLE_LABELS.to_string());
    }
    if article_label_non_monotonic {
        warnings.push(NON_MONOTONIC_ARTICLE_NUMBERS.to_string());
    }
    if page_coverage_ratio < low_coverage_threshold {
        warnings.push(LOW_PAGE_COVERAGE.to_string());
    }

    debug!(
        article_count,
        alin_count,
        page_coverage_ratio,
        warnings = warnings.len(),
        "audited segmentation"
    );

    SegmentationQuality {
        article_count,
        alin_count,
        has_full_text_fallback,
        article_labels,
        article_label_duplicates,
        article_label_non_monotonic,
        page_coverage_ratio,
        warnings,
    }
}

/// Chunk page spans, sorted and merged into disjoint inclusive ranges.
/// A span ending before it starts covers nothing.
fn covered_ranges(chunks: &[ChunkRow]) -> Vec<(u32, u32)> {
    let mut spans: Vec<(u32, u32)> = chunks
        .iter()
        .filter(|c| c.page_start <= c.page_end)
        .map(|c| (c.page_start, c.page_end))
        .collect();
    spans.sort_unstable();
    let mut merged: Vec<(u32, u32)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn is_covered(ranges: &[(u32, u32)], page: u32) -> bool {
    let i = ranges.partition_point(|&(start, _)| start <= page);
    i > 0 && page <= ranges[i - 1].1
}

/// Each repeated label once, in the order its first repeat is seen.
fn duplicate_labels(labels: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dups: Vec<String> = Vec::new();
    for l in labels {
        if !seen.insert(l.as_str()) && !dups.contains(l) {
            dups.push(l.clone());
        }
    }
    dups
}

/// True iff some label's first integer is below the previous label's.
/// Labels without an integer are skipped.
fn non_monotonic(labels: &[String]) -> bool {
    let nums: Vec<u64> = labels
        .iter()
        .filter_map(|l| LEADING_INTEGER.find(l))
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    nums.windows(2).any(|w| w[1] < w[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: i64, chunk_type: ChunkType, label: Option<&str>, pages: (u32, u32)) -> ChunkRow {
        ChunkRow {
            id,
            document_version_id: 1,
            chunk_type,
            label: label.map(str::to_string),
            parent_chunk_id: None,
            page_start: pages.0,
            page_end: pages.1,
            text: "x".into(),
        }
    }

    fn articles(labels: &[&str]) -> Vec<ChunkRow> {
        labels
            .iter()
            .enumerate()
            .map(|(i, l)| chunk(i as i64 + 1, ChunkType::Article, Some(*l), (1, 1)))
            .collect()
    }

    #[test]
    fn out_of_order_numbering_is_flagged() {
        let q = audit_segmentation(&articles(&["Art. 1", "Art. 3", "Art. 2"]), &[1], 0.8);
        assert!(q.article_label_non_monotonic);
        assert!(q.warnings.contains(&NON_MONOTONIC_ARTICLE_NUMBERS.to_string()));
    }

    #[test]
    fn ordered_numbering_is_clean() {
        let q = audit_segmentation(&articles(&["Art. 1", "Art. 2", "Art. 3"]), &[1], 0.8);
        assert!(!q.article_label_non_monotonic);
        assert!(q.warnings.is_empty());
        assert_eq!(q.article_count, 3);
        assert_eq!(q.page_coverage_ratio, 1.0);
    }

    #[test]
    fn suffixed_labels_use_leading_integer() {
        let q = audit_segmentation(&articles(&["Art. 10", "Art. 10A", "Art. 11"]), &[1], 0.8);
        assert!(!q.article_label_non_monotonic);
    }

    #[test]
    fn duplicates_reported_once_in_encounter_order() {
        let q = audit_segmentation(
            &articles(&["Art. 1", "Art. 2", "Art. 2", "Art. 1", "Art. 2"]),
            &[1],
            0.8,
        );
        assert_eq!(q.article_label_duplicates, vec!["Art. 2", "Art. 1"]);
        assert!(q.warnings.contains(&DUPLICATE_ARTICLE_LABELS.to_string()));
    }

    #[test]
    fn full_text_fallback_is_reported() {
        let chunks = vec![chunk(1, ChunkType::FullText, None, (1, 3))];
        let q = audit_segmentation(&chunks, &[1, 2, 3], 0.8);
        assert!(q.has_full_text_fallback);
        assert_eq!(q.warnings, vec![USED_FULL_TEXT_FALLBACK]);
        assert_eq!(q.article_count, 0);
    }

    #[test]
    fn empty_chunk_set_has_no_structure() {
        let q = audit_segmentation(&[], &[], 0.8);
        assert_eq!(q.page_coverage_ratio, 0.0);
        assert_eq!(q.warnings, vec![NO_STRUCTURE_DETECTED, LOW_PAGE_COVERAGE]);
    }

    #[test]
    fn coverage_counts_only_known_pages() {
        let chunks = vec![
            chunk(1, ChunkType::Article, Some("Art. 1"), (1, 2)),
            chunk(2, ChunkType::Alin, Some("(1)"), (2, 2)),
            chunk(3, ChunkType::Article, Some("Art. 2"), (9, 9)),
        ];
        let q = audit_segmentation(&chunks, &[1, 2, 3, 4, 5], 0.8);
        assert_eq!(q.alin_count, 1);
        assert!((q.page_coverage_ratio - 0.4).abs() < 1e-9);
        assert_eq!(q.warnings, vec![LOW_PAGE_COVERAGE]);
        assert!(q.is_degraded());
    }

    #[test]
    fn wide_page_spans_are_checked_per_known_page() {
        let chunks = vec![
            chunk(1, ChunkType::FullText, None, (1, u32::MAX - 1)),
            chunk(2, ChunkType::Article, Some("Art. 1"), (7, 3)),
        ];
        assert_eq!(covered_ranges(&chunks), vec![(1, u32::MAX - 1)]);
        let q = audit_segmentation(&chunks, &[1, 4_000_000_000, u32::MAX], 0.8);
        assert!((q.page_coverage_ratio - 2.0 / 3.0).abs() < 1e-9);
        assert!(q.warnings.contains(&LOW_PAGE_COVERAGE.to_string()));
    }

    #[test]
    fn overlapping_spans_merge() {
        let spans = covered_ranges(&[
            chunk(1, ChunkType::Article, Some("Art. 1"), (5, 8)),
            chunk(2, ChunkType::Article, Some("Art. 2"), (1, 2)),
            chunk(3, ChunkType::Alin, Some("(1)"), (3, 6)),
            chunk(4, ChunkType::Article, Some("Art. 3"), (20, 20)),
        ]);
        assert_eq!(spans, vec![(1, 8), (20, 20)]);
        assert!(is_covered(&spans, 8));
        assert!(!is_covered(&spans, 9));
        assert!(!is_covered(&spans, 0));
    }

    #[test]
    fn threshold_is_configurable() {
        let chunks = vec![chunk(1, ChunkType::Article, Some("Art. 1"), (1, 1))];
        let q = audit_segmentation(&chunks, &[1, 2], 0.5);
        assert!(q.warnings.is_empty());
    }
}
