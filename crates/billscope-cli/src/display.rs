//! Report card for an analysis run.
//!
//! Renders the artifacts of one run as grouped, human-readable sections.
//! Empty sections are skipped.

use std::collections::BTreeMap;
use std::fmt::Write;

use billscope_core::artifact::{ChunkRow, MechanismKind, excerpt};
use billscope_core::AnalysisArtifacts;

const MAX_LIST_ITEMS: usize = 10;
const MAX_EXCERPT_CHARS: usize = 60;

/// Print the report card to stdout.
pub fn print_report(
    artifacts: &AnalysisArtifacts,
    run_id: Option<i64>,
    articles: &[ChunkRow],
    generated_at: &str,
) {
    print!("{}", render_report(artifacts, run_id, articles, generated_at));
}

pub fn render_report(
    artifacts: &AnalysisArtifacts,
    run_id: Option<i64>,
    articles: &[ChunkRow],
    generated_at: &str,
) -> String {
    let mut out = String::new();
    let q = &artifacts.quality;
    let s = &artifacts.sustainability;

    let _ = writeln!(
        out,
        "=== Document version {} ===",
        artifacts.document_version_id
    );
    let _ = writeln!(out);

    let mut run = Section::new("Run");
    if let Some(id) = run_id {
        run.row("run_id", id);
    }
    run.row("pipeline_version", &artifacts.pipeline_version);
    run.row("generated_at", generated_at);
    run.render(&mut out);

    let mut seg = Section::new("Segmentation");
    seg.row("articles", q.article_count);
    seg.row("alineate", q.alin_count);
    seg.row("full_text_fallback", yes_no(q.has_full_text_fallback));
    seg.row("page_coverage", format!("{:.0}%", q.page_coverage_ratio * 100.0));
    if !q.article_label_duplicates.is_empty() {
        seg.row("duplicate_labels", q.article_label_duplicates.join(", "));
    }
    if !q.warnings.is_empty() {
        seg.row("warnings", q.warnings.join(", "));
    }
    seg.render(&mut out);

    let mut arts = Section::new("Articles (legal order)");
    for c in articles.iter().take(MAX_LIST_ITEMS) {
        let label = c.label.as_deref().unwrap_or("-");
        arts.row(label, first_line(&c.text));
    }
    arts.more(articles.len());
    arts.render(&mut out);

    let mut kinds: BTreeMap<MechanismKind, usize> = BTreeMap::new();
    for m in &artifacts.mechanisms {
        *kinds.entry(m.kind).or_default() += 1;
    }
    let mut mech = Section::new("Mechanisms");
    for (kind, n) in &kinds {
        mech.row(kind.as_str(), n);
    }
    let mut issues: BTreeMap<&str, usize> = BTreeMap::new();
    for i in &artifacts.validation_issues {
        *issues.entry(i.code.as_str()).or_default() += 1;
    }
    for (code, n) in &issues {
        mech.row(code, n);
    }
    mech.render(&mut out);

    let mut changes = Section::new("Changes");
    for c in artifacts.change_list.iter().take(MAX_LIST_ITEMS) {
        changes.row(
            &c.change_id,
            format!("{} {} ({:.2})", c.action.as_str(), c.target, c.confidence),
        );
    }
    changes.more(artifacts.change_list.len());
    changes.render(&mut out);

    let mut score = Section::new("Sustainability");
    score.row("grade", &s.grade);
    score.row("overall", format!("{:.2}", s.overall));
    score.row("confidence", format!("{:.2}", s.confidence));
    let dims: Vec<String> = s
        .dimensions
        .iter()
        .map(|(d, v)| format!("{}={v:+}", d.as_str()))
        .collect();
    score.row("dimensions", dims.join(" "));
    if !s.flags.is_empty() {
        score.row("flags", s.flags.join(", "));
    }
    score.render(&mut out);

    let mut summary = Section::new("Summary");
    for b in &artifacts.summary.bullets {
        summary.item(b);
    }
    summary.render(&mut out);

    let mut limits = Section::new("Limitations");
    for l in &artifacts.summary.limitations {
        limits.item(l);
    }
    limits.render(&mut out);

    out
}

// ── Section rendering ──

struct Section {
    header: &'static str,
    lines: Vec<String>,
}

impl Section {
    fn new(header: &'static str) -> Self {
        Self {
            header,
            lines: Vec::new(),
        }
    }

    fn row(&mut self, key: &str, value: impl std::fmt::Display) {
        self.lines.push(format!("  {:<26} {}", key, value));
    }

    fn item(&mut self, text: &str) {
        self.lines.push(format!("  - {text}"));
    }

    fn more(&mut self, total: usize) {
        if total > MAX_LIST_ITEMS {
            self.lines
                .push(format!("  ... and {} more", total - MAX_LIST_ITEMS));
        }
    }

    fn render(self, out: &mut String) {
        if self.lines.is_empty() {
            return;
        }
        let _ = writeln!(out, "{}", self.header);
        for l in self.lines {
            let _ = writeln!(out, "{l}");
        }
        let _ = writeln!(out);
    }
}

// ── Helpers ──

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

/// First non-heading line of an article, shortened for display.
fn first_line(text: &str) -> String {
    let line = text
        .lines()
        .skip(1)
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    let short = excerpt(line, MAX_EXCERPT_CHARS);
    if short.len() < line.len() {
        format!("{short}...")
    } else {
        short.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billscope_core::page::PageText;
    use billscope_core::{AnalysisConfig, AnalysisInput, materialize_chunks, run_analysis, segment_pages};

    fn artifacts() -> (AnalysisArtifacts, Vec<ChunkRow>) {
        let pages = vec![PageText::new(
            1,
            "Art. 1\n(1) Se interzice poluarea.\nArt. 2\nPrevederile art. 1 se abrogă.",
        )];
        let chunks = materialize_chunks(4, &segment_pages(&pages), 1);
        let config = AnalysisConfig::default();
        let a = run_analysis(AnalysisInput {
            document_version_id: 4,
            pages: &pages,
            page_numbers: &[1],
            chunks: &chunks,
            quality_level: None,
            config: &config,
        });
        (a, chunks)
    }

    #[test]
    fn report_has_sections() {
        let (a, chunks) = artifacts();
        let text = render_report(&a, Some(9), &chunks[..1], "2026-01-01T00:00:00Z");
        assert!(text.starts_with("=== Document version 4 ==="));
        assert!(text.contains("run_id"));
        assert!(text.contains("Sustainability"));
        assert!(text.contains("prohibition"));
        assert!(text.contains("repeals art:2"));
    }

    #[test]
    fn empty_sections_are_skipped() {
        let (a, _) = artifacts();
        let text = render_report(&a, None, &[], "now");
        assert!(!text.contains("run_id"));
        assert!(!text.contains("Articles (legal order)"));
    }

    #[test]
    fn first_line_skips_heading_and_shortens() {
        assert_eq!(first_line("Art. 1\n\n  Scurt."), "Scurt.");
        let long = format!("Art. 2\n{}", "ă".repeat(80));
        assert_eq!(first_line(&long), format!("{}...", "ă".repeat(60)));
        assert_eq!(first_line("Art. 3"), "");
    }
}
