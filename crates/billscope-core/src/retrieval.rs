//! Citation-aware context expansion around a seed chunk.
//!
//! Budgeted breadth-first traversal: seed, then structural context (parent
//! and siblings), then outgoing reference edges resolved to ARTICLE chunks
//! by label. Every additive step is recorded in the trace.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::artifact::{ChunkRow, ChunkType, ReferenceEdge, chunk_node_id};
use crate::reference::ReferenceTarget;

pub const DEFAULT_BUDGET_CHUNKS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStep {
    Seed,
    Context,
    Refs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalTraceStep {
    pub step: TraceStep,
    pub added_chunk_ids: Vec<i64>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub seed_chunk_id: i64,
    pub selected_chunk_ids: Vec<i64>,
    pub steps: Vec<RetrievalTraceStep>,
}

/// Ordered, budget-capped selection with its trace.
struct Selection {
    budget: usize,
    ids: Vec<i64>,
    seen: HashSet<i64>,
    steps: Vec<RetrievalTraceStep>,
}

impl Selection {
    fn new(budget: usize) -> Self {
        Self {
            budget,
            ids: Vec::new(),
            seen: HashSet::new(),
            steps: Vec::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.ids.len() >= self.budget
    }

    /// Add unseen ids until the budget is reached. Records a trace step when
    /// anything was added and returns the number added.
    fn add(&mut self, ids: impl IntoIterator<Item = i64>, step: TraceStep, reason: &str) -> usize {
        let mut added = Vec::new();
        for id in ids {
            if self.seen.contains(&id) {
                continue;
            }
            if self.is_full() {
                break;
            }
            self.ids.push(id);
            self.seen.insert(id);
            added.push(id);
        }
        let n = added.len();
        if n > 0 {
            self.steps.push(RetrievalTraceStep {
                step,
                added_chunk_ids: added,
                reason: reason.to_string(),
            });
        }
        n
    }
}

/// Expand a seed chunk into a bounded context window.
///
/// Reference targets resolve only in the `art:{n}` and `art:{n}-{m}` forms;
/// a range contributes its two endpoints, never the span between them.
/// Unresolvable targets are dropped silently.
pub fn expand_retrieval(
    seed_chunk_id: i64,
    chunks: &[ChunkRow],
    edges: &[ReferenceEdge],
    budget_chunks: usize,
) -> RetrievalResult {
    let by_id: HashMap<i64, &ChunkRow> = chunks.iter().map(|c| (c.id, c)).collect();

    let Some(seed) = by_id.get(&seed_chunk_id) else {
        debug!(seed_chunk_id, "retrieval seed not found");
        return RetrievalResult {
            seed_chunk_id,
            selected_chunk_ids: Vec::new(),
            steps: vec![RetrievalTraceStep {
                step: TraceStep::Seed,
                added_chunk_ids: Vec::new(),
                reason: "seed chunk not found".to_string(),
            }],
        };
    };

    let mut by_parent: HashMap<Option<i64>, Vec<i64>> = HashMap::new();
    for c in chunks {
        by_parent.entry(c.parent_chunk_id).or_default().push(c.id);
    }

    // Later duplicates of a label win.
    let mut article_by_label: HashMap<&str, i64> = HashMap::new();
    for c in chunks {
        if c.chunk_type == ChunkType::Article
            && let Some(label) = &c.label
        {
            article_by_label.insert(label.trim(), c.id);
        }
    }

    let mut outgoing: HashMap<&str, Vec<&ReferenceEdge>> = HashMap::new();
    for e in edges {
        outgoing.entry(e.source_node_id.as_str()).or_default().push(e);
    }

    let mut sel = Selection::new(budget_chunks);
    sel.add([seed_chunk_id], TraceStep::Seed, "seed");

    if let Some(parent_id) = seed.parent_chunk_id {
        sel.add([parent_id], TraceStep::Context, "parent of seed");
        let siblings = by_parent.get(&Some(parent_id)).cloned().unwrap_or_default();
        sel.add(siblings, TraceStep::Context, "siblings of seed");
    }

    let resolve = |number: &str| article_by_label.get(format!("Art. {number}").as_str()).copied();

    let mut frontier: VecDeque<i64> = sel.ids.iter().copied().collect();
    let mut visited: HashSet<i64> = HashSet::new();

    while !sel.is_full() {
        let Some(current) = frontier.pop_front() else {
            break;
        };
        if !visited.insert(current) {
            continue;
        }

        let node_id = chunk_node_id(current);
        let mut targets = Vec::new();
        for edge in outgoing.get(node_id.as_str()).into_iter().flatten() {
            match ReferenceTarget::parse(&edge.target) {
                Some(ReferenceTarget::Article(n)) => targets.extend(resolve(&n)),
                Some(ReferenceTarget::Range { start, end }) => {
                    targets.extend(resolve(&start));
                    targets.extend(resolve(&end));
                }
                Some(ReferenceTarget::Paragraph { .. }) | None => {}
            }
        }

        if sel.add(targets, TraceStep::Refs, "follow references") > 0 {
            // Newly selected chunks get one more hop.
            frontier.extend(sel.ids.iter().copied().filter(|id| !visited.contains(id)));
        }
    }

    debug!(
        seed_chunk_id,
        selected = sel.ids.len(),
        steps = sel.steps.len(),
        "expanded retrieval"
    );

    RetrievalResult {
        seed_chunk_id,
        selected_chunk_ids: sel.ids,
        steps: sel.steps,
    }
}
