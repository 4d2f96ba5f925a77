//! Flat evidence ledger: one row per cited span, keyed by claim id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::artifact::{ChunkRow, ChunkType, Mechanism, chunk_node_id};
use crate::score::SustainabilityIndex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub claim_id: String,
    pub page_number: u32,
    pub excerpt_text: String,
    pub article_label: Option<String>,
}

/// Claim id of a sustainability component.
pub fn sustainability_claim_id(dimension: &str, rule_id: &str) -> String {
    format!("sustainability:{dimension}:{rule_id}")
}

/// Collect every mechanism and sustainability evidence span.
///
/// A mechanism's article label is its source chunk's label for ARTICLE
/// chunks and the parent article's label for ALIN chunks.
pub fn collect_evidence(
    chunks: &[ChunkRow],
    mechanisms: &[Mechanism],
    sustainability: &SustainabilityIndex,
) -> Vec<EvidenceRecord> {
    let by_node: HashMap<String, &ChunkRow> = chunks.iter().map(|c| (c.node_id(), c)).collect();
    let article_label = |node_id: &str| -> Option<String> {
        let chunk = by_node.get(node_id)?;
        match chunk.chunk_type {
            ChunkType::Article => chunk.label.clone(),
            ChunkType::Alin => {
                let parent = by_node.get(&chunk_node_id(chunk.parent_chunk_id?))?;
                parent.label.clone()
            }
            ChunkType::FullText => None,
        }
    };

    let mut records = Vec::new();

    for m in mechanisms {
        let label = article_label(&m.source_node_id);
        records.extend(m.evidence.iter().map(|span| EvidenceRecord {
            claim_id: m.mechanism_id.clone(),
            page_number: span.page_number,
            excerpt_text: span.quote.clone(),
            article_label: label.clone(),
        }));
    }

    for c in &sustainability.components {
        let claim_id = sustainability_claim_id(c.dimension.as_str(), &c.rule_id);
        records.extend(c.evidence.iter().map(|span| EvidenceRecord {
            claim_id: claim_id.clone(),
            page_number: span.page_number,
            excerpt_text: span.quote.clone(),
            article_label: None,
        }));
    }

    debug!(count = records.len(), "collected evidence");
    records
}
