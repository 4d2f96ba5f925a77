//! Structure tree: one synthetic ROOT plus one node per persisted chunk.

use tracing::debug;

use crate::artifact::{
    ChunkRow, NodeType, SpanRef, StructureNode, chunk_node_id, excerpt, root_node_id,
};

/// Maximum characters of a node's evidence excerpt.
pub const NODE_EXCERPT_CHARS: usize = 400;

/// Build the flat structure tree for one document version.
///
/// The root spans min/max pages over all chunks (`[1, 1]` when there are
/// none). Parentless chunks hang off the root; others point at their parent
/// chunk's node. No validation happens here.
pub fn build_structure_nodes(document_version_id: i64, chunks: &[ChunkRow]) -> Vec<StructureNode> {
    let root_id = root_node_id(document_version_id);

    let mut nodes = Vec::with_capacity(chunks.len() + 1);
    nodes.push(StructureNode {
        node_id: root_id.clone(),
        node_type: NodeType::Root,
        label: None,
        parent_id: None,
        page_start: chunks.iter().map(|c| c.page_start).min().unwrap_or(1),
        page_end: chunks.iter().map(|c| c.page_end).max().unwrap_or(1),
        text: String::new(),
        spans: Vec::new(),
    });

    for ch in chunks {
        let parent_id = match ch.parent_chunk_id {
            Some(pid) => chunk_node_id(pid),
            None => root_id.clone(),
        };

        let quote = excerpt(ch.text.trim(), NODE_EXCERPT_CHARS);
        let spans = if quote.is_empty() {
            Vec::new()
        } else {
            vec![SpanRef::page_quote(ch.page_start, quote)]
        };

        nodes.push(StructureNode {
            node_id: ch.node_id(),
            node_type: ch.chunk_type.into(),
            label: ch.label.clone(),
            parent_id: Some(parent_id),
            page_start: ch.page_start,
            page_end: ch.page_end,
            text: ch.text.clone(),
            spans,
        });
    }

    debug!(count = nodes.len(), "built structure tree");
    nodes
}
