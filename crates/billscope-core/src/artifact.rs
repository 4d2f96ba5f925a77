//! Artifact types shared by every pipeline stage.
//!
//! All artifacts are flat, serde-serialisable records keyed by stable
//! synthetic identifiers built from persisted integer keys:
//! `chunk:{id}`, `dv:{id}:root`, `m:{chunk_id}:{kind}:{i}`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Verbatim evidence citation: a page number plus a quote taken from source text.
///
/// `quote` is always a substring or prefix-truncation of the text it cites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanRef {
    pub page_number: u32,
    pub quote: String,
    pub bbox_json: Option<String>,
    pub char_start: Option<usize>,
    pub char_end: Option<usize>,
}

impl SpanRef {
    /// A page-level citation with no offsets or bounding box.
    pub fn page_quote(page_number: u32, quote: impl Into<String>) -> Self {
        Self {
            page_number,
            quote: quote.into(),
            bbox_json: None,
            char_start: None,
            char_end: None,
        }
    }
}

// ── Chunks ──

/// Structural type of a segment / persisted chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChunkType {
    Article,
    Alin,
    FullText,
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "ARTICLE",
            Self::Alin => "ALIN",
            Self::FullText => "FULL_TEXT",
        }
    }

    /// Parse the stored string form. Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ARTICLE" => Some(Self::Article),
            "ALIN" => Some(Self::Alin),
            "FULL_TEXT" => Some(Self::FullText),
            _ => None,
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted segment with a stable integer identity.
///
/// The id is the join key for every downstream artifact (`chunk:{id}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRow {
    pub id: i64,
    pub document_version_id: i64,
    pub chunk_type: ChunkType,
    pub label: Option<String>,
    pub parent_chunk_id: Option<i64>,
    pub page_start: u32,
    pub page_end: u32,
    pub text: String,
}

impl ChunkRow {
    pub fn node_id(&self) -> String {
        chunk_node_id(self.id)
    }
}

/// Node id of a persisted chunk.
pub fn chunk_node_id(chunk_id: i64) -> String {
    format!("chunk:{chunk_id}")
}

/// Node id of the synthetic document root.
pub fn root_node_id(document_version_id: i64) -> String {
    format!("dv:{document_version_id}:root")
}

// ── Structure tree ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Root,
    Article,
    Alin,
    FullText,
}

impl From<ChunkType> for NodeType {
    fn from(t: ChunkType) -> Self {
        match t {
            ChunkType::Article => Self::Article,
            ChunkType::Alin => Self::Alin,
            ChunkType::FullText => Self::FullText,
        }
    }
}

/// One node of the flat structure tree; hierarchy is carried by `parent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureNode {
    pub node_id: String,
    pub node_type: NodeType,
    pub label: Option<String>,
    pub parent_id: Option<String>,
    pub page_start: u32,
    pub page_end: u32,
    pub text: String,
    pub spans: Vec<SpanRef>,
}

// ── Reference graph ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    RefersTo,
    Amends,
    Repeals,
    Defines,
    ExceptionOf,
}

/// A directed intra-document citation from a chunk to a normalised target
/// such as `art:5`, `art:5 alin:2` or `art:2-10`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub source_node_id: String,
    pub raw_text: String,
    pub target: String,
    pub kind: ReferenceKind,
    pub confidence: f64,
}

// ── Mechanisms ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MechanismKind {
    Obligation,
    Prohibition,
    Definition,
    Sanction,
    Amendment,
    Permission,
    Procedure,
}

impl MechanismKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Obligation => "obligation",
            Self::Prohibition => "prohibition",
            Self::Definition => "definition",
            Self::Sanction => "sanction",
            Self::Amendment => "amendment",
            Self::Permission => "permission",
            Self::Procedure => "procedure",
        }
    }
}

impl fmt::Display for MechanismKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected legal-effect category grounded in a chunk's text.
///
/// `actor`, `action` and `obj` are reserved for semantic-role parsing and
/// are never filled by the lexical extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mechanism {
    pub mechanism_id: String,
    pub kind: MechanismKind,
    pub actor: Option<String>,
    pub action: Option<String>,
    pub obj: Option<String>,
    pub conditions: Vec<String>,
    pub exceptions: Vec<String>,
    pub effective_date: Option<String>,
    pub references: Vec<String>,
    pub source_node_id: String,
    pub evidence: Vec<SpanRef>,
    pub field_confidence: BTreeMap<String, f64>,
}

/// Non-blocking quality flag attached to a mechanism by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanismValidationIssue {
    pub mechanism_id: String,
    pub code: String,
    pub message: String,
}

// ── Change list ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Modifies,
    Completes,
    Repeals,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Modifies => "modifies",
            Self::Completes => "completes",
            Self::Repeals => "repeals",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeItem {
    pub change_id: String,
    pub action: ChangeAction,
    pub target: String,
    pub target_raw: String,
    pub new_text_excerpt: String,
    pub evidence: Vec<SpanRef>,
    pub confidence: f64,
}

// ── Impacts ──

/// Sustainability dimension. Declaration order is the serialisation order of
/// dimension maps: E, S, G, Ec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    E,
    S,
    G,
    Ec,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [Self::E, Self::S, Self::G, Self::Ec];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E => "E",
            Self::S => "S",
            Self::G => "G",
            Self::Ec => "Ec",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactStatement {
    pub impact_id: String,
    pub dimension: Dimension,
    /// -2..=2
    pub polarity: i8,
    pub rationale: String,
    pub mechanism_ids: Vec<String>,
    pub evidence: Vec<SpanRef>,
    pub confidence: f64,
}

// ── Outputs ──

/// Artifact kinds persisted per analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    StructureTreeV1,
    ReferenceGraphV1,
    MechanismsV1,
    MechanismValidationV1,
    ChangeListV1,
    ImpactsV1,
    ExplainerSummary,
    SustainabilityIndex,
    SegmentationQualityV1,
}

impl OutputType {
    pub const ALL: [OutputType; 9] = [
        Self::StructureTreeV1,
        Self::ReferenceGraphV1,
        Self::MechanismsV1,
        Self::MechanismValidationV1,
        Self::ChangeListV1,
        Self::ImpactsV1,
        Self::ExplainerSummary,
        Self::SustainabilityIndex,
        Self::SegmentationQualityV1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StructureTreeV1 => "structure_tree_v1",
            Self::ReferenceGraphV1 => "reference_graph_v1",
            Self::MechanismsV1 => "mechanisms_v1",
            Self::MechanismValidationV1 => "mechanism_validation_v1",
            Self::ChangeListV1 => "change_list_v1",
            Self::ImpactsV1 => "impacts_v1",
            Self::ExplainerSummary => "explainer_summary",
            Self::SustainabilityIndex => "sustainability_index",
            Self::SegmentationQualityV1 => "segmentation_quality_v1",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Helpers ──

/// Leading prefix of `text` holding at most `max_chars` characters.
///
/// Always a verbatim slice of the input, so it is safe to use as a quote.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Canonical artifact encoding: compact UTF-8 JSON, non-ASCII left unescaped.
pub fn artifact_json<T: Serialize + ?Sized>(value: &T) -> Result<String, crate::Error> {
    Ok(serde_json::to_string(value)?)
}
