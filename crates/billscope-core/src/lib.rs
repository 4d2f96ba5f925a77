pub mod artifact;
pub mod change;
pub mod config;
pub mod error;
pub mod evidence;
pub mod explain;
pub mod impact;
pub mod mechanism;
pub mod page;
pub mod pipeline;
pub mod provision;
pub mod quality;
pub mod reference;
pub mod retrieval;
pub mod score;
pub mod segment;
pub mod tree;
pub mod validate;

pub use artifact::{
    ChangeAction, ChangeItem, ChunkRow, ChunkType, Dimension, ImpactStatement, Mechanism,
    MechanismKind, MechanismValidationIssue, NodeType, OutputType, ReferenceEdge, ReferenceKind,
    SpanRef, StructureNode,
};
pub use config::AnalysisConfig;
pub use error::Error;
pub use evidence::EvidenceRecord;
pub use page::{PageText, RawPage, select_page_texts};
pub use pipeline::{AnalysisArtifacts, AnalysisInput, run_analysis};
pub use provision::ArticleNumber;
pub use quality::SegmentationQuality;
pub use retrieval::{RetrievalResult, expand_retrieval};
pub use score::{QualityLevel, SustainabilityIndex};
pub use segment::{Segment, materialize_chunks, segment_pages};
