//! One analysis run over a document version's persisted chunks.
//!
//! Stages run in a fixed order, each over immutable inputs. Nothing here
//! fails except final artifact encoding in [`AnalysisArtifacts::outputs`].

use serde::Serialize;
use tracing::debug;

use crate::artifact::{
    ChangeItem, ChunkRow, ImpactStatement, Mechanism, MechanismValidationIssue, OutputType,
    ReferenceEdge, SpanRef, StructureNode, artifact_json,
};
use crate::change::extract_change_list;
use crate::config::AnalysisConfig;
use crate::evidence::{EvidenceRecord, collect_evidence};
use crate::explain::{CitizenSummary, explain};
use crate::impact::derive_impacts;
use crate::mechanism::extract_mechanisms;
use crate::page::{PageText, join_pages};
use crate::quality::{SegmentationQuality, audit_segmentation};
use crate::reference::extract_reference_edges;
use crate::score::{QualityLevel, SustainabilityIndex, score_sustainability};
use crate::tree::build_structure_nodes;
use crate::validate::validate_mechanisms;
use crate::Error;

/// Everything a run needs. `page_numbers` lists every page known for the
/// version, including pages whose text was empty.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    pub document_version_id: i64,
    pub pages: &'a [PageText],
    pub page_numbers: &'a [u32],
    pub chunks: &'a [ChunkRow],
    pub quality_level: Option<QualityLevel>,
    pub config: &'a AnalysisConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisArtifacts {
    pub document_version_id: i64,
    pub pipeline_version: String,
    pub structure_tree: Vec<StructureNode>,
    pub reference_graph: Vec<ReferenceEdge>,
    pub mechanisms: Vec<Mechanism>,
    pub validation_issues: Vec<MechanismValidationIssue>,
    pub change_list: Vec<ChangeItem>,
    pub impacts: Vec<ImpactStatement>,
    pub summary: CitizenSummary,
    pub sustainability: SustainabilityIndex,
    pub quality: SegmentationQuality,
    pub evidence: Vec<EvidenceRecord>,
}

pub fn run_analysis(input: AnalysisInput<'_>) -> AnalysisArtifacts {
    let chunks = input.chunks;

    let structure_tree = build_structure_nodes(input.document_version_id, chunks);
    let reference_graph = extract_reference_edges(chunks);
    let mechanisms = extract_mechanisms(chunks);
    let validation_issues = validate_mechanisms(&mechanisms);
    let change_list = extract_change_list(chunks);
    let impacts = derive_impacts(&mechanisms);
    let summary = explain(&mechanisms);

    let full_text = join_pages(input.pages);
    let mechanism_evidence: Vec<SpanRef> = mechanisms
        .iter()
        .flat_map(|m| m.evidence.iter().cloned())
        .collect();
    let sustainability = score_sustainability(&full_text, &mechanism_evidence, input.quality_level);

    let quality = audit_segmentation(
        chunks,
        input.page_numbers,
        input.config.quality.low_coverage_threshold,
    );
    let evidence = collect_evidence(chunks, &mechanisms, &sustainability);

    debug!(
        document_version_id = input.document_version_id,
        nodes = structure_tree.len(),
        edges = reference_graph.len(),
        mechanisms = mechanisms.len(),
        changes = change_list.len(),
        "analysis complete"
    );

    AnalysisArtifacts {
        document_version_id: input.document_version_id,
        pipeline_version: input.config.pipeline_version.clone(),
        structure_tree,
        reference_graph,
        mechanisms,
        validation_issues,
        change_list,
        impacts,
        summary,
        sustainability,
        quality,
        evidence,
    }
}

impl AnalysisArtifacts {
    /// Encode each stage's artifact, in [`OutputType::ALL`] order.
    pub fn outputs(&self) -> Result<Vec<(OutputType, String)>, Error> {
        OutputType::ALL
            .iter()
            .map(|t| Ok((*t, self.output_json(*t)?)))
            .collect()
    }

    pub fn output_json(&self, output_type: OutputType) -> Result<String, Error> {
        match output_type {
            OutputType::StructureTreeV1 => artifact_json(&self.structure_tree),
            OutputType::ReferenceGraphV1 => artifact_json(&self.reference_graph),
            OutputType::MechanismsV1 => artifact_json(&self.mechanisms),
            OutputType::MechanismValidationV1 => artifact_json(&self.validation_issues),
            OutputType::ChangeListV1 => artifact_json(&self.change_list),
            OutputType::ImpactsV1 => artifact_json(&self.impacts),
            OutputType::ExplainerSummary => artifact_json(&self.summary),
            OutputType::SustainabilityIndex => artifact_json(&self.sustainability),
            OutputType::SegmentationQualityV1 => artifact_json(&self.quality),
        }
    }
}
