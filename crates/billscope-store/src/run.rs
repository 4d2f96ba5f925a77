use std::fmt;

/// Lifecycle of an analysis run: queued, then running, then one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            "succeeded" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of `analysis_runs`. Timestamps are DuckDB's text rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRun {
    pub id: i64,
    pub document_version_id: i64,
    pub pipeline_version: String,
    pub status: RunStatus,
    pub quality_summary_json: Option<String>,
    pub created_at: String,
    pub finished_at: Option<String>,
}
