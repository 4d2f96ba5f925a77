use thiserror::Error;

use crate::RunStatus;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no results for query")]
    NoResults,

    #[error("analysis run not found: {0}")]
    RunNotFound(i64),

    #[error("run {run_id} cannot be set to {status} here")]
    InvalidStatus { run_id: i64, status: RunStatus },

    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
