//! Run/output store: pages, chunks, analysis runs, artifacts and evidence.

mod error;
mod run;

pub use error::StoreError;
pub use run::{AnalysisRun, RunStatus};

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;
