mod display;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use billscope_core::provision::label_sort_key;
use billscope_core::reference::extract_reference_edges;
use billscope_core::{
    AnalysisConfig, AnalysisInput, ChunkRow, ChunkType, OutputType, QualityLevel, RawPage,
    expand_retrieval, materialize_chunks, run_analysis, segment_pages, select_page_texts,
};
use billscope_store::{DuckStore, RunStatus};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "billscope", about = "Legislative bill analysis", version)]
struct Cli {
    /// Analysis config (TOML). Defaults apply when omitted.
    #[arg(long, global = true, env = "BILLSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// DuckDB database file holding pages, chunks and runs.
    #[arg(long, global = true, env = "BILLSCOPE_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Segment a version's pages and run the analysis pipeline over them.
    Analyze {
        /// JSON array of pages: {"page_number", "text", "ocr_text"}.
        #[arg(long)]
        pages: PathBuf,
        #[arg(long)]
        document_version: i64,
        /// Document quality level (Q1..Q4).
        #[arg(long)]
        quality: Option<String>,
        /// Directory receiving one JSON file per artifact.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print all artifacts as one JSON object instead of the report.
        #[arg(long)]
        json: bool,
    },
    /// Expand a seed chunk into a bounded context set.
    Retrieve {
        #[arg(long)]
        document_version: i64,
        /// Seed chunk id.
        #[arg(long)]
        seed: i64,
        #[arg(long)]
        budget: Option<usize>,
    },
    /// Print one stored artifact of a run.
    Show {
        #[arg(long)]
        run: i64,
        /// Output type, e.g. mechanisms_v1.
        #[arg(long)]
        output: String,
    },
    /// List analysis runs.
    Runs,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!("billscope v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    match cli.command {
        Command::Analyze {
            pages,
            document_version,
            quality,
            out,
            json,
        } => cmd_analyze(
            &config,
            cli.db.as_deref(),
            &pages,
            document_version,
            quality.as_deref(),
            out.as_deref(),
            json,
        ),
        Command::Retrieve {
            document_version,
            seed,
            budget,
        } => {
            let store = open_store(cli.db.as_deref())?;
            let budget = budget.unwrap_or(config.retrieval.budget_chunks);
            cmd_retrieve(&store, document_version, seed, budget)
        }
        Command::Show { run, output } => {
            let store = open_store(cli.db.as_deref())?;
            cmd_show(&store, run, &output)
        }
        Command::Runs => {
            let store = open_store(cli.db.as_deref())?;
            cmd_runs(&store)
        }
    }
}

fn open_store(db: Option<&Path>) -> Result<DuckStore> {
    let Some(path) = db else {
        bail!("this command needs a database: pass --db or set BILLSCOPE_DB");
    };
    DuckStore::open_persistent(path).with_context(|| format!("opening {}", path.display()))
}

fn read_pages(path: &Path) -> Result<Vec<RawPage>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing pages in {}", path.display()))
}

fn parse_quality(raw: Option<&str>) -> Option<QualityLevel> {
    let raw = raw?;
    let level = QualityLevel::parse(raw);
    if level.is_none() {
        warn!(quality = raw, "unknown quality level, scoring without it");
    }
    level
}

// ── analyze ──

fn cmd_analyze(
    config: &AnalysisConfig,
    db: Option<&Path>,
    pages_path: &Path,
    document_version_id: i64,
    quality: Option<&str>,
    out: Option<&Path>,
    json: bool,
) -> Result<()> {
    let raw_pages = read_pages(pages_path)?;
    let page_numbers: Vec<u32> = raw_pages.iter().map(|p| p.page_number).collect();
    let pages = select_page_texts(&raw_pages);
    let segments = segment_pages(&pages);
    info!(
        document_version_id,
        pages = raw_pages.len(),
        segments = segments.len(),
        "segmented document"
    );

    let mut store = db.map(|p| open_store(Some(p))).transpose()?;

    let (chunks, articles) = match store.as_mut() {
        Some(store) => {
            store.replace_pages(document_version_id, &raw_pages)?;
            let chunks = store.replace_chunks(document_version_id, &segments)?;
            let articles = store.articles_in_legal_order(document_version_id)?;
            (chunks, articles)
        }
        None => {
            let chunks = materialize_chunks(document_version_id, &segments, 1);
            let articles = legal_order(&chunks);
            (chunks, articles)
        }
    };

    let run_id = match &store {
        Some(store) => {
            let id = store.create_run(document_version_id, &config.pipeline_version)?;
            store.set_run_status(id, RunStatus::Running)?;
            Some(id)
        }
        None => None,
    };

    let artifacts = run_analysis(AnalysisInput {
        document_version_id,
        pages: &pages,
        page_numbers: &page_numbers,
        chunks: &chunks,
        quality_level: parse_quality(quality),
        config,
    });
    if artifacts.quality.is_degraded() {
        warn!(
            document_version_id,
            warnings = ?artifacts.quality.warnings,
            "segmentation quality degraded"
        );
    }

    let persisted = (|| -> Result<Vec<(OutputType, String)>> {
        let outputs = artifacts.outputs()?;
        if let (Some(store), Some(run_id)) = (store.as_mut(), run_id) {
            for (output_type, body) in &outputs {
                store.put_output(run_id, *output_type, body)?;
            }
            store.put_evidence(run_id, document_version_id, &artifacts.evidence)?;
        }
        Ok(outputs)
    })();

    let outputs = match (persisted, &store, run_id) {
        (Ok(outputs), Some(store), Some(run_id)) => {
            store.finish_run(run_id, RunStatus::Succeeded, Some(&artifacts.quality))?;
            outputs
        }
        (Ok(outputs), _, _) => outputs,
        (Err(e), Some(store), Some(run_id)) => {
            store.finish_run(run_id, RunStatus::Failed, None)?;
            return Err(e.context(format!("analysis run {run_id} failed")));
        }
        (Err(e), _, _) => return Err(e),
    };

    if let Some(dir) = out {
        write_outputs(dir, &outputs)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&artifacts)?);
    } else {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        display::print_report(&artifacts, run_id, &articles, &now);
    }
    Ok(())
}

fn legal_order(chunks: &[ChunkRow]) -> Vec<ChunkRow> {
    let mut articles: Vec<ChunkRow> = chunks
        .iter()
        .filter(|c| c.chunk_type == ChunkType::Article)
        .cloned()
        .collect();
    articles.sort_by_cached_key(|c| label_sort_key(c.label.as_deref().unwrap_or_default()));
    articles
}

fn write_outputs(dir: &Path, outputs: &[(OutputType, String)]) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for (output_type, body) in outputs {
        let path = dir.join(format!("{output_type}.json"));
        std::fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
    }
    info!(dir = %dir.display(), count = outputs.len(), "wrote artifacts");
    Ok(())
}

// ── retrieve / show / runs ──

fn cmd_retrieve(store: &DuckStore, document_version_id: i64, seed: i64, budget: usize) -> Result<()> {
    let chunks = store.list_chunks(document_version_id)?;
    if chunks.is_empty() {
        warn!(document_version_id, "no chunks stored for this version");
    }
    let edges = extract_reference_edges(&chunks);
    let result = expand_retrieval(seed, &chunks, &edges, budget);
    info!(
        seed,
        budget,
        selected = result.selected_chunk_ids.len(),
        "expanded retrieval"
    );
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_show(store: &DuckStore, run_id: i64, output: &str) -> Result<()> {
    let Some(output_type) = OutputType::parse(output) else {
        let known: Vec<&str> = OutputType::ALL.iter().map(|t| t.as_str()).collect();
        bail!("unknown output type {output:?}; expected one of: {}", known.join(", "));
    };
    let run = store.get_run(run_id)?;
    info!(run_id, status = %run.status, "loading output");
    let body = store
        .get_output(run_id, output_type)
        .with_context(|| format!("run {run_id} has no {output_type} output"))?;
    println!("{body}");
    Ok(())
}

fn cmd_runs(store: &DuckStore) -> Result<()> {
    let batches = store.query_arrow(
        "SELECT id, document_version_id, pipeline_version, status, created_at, finished_at
         FROM analysis_runs ORDER BY id",
    )?;
    if batches.iter().all(|b| b.num_rows() == 0) {
        println!("no analysis runs");
        return Ok(());
    }
    println!("{}", arrow::util::pretty::pretty_format_batches(&batches)?);
    Ok(())
}
