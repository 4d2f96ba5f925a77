//! DuckDB storage for pages, chunks, analysis runs, artifacts and evidence.

use std::collections::HashMap;
use std::path::Path;

use arrow::array::{Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use billscope_core::artifact::{ChunkRow, ChunkType, OutputType};
use billscope_core::evidence::EvidenceRecord;
use billscope_core::page::RawPage;
use billscope_core::provision::label_sort_key;
use billscope_core::quality::SegmentationQuality;
use billscope_core::segment::{Segment, article_key};
use duckdb::{Connection, params};
use tracing::info;

use crate::{AnalysisRun, RunStatus, StoreError};

const SCHEMA: &str = "
    CREATE SEQUENCE IF NOT EXISTS chunk_id_seq START 1;
    CREATE SEQUENCE IF NOT EXISTS run_id_seq START 1;
    CREATE SEQUENCE IF NOT EXISTS output_id_seq START 1;
    CREATE SEQUENCE IF NOT EXISTS evidence_id_seq START 1;

    CREATE TABLE IF NOT EXISTS pages (
        document_version_id BIGINT NOT NULL,
        page_number BIGINT NOT NULL,
        text VARCHAR,
        ocr_text VARCHAR,
        PRIMARY KEY (document_version_id, page_number)
    );

    CREATE TABLE IF NOT EXISTS chunks (
        id BIGINT PRIMARY KEY DEFAULT nextval('chunk_id_seq'),
        document_version_id BIGINT NOT NULL,
        chunk_type VARCHAR NOT NULL,
        label VARCHAR,
        parent_chunk_id BIGINT,
        page_start BIGINT NOT NULL,
        page_end BIGINT NOT NULL,
        text VARCHAR NOT NULL
    );

    CREATE TABLE IF NOT EXISTS analysis_runs (
        id BIGINT PRIMARY KEY DEFAULT nextval('run_id_seq'),
        document_version_id BIGINT NOT NULL,
        pipeline_version VARCHAR NOT NULL,
        status VARCHAR NOT NULL,
        quality_summary_json VARCHAR,
        created_at TIMESTAMP NOT NULL DEFAULT current_timestamp,
        finished_at TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS run_outputs (
        id BIGINT PRIMARY KEY DEFAULT nextval('output_id_seq'),
        run_id BIGINT NOT NULL,
        output_type VARCHAR NOT NULL,
        content_json VARCHAR NOT NULL
    );

    CREATE TABLE IF NOT EXISTS evidence (
        id BIGINT PRIMARY KEY DEFAULT nextval('evidence_id_seq'),
        run_id BIGINT NOT NULL,
        document_version_id BIGINT NOT NULL,
        claim_id VARCHAR NOT NULL,
        page_number BIGINT NOT NULL,
        excerpt_text VARCHAR NOT NULL,
        article_label VARCHAR
    );
";

const RUN_COLUMNS: &str = "id, document_version_id, pipeline_version, status, quality_summary_json,
    CAST(created_at AS VARCHAR) AS created_at, CAST(finished_at AS VARCHAR) AS finished_at";

/// DuckDB run/output store.
///
/// Every analysis artifact is keyed by run id; chunks are keyed by document
/// version and replaced wholesale on re-segmentation. Supports in-memory
/// ([`open`](Self::open)) and file-backed
/// ([`open_persistent`](Self::open_persistent)) modes.
pub struct DuckStore {
    conn: Connection,
}

impl DuckStore {
    /// Open an in-memory database with the schema created.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    /// Open or create a persistent database at `path`. The schema is
    /// created on first open and left alone afterwards.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // ── Pages ──

    /// Replace every stored page of a document version.
    pub fn replace_pages(
        &mut self,
        document_version_id: i64,
        pages: &[RawPage],
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM pages WHERE document_version_id = ?",
            [document_version_id],
        )?;
        for p in pages {
            tx.execute(
                "INSERT INTO pages (document_version_id, page_number, text, ocr_text)
                 VALUES (?, ?, ?, ?)",
                params![
                    document_version_id,
                    i64::from(p.page_number),
                    p.text,
                    p.ocr_text
                ],
            )?;
        }
        tx.commit()?;
        info!(document_version_id, count = pages.len(), "stored pages");
        Ok(())
    }

    /// Stored pages of a version, by page number.
    pub fn list_pages(&self, document_version_id: i64) -> Result<Vec<RawPage>, StoreError> {
        let batches = self.query_arrow_with(
            "SELECT page_number, text, ocr_text FROM pages
             WHERE document_version_id = ? ORDER BY page_number",
            document_version_id,
        )?;
        let mut pages = Vec::new();
        for batch in &batches {
            let numbers = int_column(batch, "page_number")?;
            let texts = string_column(batch, "text")?;
            let ocr = string_column(batch, "ocr_text")?;
            for i in 0..batch.num_rows() {
                pages.push(RawPage {
                    page_number: page_number(numbers[i], "page_number")?,
                    text: texts[i].clone(),
                    ocr_text: ocr[i].clone(),
                });
            }
        }
        Ok(pages)
    }

    // ── Chunks ──

    /// Delete a version's chunks and insert `segments` in order, as one
    /// transaction. ALIN parents resolve to the id of the latest ARTICLE
    /// inserted under the same key. Returns the stored rows.
    pub fn replace_chunks(
        &mut self,
        document_version_id: i64,
        segments: &[Segment],
    ) -> Result<Vec<ChunkRow>, StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM chunks WHERE document_version_id = ?",
            [document_version_id],
        )?;

        let mut key_to_id: HashMap<String, i64> = HashMap::new();
        for seg in segments {
            let parent_chunk_id = seg
                .parent_key
                .as_ref()
                .and_then(|k| key_to_id.get(k).copied());
            let id: i64 = tx.query_row(
                "INSERT INTO chunks
                    (document_version_id, chunk_type, label, parent_chunk_id, page_start, page_end, text)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 RETURNING id",
                params![
                    document_version_id,
                    seg.chunk_type.as_str(),
                    seg.label,
                    parent_chunk_id,
                    i64::from(seg.page_start),
                    i64::from(seg.page_end),
                    seg.text
                ],
                |row| row.get(0),
            )?;
            if seg.chunk_type == ChunkType::Article
                && let Some(label) = &seg.label
            {
                key_to_id.insert(article_key(label), id);
            }
        }
        tx.commit()?;

        info!(document_version_id, count = segments.len(), "replaced chunks");
        self.list_chunks(document_version_id)
    }

    /// Chunks of a version in insertion (document) order.
    pub fn list_chunks(&self, document_version_id: i64) -> Result<Vec<ChunkRow>, StoreError> {
        let batches = self.query_arrow_with(
            "SELECT id, document_version_id, chunk_type, label, parent_chunk_id,
                    page_start, page_end, text
             FROM chunks WHERE document_version_id = ? ORDER BY id",
            document_version_id,
        )?;
        let mut chunks = Vec::new();
        for batch in &batches {
            let ids = int_column(batch, "id")?;
            let versions = int_column(batch, "document_version_id")?;
            let types = string_column(batch, "chunk_type")?;
            let labels = string_column(batch, "label")?;
            let parents = int_column(batch, "parent_chunk_id")?;
            let starts = int_column(batch, "page_start")?;
            let ends = int_column(batch, "page_end")?;
            let texts = string_column(batch, "text")?;
            for i in 0..batch.num_rows() {
                let chunk_type = types[i]
                    .as_deref()
                    .and_then(ChunkType::parse)
                    .ok_or_else(|| StoreError::Other(format!("bad chunk_type: {:?}", types[i])))?;
                chunks.push(ChunkRow {
                    id: required(ids[i], "id")?,
                    document_version_id: required(versions[i], "document_version_id")?,
                    chunk_type,
                    label: labels[i].clone(),
                    parent_chunk_id: parents[i],
                    page_start: page_number(starts[i], "page_start")?,
                    page_end: page_number(ends[i], "page_end")?,
                    text: texts[i].clone().unwrap_or_default(),
                });
            }
        }
        Ok(chunks)
    }

    /// ARTICLE chunks of a version in legal order (12, 12A, 13), not text order.
    pub fn articles_in_legal_order(
        &self,
        document_version_id: i64,
    ) -> Result<Vec<ChunkRow>, StoreError> {
        let mut articles: Vec<ChunkRow> = self
            .list_chunks(document_version_id)?
            .into_iter()
            .filter(|c| c.chunk_type == ChunkType::Article)
            .collect();
        articles.sort_by_cached_key(|c| label_sort_key(c.label.as_deref().unwrap_or_default()));
        Ok(articles)
    }

    // ── Runs ──

    /// Register a queued run and return its id.
    pub fn create_run(
        &self,
        document_version_id: i64,
        pipeline_version: &str,
    ) -> Result<i64, StoreError> {
        let id: i64 = self.conn.query_row(
            "INSERT INTO analysis_runs (document_version_id, pipeline_version, status)
             VALUES (?, ?, ?) RETURNING id",
            params![document_version_id, pipeline_version, RunStatus::Queued.as_str()],
            |row| row.get(0),
        )?;
        info!(run_id = id, document_version_id, "created analysis run");
        Ok(id)
    }

    /// Move a run to a non-terminal status. Terminal statuses go through
    /// [`finish_run`](Self::finish_run).
    pub fn set_run_status(&self, run_id: i64, status: RunStatus) -> Result<(), StoreError> {
        if status.is_terminal() {
            return Err(StoreError::InvalidStatus { run_id, status });
        }
        let updated = self.conn.execute(
            "UPDATE analysis_runs SET status = ? WHERE id = ?",
            params![status.as_str(), run_id],
        )?;
        if updated == 0 {
            return Err(StoreError::RunNotFound(run_id));
        }
        Ok(())
    }

    /// Record a terminal status, the finish time and the quality summary.
    pub fn finish_run(
        &self,
        run_id: i64,
        status: RunStatus,
        quality: Option<&SegmentationQuality>,
    ) -> Result<(), StoreError> {
        if !status.is_terminal() {
            return Err(StoreError::InvalidStatus { run_id, status });
        }
        let quality_json = quality.map(serde_json::to_string).transpose()?;
        let updated = self.conn.execute(
            "UPDATE analysis_runs
             SET status = ?, quality_summary_json = ?, finished_at = current_timestamp
             WHERE id = ?",
            params![status.as_str(), quality_json, run_id],
        )?;
        if updated == 0 {
            return Err(StoreError::RunNotFound(run_id));
        }
        info!(run_id, status = %status, "finished analysis run");
        Ok(())
    }

    pub fn get_run(&self, run_id: i64) -> Result<AnalysisRun, StoreError> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM analysis_runs WHERE id = ?");
        let batches = self.query_arrow_with(&sql, run_id)?;
        runs_from_batches(&batches)?
            .into_iter()
            .next()
            .ok_or(StoreError::RunNotFound(run_id))
    }

    /// All runs, oldest first.
    pub fn list_runs(&self) -> Result<Vec<AnalysisRun>, StoreError> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM analysis_runs ORDER BY id");
        runs_from_batches(&self.query_arrow(&sql)?)
    }

    // ── Outputs ──

    /// Store one artifact for a run, replacing an earlier one of the same type.
    pub fn put_output(
        &mut self,
        run_id: i64,
        output_type: OutputType,
        content_json: &str,
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM run_outputs WHERE run_id = ? AND output_type = ?",
            params![run_id, output_type.as_str()],
        )?;
        tx.execute(
            "INSERT INTO run_outputs (run_id, output_type, content_json) VALUES (?, ?, ?)",
            params![run_id, output_type.as_str(), content_json],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_output(&self, run_id: i64, output_type: OutputType) -> Result<String, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT content_json FROM run_outputs WHERE run_id = ? AND output_type = ?",
        )?;
        let batches: Vec<RecordBatch> = stmt
            .query_arrow(params![run_id, output_type.as_str()])?
            .collect();
        batches
            .iter()
            .map(|b| string_column(b, "content_json"))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .flatten()
            .next()
            .ok_or(StoreError::NoResults)
    }

    // ── Evidence ──

    /// Append evidence rows for a run in one transaction.
    pub fn put_evidence(
        &mut self,
        run_id: i64,
        document_version_id: i64,
        records: &[EvidenceRecord],
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for r in records {
            tx.execute(
                "INSERT INTO evidence
                    (run_id, document_version_id, claim_id, page_number, excerpt_text, article_label)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    run_id,
                    document_version_id,
                    r.claim_id,
                    i64::from(r.page_number),
                    r.excerpt_text,
                    r.article_label
                ],
            )?;
        }
        tx.commit()?;
        info!(run_id, count = records.len(), "stored evidence");
        Ok(())
    }

    /// Evidence of a run in insertion order.
    pub fn evidence_for_run(&self, run_id: i64) -> Result<Vec<EvidenceRecord>, StoreError> {
        let batches = self.query_arrow_with(
            "SELECT claim_id, page_number, excerpt_text, article_label
             FROM evidence WHERE run_id = ? ORDER BY id",
            run_id,
        )?;
        let mut records = Vec::new();
        for batch in &batches {
            let claims = string_column(batch, "claim_id")?;
            let pages = int_column(batch, "page_number")?;
            let excerpts = string_column(batch, "excerpt_text")?;
            let labels = string_column(batch, "article_label")?;
            for i in 0..batch.num_rows() {
                records.push(EvidenceRecord {
                    claim_id: claims[i].clone().unwrap_or_default(),
                    page_number: page_number(pages[i], "page_number")?,
                    excerpt_text: excerpts[i].clone().unwrap_or_default(),
                    article_label: labels[i].clone(),
                });
            }
        }
        Ok(records)
    }

    // ── Escape hatch ──

    /// Execute arbitrary SQL and return Arrow RecordBatches.
    pub fn query_arrow(&self, sql: &str) -> Result<Vec<RecordBatch>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([])?.collect();
        Ok(batches)
    }

    fn query_arrow_with(&self, sql: &str, key: i64) -> Result<Vec<RecordBatch>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([key])?.collect();
        Ok(batches)
    }
}

fn runs_from_batches(batches: &[RecordBatch]) -> Result<Vec<AnalysisRun>, StoreError> {
    let mut runs = Vec::new();
    for batch in batches {
        let ids = int_column(batch, "id")?;
        let versions = int_column(batch, "document_version_id")?;
        let pipelines = string_column(batch, "pipeline_version")?;
        let statuses = string_column(batch, "status")?;
        let quality = string_column(batch, "quality_summary_json")?;
        let created = string_column(batch, "created_at")?;
        let finished = string_column(batch, "finished_at")?;
        for i in 0..batch.num_rows() {
            let status = statuses[i]
                .as_deref()
                .and_then(RunStatus::parse)
                .ok_or_else(|| StoreError::Other(format!("bad run status: {:?}", statuses[i])))?;
            runs.push(AnalysisRun {
                id: required(ids[i], "id")?,
                document_version_id: required(versions[i], "document_version_id")?,
                pipeline_version: pipelines[i].clone().unwrap_or_default(),
                status,
                quality_summary_json: quality[i].clone(),
                created_at: created[i].clone().unwrap_or_default(),
                finished_at: finished[i].clone(),
            });
        }
    }
    Ok(runs)
}

// ── Column access ──
//
// DuckDB may hand back VARCHAR as Utf8 or a view type and integers at their
// declared width, so columns are cast before downcasting.

fn string_column(batch: &RecordBatch, name: &str) -> Result<Vec<Option<String>>, StoreError> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| StoreError::Other(format!("missing column {name}")))?;
    let col = cast(col.as_ref(), &DataType::Utf8)?;
    let arr = col
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| StoreError::Other(format!("{name} column not utf8")))?;
    Ok(arr.iter().map(|v| v.map(str::to_string)).collect())
}

fn int_column(batch: &RecordBatch, name: &str) -> Result<Vec<Option<i64>>, StoreError> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| StoreError::Other(format!("missing column {name}")))?;
    let col = cast(col.as_ref(), &DataType::Int64)?;
    let arr = col
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| StoreError::Other(format!("{name} column not i64")))?;
    Ok(arr.iter().collect())
}

fn required(value: Option<i64>, name: &str) -> Result<i64, StoreError> {
    value.ok_or_else(|| StoreError::Other(format!("null {name}")))
}

fn page_number(value: Option<i64>, name: &str) -> Result<u32, StoreError> {
    let v = required(value, name)?;
    u32::try_from(v).map_err(|_| StoreError::Other(format!("{name} out of range: {v}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use billscope_core::page::{PageText, select_page_texts};
    use billscope_core::segment::segment_pages;

    fn bill_segments() -> Vec<Segment> {
        segment_pages(&[
            PageText::new(1, "Art. 1\n(1) Primul alineat.\n(2) Al doilea alineat."),
            PageText::new(2, "Art. 2\nText simplu."),
        ])
    }

    fn raw(n: u32, text: &str) -> RawPage {
        RawPage {
            page_number: n,
            text: Some(text.to_string()),
            ocr_text: None,
        }
    }

    #[test]
    fn open_in_memory() {
        let store = DuckStore::open().unwrap();
        let batches = store.query_arrow("SELECT 1 AS x").unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].num_rows(), 1);
    }

    #[test]
    fn pages_round_trip() {
        let mut store = DuckStore::open().unwrap();
        let pages = vec![raw(2, "doi"), raw(1, "unu"), RawPage { page_number: 3, ..Default::default() }];
        store.replace_pages(5, &pages).unwrap();
        let stored = store.list_pages(5).unwrap();
        assert_eq!(stored.iter().map(|p| p.page_number).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(select_page_texts(&stored).len(), 2);
        assert!(store.list_pages(6).unwrap().is_empty());
    }

    #[test]
    fn chunks_resolve_parents() {
        let mut store = DuckStore::open().unwrap();
        let chunks = store.replace_chunks(1, &bill_segments()).unwrap();
        assert_eq!(chunks.len(), 4);
        let art1 = &chunks[0];
        assert_eq!(art1.chunk_type, ChunkType::Article);
        assert_eq!(chunks[1].parent_chunk_id, Some(art1.id));
        assert_eq!(chunks[2].parent_chunk_id, Some(art1.id));
        assert_eq!(chunks[3].label.as_deref(), Some("Art. 2"));
        assert_eq!(chunks[3].page_start, 2);
    }

    #[test]
    fn replace_chunks_is_idempotent_per_version() {
        let mut store = DuckStore::open().unwrap();
        store.replace_chunks(1, &bill_segments()).unwrap();
        store.replace_chunks(2, &bill_segments()).unwrap();
        let again = store.replace_chunks(1, &bill_segments()).unwrap();
        assert_eq!(again.len(), 4);
        assert_eq!(store.list_chunks(2).unwrap().len(), 4);
        // fresh ids on re-insert
        assert!(again[0].id > 4);
        assert_eq!(again[1].parent_chunk_id, Some(again[0].id));
    }

    #[test]
    fn articles_sorted_legally() {
        let mut store = DuckStore::open().unwrap();
        let segs = segment_pages(&[PageText::new(1, "Art. 1000\nw\nArt. 10\nx\nArt. 9A\ny\nArt. 9\nz")]);
        store.replace_chunks(1, &segs).unwrap();
        let labels: Vec<_> = store
            .articles_in_legal_order(1)
            .unwrap()
            .into_iter()
            .filter_map(|c| c.label)
            .collect();
        assert_eq!(labels, vec!["Art. 9", "Art. 9A", "Art. 10", "Art. 1000"]);
    }

    #[test]
    fn run_lifecycle() {
        let store = DuckStore::open().unwrap();
        let run_id = store.create_run(3, "analysis_v1").unwrap();
        assert_eq!(store.get_run(run_id).unwrap().status, RunStatus::Queued);

        store.set_run_status(run_id, RunStatus::Running).unwrap();
        let quality = billscope_core::quality::audit_segmentation(&[], &[1], 0.8);
        store
            .finish_run(run_id, RunStatus::Succeeded, Some(&quality))
            .unwrap();

        let run = store.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Succeeded);
        assert_eq!(run.document_version_id, 3);
        assert!(run.finished_at.is_some());
        let summary: SegmentationQuality =
            serde_json::from_str(run.quality_summary_json.as_deref().unwrap()).unwrap();
        assert_eq!(summary, quality);
        assert_eq!(store.list_runs().unwrap().len(), 1);
    }

    #[test]
    fn unknown_run_errors() {
        let store = DuckStore::open().unwrap();
        assert!(matches!(store.get_run(42), Err(StoreError::RunNotFound(42))));
        assert!(matches!(
            store.finish_run(42, RunStatus::Failed, None),
            Err(StoreError::RunNotFound(42))
        ));
    }

    #[test]
    fn status_changes_respect_terminal_states() {
        let store = DuckStore::open().unwrap();
        let run_id = store.create_run(1, "analysis_v1").unwrap();
        assert!(matches!(
            store.set_run_status(run_id, RunStatus::Succeeded),
            Err(StoreError::InvalidStatus { status: RunStatus::Succeeded, .. })
        ));
        assert!(matches!(
            store.finish_run(run_id, RunStatus::Running, None),
            Err(StoreError::InvalidStatus { status: RunStatus::Running, .. })
        ));
        assert_eq!(store.get_run(run_id).unwrap().status, RunStatus::Queued);
        assert!(store.get_run(run_id).unwrap().finished_at.is_none());
    }

    #[test]
    fn replaced_output_leaves_one_row() {
        let mut store = DuckStore::open().unwrap();
        let first = store.create_run(1, "analysis_v1").unwrap();
        let second = store.create_run(1, "analysis_v1").unwrap();
        for body in ["[]", "[1]", "[2]"] {
            store.put_output(first, OutputType::ImpactsV1, body).unwrap();
        }
        store.put_output(second, OutputType::ImpactsV1, "[9]").unwrap();

        let batches = store
            .query_arrow("SELECT count(*) AS n FROM run_outputs WHERE output_type = 'impacts_v1'")
            .unwrap();
        assert_eq!(int_column(&batches[0], "n").unwrap(), vec![Some(2)]);
        assert_eq!(store.get_output(first, OutputType::ImpactsV1).unwrap(), "[2]");
        assert_eq!(store.get_output(second, OutputType::ImpactsV1).unwrap(), "[9]");
    }

    #[test]
    fn outputs_replace_and_fetch() {
        let mut store = DuckStore::open().unwrap();
        let run_id = store.create_run(1, "analysis_v1").unwrap();
        store.put_output(run_id, OutputType::MechanismsV1, "[]").unwrap();
        store
            .put_output(run_id, OutputType::MechanismsV1, r#"[{"quote":"amendă"}]"#)
            .unwrap();
        assert_eq!(
            store.get_output(run_id, OutputType::MechanismsV1).unwrap(),
            r#"[{"quote":"amendă"}]"#
        );
        assert!(matches!(
            store.get_output(run_id, OutputType::ChangeListV1),
            Err(StoreError::NoResults)
        ));
    }

    #[test]
    fn evidence_round_trip() {
        let mut store = DuckStore::open().unwrap();
        let records = vec![
            EvidenceRecord {
                claim_id: "m:1:sanction:0".into(),
                page_number: 2,
                excerpt_text: "amendă de 500 lei".into(),
                article_label: Some("Art. 1".into()),
            },
            EvidenceRecord {
                claim_id: "sustainability:G:G.KEYWORDS".into(),
                page_number: 2,
                excerpt_text: "amendă de 500 lei".into(),
                article_label: None,
            },
        ];
        store.put_evidence(7, 1, &records).unwrap();
        assert_eq!(store.evidence_for_run(7).unwrap(), records);
        assert!(store.evidence_for_run(8).unwrap().is_empty());
    }

    // ── Persistent storage tests ──

    #[test]
    fn open_persistent_creates_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("test.duckdb");
        assert!(!db_path.exists());

        let _store = DuckStore::open_persistent(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn persistent_reopen_keeps_data() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("test.duckdb");

        let mut store = DuckStore::open_persistent(&db_path).unwrap();
        store.replace_chunks(1, &bill_segments()).unwrap();
        let run_id = store.create_run(1, "analysis_v1").unwrap();
        drop(store);

        let store = DuckStore::open_persistent(&db_path).unwrap();
        assert_eq!(store.list_chunks(1).unwrap().len(), 4);
        assert_eq!(store.get_run(run_id).unwrap().id, run_id);
        // sequences survive reopen
        assert!(store.create_run(1, "analysis_v1").unwrap() > run_id);
    }
}
