use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::error::{EtlError, Result};
use crate::extract::SourceReader;
use crate::load::{append_all, WarehouseWriter, FACT_SALES};
use crate::observability::metrics;
use crate::transform::{StarSchema, StarSchemaBuilder};

/// Where the built star schema ends up.
pub enum Sink {
    Warehouse(Box<dyn WarehouseWriter>),
    /// Dry run: the schema is written as JSON into this directory instead.
    JsonDir(PathBuf),
}

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub source: String,
    pub extracted_rows: usize,
    pub tables: Vec<(String, usize)>,
    pub fact_rows: usize,
    pub dropped_transactions: usize,
    pub output: String,
    pub elapsed_secs: f64,
}

/// Extract → transform → load, strictly in sequence.
pub struct EtlPipeline {
    reader: Box<dyn SourceReader>,
    builder: StarSchemaBuilder,
    sink: Sink,
}

impl EtlPipeline {
    pub fn new(reader: Box<dyn SourceReader>, builder: StarSchemaBuilder, sink: Sink) -> Self {
        Self {
            reader,
            builder,
            sink,
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = info_span!("etl_run", %run_id);
        async move {
            info!("Starting ETL process");
            metrics::run::started();
            let started = Instant::now();

            match self.execute(run_id, started).await {
                Ok(summary) => {
                    metrics::run::duration(summary.elapsed_secs);
                    info!(
                        "ETL process finished in {:.2}s: {} facts from {} transactions",
                        summary.elapsed_secs, summary.fact_rows, summary.extracted_rows
                    );
                    Ok(summary)
                }
                Err(e) => {
                    metrics::run::failed(stage_of(&e));
                    error!("ETL process failed: {}", e);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, run_id: Uuid, started: Instant) -> Result<RunSummary> {
        let t_extract = Instant::now();
        let rows = self.reader.read().await?;
        metrics::extract::rows(rows.len());
        metrics::extract::duration(t_extract.elapsed().as_secs_f64());

        let t_transform = Instant::now();
        let schema = self.builder.build(&rows)?;
        metrics::transform::duration(t_transform.elapsed().as_secs_f64());
        metrics::transform::fact_rows(schema.facts.len());
        metrics::transform::dropped(schema.dropped_transactions);

        let batches = schema.tables();
        for batch in batches.iter().filter(|b| b.name != FACT_SALES) {
            metrics::transform::dimension_rows(batch.name, batch.len());
        }

        let t_load = Instant::now();
        let (tables, output) = match &self.sink {
            Sink::Warehouse(writer) => {
                info!("Loading {} tables into {}", batches.len(), writer.target());
                let loaded = append_all(writer.as_ref(), &batches).await?;
                (
                    loaded
                        .into_iter()
                        .map(|(name, rows)| (name.to_string(), rows))
                        .collect(),
                    writer.target(),
                )
            }
            Sink::JsonDir(dir) => {
                let path = persist_to_json(&schema, run_id, dir)?;
                info!("Dry run: star schema written to {}", path.display());
                (
                    batches
                        .iter()
                        .map(|b| (b.name.to_string(), b.len()))
                        .collect(),
                    path.display().to_string(),
                )
            }
        };
        metrics::load::duration(t_load.elapsed().as_secs_f64());

        Ok(RunSummary {
            run_id,
            source: self.reader.location(),
            extracted_rows: rows.len(),
            tables,
            fact_rows: schema.facts.len(),
            dropped_transactions: schema.dropped_transactions,
            output,
            elapsed_secs: started.elapsed().as_secs_f64(),
        })
    }
}

fn stage_of(e: &EtlError) -> &'static str {
    match e {
        EtlError::Extraction(_) => "extract",
        EtlError::SchemaBuild(_) => "transform",
        EtlError::Load(_) => "load",
        _ => "other",
    }
}

fn persist_to_json(schema: &StarSchema, run_id: Uuid, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let filepath = output_dir.join(format!("star_schema_{timestamp}_{run_id}.json"));

    let json_content = serde_json::to_string_pretty(schema)?;
    fs::write(&filepath, json_content)?;

    Ok(filepath)
}
