use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use retail_dw::config::{Config, DEFAULT_CONFIG_PATH};
use retail_dw::extract::reader_for;
use retail_dw::load::connect_warehouse;
use retail_dw::observability::init_metrics;
use retail_dw::{logging, EtlPipeline, Sink, StarSchemaBuilder};

#[derive(Parser)]
#[command(name = "retail_dw")]
#[command(about = "Load retail transactions into a star-schema warehouse")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Build the star schema but write it as JSON instead of loading the warehouse
    #[arg(long)]
    dry_run: bool,

    /// Directory for dry-run output
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Create the warehouse tables before loading if they do not exist
    #[arg(long)]
    init_schema: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    let _guard = logging::init_logging(&config.logging)?;
    init_metrics();

    let reader = reader_for(&config.source)?;
    let builder = StarSchemaBuilder::new(config.transform.clone());

    let sink = if cli.dry_run {
        Sink::JsonDir(cli.output_dir)
    } else {
        let writer = connect_warehouse(&config.warehouse, cli.init_schema).await?;
        if cli.init_schema {
            writer.create_schema().await?;
        }
        Sink::Warehouse(writer)
    };

    let summary = EtlPipeline::new(reader, builder, sink).run().await?;

    info!(run_id = %summary.run_id, "Run summary");
    println!("\n📊 ETL results for {}:", summary.source);
    println!("   Transactions extracted: {}", summary.extracted_rows);
    for (table, rows) in &summary.tables {
        println!("   {:<20} {} rows", table, rows);
    }
    if summary.dropped_transactions > 0 {
        println!("   Dropped (no promotion): {}", summary.dropped_transactions);
    }
    println!("   Output: {}", summary.output);
    Ok(())
}
