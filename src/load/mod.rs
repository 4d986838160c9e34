//! Warehouse Writer: appends the star schema table by table.
//!
//! Each table is appended inside its own transaction. There is no transaction
//! spanning tables, so a failure part-way leaves earlier tables loaded.

#[cfg(feature = "db")]
pub mod remote;
pub mod sqlite;
pub mod table;

use async_trait::async_trait;
use tracing::info;

use crate::config::WarehouseConfig;
use crate::error::LoadError;

#[cfg(feature = "db")]
pub use remote::LibsqlWarehouse;
pub use sqlite::SqliteWarehouse;
pub use table::{Cell, TableBatch, WarehouseRow, FACT_SALES, LOAD_ORDER};

/// DDL for the eight warehouse tables, applied only on request.
pub const STAR_SCHEMA_DDL: &str = include_str!("../../migrations/001_create_star_schema.sql");

#[async_trait]
pub trait WarehouseWriter: Send + Sync {
    /// Human-readable connection target for logs.
    fn target(&self) -> String;

    async fn create_schema(&self) -> Result<(), LoadError>;

    /// Appends every row of `batch`; returns the number of rows written.
    async fn append(&self, batch: &TableBatch) -> Result<usize, LoadError>;

    async fn count_rows(&self, table: &str) -> Result<i64, LoadError>;
}

/// Appends `batches` in order, stopping at the first failure.
pub async fn append_all(
    writer: &dyn WarehouseWriter,
    batches: &[TableBatch],
) -> Result<Vec<(&'static str, usize)>, LoadError> {
    let mut loaded = Vec::with_capacity(batches.len());
    for batch in batches {
        let written = writer.append(batch).await?;
        info!(warehouse = %writer.target(), table = batch.name, rows = written, "Table appended");
        crate::observability::metrics::load::rows(batch.name, written);
        loaded.push((batch.name, written));
    }
    if let Some((_, rows)) = loaded.iter().find(|(name, _)| *name == FACT_SALES) {
        info!("Fact table loaded with {} rows", rows);
    }
    Ok(loaded)
}

/// Checks `table` against the known table names before it is spliced into SQL.
pub(crate) fn known_table(table: &str) -> Result<&'static str, LoadError> {
    LOAD_ORDER
        .iter()
        .copied()
        .find(|name| *name == table)
        .ok_or_else(|| LoadError::Append {
            table: table.to_string(),
            message: "unknown warehouse table".to_string(),
        })
}

/// Opens the configured warehouse. With `create` a missing SQLite file is
/// created, otherwise it is a connection error.
pub async fn connect_warehouse(
    config: &WarehouseConfig,
    create: bool,
) -> Result<Box<dyn WarehouseWriter>, LoadError> {
    match config {
        WarehouseConfig::Sqlite { path } => {
            let warehouse = if create {
                SqliteWarehouse::create(path)?
            } else {
                SqliteWarehouse::open(path)?
            };
            Ok(Box::new(warehouse))
        }
        #[cfg(feature = "db")]
        WarehouseConfig::Libsql { url, auth_token } => Ok(Box::new(
            LibsqlWarehouse::connect(url.clone(), auth_token.clone()).await?,
        )),
        #[cfg(not(feature = "db"))]
        WarehouseConfig::Libsql { url, .. } => Err(LoadError::Connect {
            target: url.clone(),
            message: "libSQL warehouse requires the `db` feature".to_string(),
        }),
    }
}
