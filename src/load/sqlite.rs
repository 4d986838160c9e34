use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::{known_table, Cell, TableBatch, WarehouseWriter, STAR_SCHEMA_DDL};
use crate::error::LoadError;

/// Local SQLite warehouse file.
pub struct SqliteWarehouse {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteWarehouse {
    /// Opens an existing warehouse; a missing file is a connection error.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| connect_error(path, e))?;
        Self::with_connection(path, conn)
    }

    /// Opens the warehouse, creating the file and parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| connect_error(path, e))?;
        }
        let conn = Connection::open(path).map_err(|e| connect_error(path, e))?;
        Self::with_connection(path, conn)
    }

    fn with_connection(path: &Path, conn: Connection) -> Result<Self, LoadError> {
        // Surface a corrupt or non-database file at connect time.
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
            .map_err(|e| connect_error(path, e))?;
        info!("Connected to SQLite warehouse at {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, LoadError> {
        self.conn.lock().map_err(|_| LoadError::Connect {
            target: self.path.display().to_string(),
            message: "connection lock poisoned".to_string(),
        })
    }

    fn append_batch(&self, batch: &TableBatch) -> Result<usize, LoadError> {
        let append_error = |e: rusqlite::Error| LoadError::Append {
            table: batch.name.to_string(),
            message: e.to_string(),
        };

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(append_error)?;
        {
            let mut stmt = tx.prepare(&batch.insert_sql()).map_err(append_error)?;
            for row in &batch.rows {
                stmt.execute(params_from_iter(row.iter().map(to_value)))
                    .map_err(append_error)?;
            }
        }
        tx.commit().map_err(append_error)?;
        debug!(table = batch.name, rows = batch.len(), "SQLite append committed");
        Ok(batch.len())
    }
}

fn connect_error(path: &Path, e: impl ToString) -> LoadError {
    LoadError::Connect {
        target: path.display().to_string(),
        message: e.to_string(),
    }
}

fn to_value(cell: &Cell) -> Value {
    match cell {
        Cell::Integer(v) => Value::Integer(*v),
        Cell::Real(v) => Value::Real(*v),
        Cell::Text(v) => Value::Text(v.clone()),
    }
}

#[async_trait]
impl WarehouseWriter for SqliteWarehouse {
    fn target(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }

    async fn create_schema(&self) -> Result<(), LoadError> {
        let conn = self.lock()?;
        conn.execute_batch(STAR_SCHEMA_DDL)
            .map_err(|e| LoadError::Schema(e.to_string()))?;
        info!("Star schema tables ensured in {}", self.path.display());
        Ok(())
    }

    async fn append(&self, batch: &TableBatch) -> Result<usize, LoadError> {
        self.append_batch(batch)
    }

    async fn count_rows(&self, table: &str) -> Result<i64, LoadError> {
        let table = known_table(table)?;
        let conn = self.lock()?;
        conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |row| row.get(0))
            .map_err(|e| LoadError::Append {
                table: table.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{SeasonRow, StoreRow};

    fn warehouse() -> (tempfile::TempDir, SqliteWarehouse) {
        let dir = tempfile::tempdir().unwrap();
        let wh = SqliteWarehouse::create(dir.path().join("dw.db")).unwrap();
        (dir, wh)
    }

    #[tokio::test]
    async fn appends_are_cumulative() {
        let (_dir, wh) = warehouse();
        wh.create_schema().await.unwrap();

        let batch = TableBatch::from_rows(&[
            SeasonRow { season_id: 1, season: "Winter".to_string() },
            SeasonRow { season_id: 2, season: "Summer".to_string() },
        ]);
        assert_eq!(wh.append(&batch).await.unwrap(), 2);
        wh.append(&batch).await.unwrap();
        assert_eq!(wh.count_rows("dim_season").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn append_without_schema_is_a_load_error() {
        let (_dir, wh) = warehouse();
        let batch = TableBatch::from_rows(&[StoreRow {
            store_id: 1,
            store_type: "Pharmacy".to_string(),
            city: "Boston".to_string(),
        }]);
        match wh.append(&batch).await {
            Err(LoadError::Append { table, .. }) => assert_eq!(table, "dim_store"),
            other => panic!("expected append error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn append_all_stops_at_first_failure_and_keeps_earlier_tables() {
        let (_dir, wh) = warehouse();
        wh.lock()
            .unwrap()
            .execute_batch("CREATE TABLE dim_season (season_id INTEGER NOT NULL, season TEXT NOT NULL);")
            .unwrap();

        let batches = vec![
            TableBatch::from_rows(&[SeasonRow { season_id: 1, season: "Fall".to_string() }]),
            TableBatch::from_rows(&[StoreRow {
                store_id: 1,
                store_type: "Pharmacy".to_string(),
                city: "Boston".to_string(),
            }]),
        ];
        assert!(crate::load::append_all(&wh, &batches).await.is_err());
        assert_eq!(wh.count_rows("dim_season").await.unwrap(), 1);
    }
}
