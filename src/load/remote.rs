use async_trait::async_trait;
use libsql::params::Params;
use libsql::{Builder, Connection, Database, Value};
use tracing::{debug, info};

use super::{known_table, Cell, TableBatch, WarehouseWriter, STAR_SCHEMA_DDL};
use crate::error::LoadError;

/// Remote Turso/libSQL warehouse.
pub struct LibsqlWarehouse {
    url: String,
    _db: Database,
    conn: Connection,
}

impl LibsqlWarehouse {
    pub async fn connect(url: String, auth_token: String) -> Result<Self, LoadError> {
        info!("Connecting to libSQL warehouse at {}", url);
        let connect_error = |e: libsql::Error| LoadError::Connect {
            target: url.clone(),
            message: e.to_string(),
        };

        let db = Builder::new_remote(url.clone(), auth_token)
            .build()
            .await
            .map_err(connect_error)?;
        let conn = db.connect().map_err(connect_error)?;

        Ok(Self { url, _db: db, conn })
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
impl WarehouseWriter for LibsqlWarehouse {
    fn target(&self) -> String {
        self.url.clone()
    }

    async fn create_schema(&self) -> Result<(), LoadError> {
        self.conn
            .execute_batch(STAR_SCHEMA_DDL)
            .await
            .map_err(|e| LoadError::Schema(e.to_string()))?;
        info!("Star schema tables ensured in {}", self.url);
        Ok(())
    }

    async fn append(&self, batch: &TableBatch) -> Result<usize, LoadError> {
        let append_error = |e: libsql::Error| LoadError::Append {
            table: batch.name.to_string(),
            message: e.to_string(),
        };

        let sql = batch.insert_sql();
        let tx = self.conn.transaction().await.map_err(append_error)?;
        for row in &batch.rows {
            let values: Vec<Value> = row.iter().map(to_value).collect();
            tx.execute(&sql, Params::Positional(values))
                .await
                .map_err(append_error)?;
        }
        tx.commit().await.map_err(append_error)?;
        debug!(table = batch.name, rows = batch.len(), "libSQL append committed");
        Ok(batch.len())
    }

    async fn count_rows(&self, table: &str) -> Result<i64, LoadError> {
        let table = known_table(table)?;
        let count_error = |e: libsql::Error| LoadError::Append {
            table: table.to_string(),
            message: e.to_string(),
        };

        let mut rows = self
            .conn
            .query(&format!("SELECT count(*) FROM {table}"), ())
            .await
            .map_err(count_error)?;
        match rows.next().await.map_err(count_error)? {
            Some(row) => row.get::<i64>(0).map_err(count_error),
            None => Ok(0),
        }
    }
}
