// 🗄️ Store - destination tables in an embedded SQLite database
//
// One connection per partition load, released on drop. Each partition load (create
// table + insert all rows) is a single transaction: it lands whole or not at
// all. Rows are appended, never deduplicated.

use crate::config::{is_valid_identifier, DatabaseConfig, DatabaseTarget};
use crate::error::{EtlError, Result};
use crate::record::{FundMetadataRecord, COLUMNS};
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::path::Path;
use tracing::{info, warn};

pub struct Store {
    conn: Connection,
    target: DatabaseTarget,
}

impl Store {
    /// Open the store described by `database.*`.
    ///
    /// The database file is created if missing, but its directory must exist.
    pub fn open(db: &DatabaseConfig) -> Result<Store> {
        let target = db.target()?;
        if db.has_network_settings() {
            warn!("database user/password/port are ignored by the embedded store");
        }

        let conn = match &target {
            DatabaseTarget::Memory => Connection::open_in_memory(),
            DatabaseTarget::File(path) => open_file(path),
        }
        .map_err(|e| {
            EtlError::Storage(format!("cannot open {}: {}", target.describe(), e))
        })?;

        info!(target = %target.describe(), "database connection opened");
        Ok(Store { conn, target })
    }

    pub fn open_in_memory() -> Result<Store> {
        let conn = Connection::open_in_memory()?;
        Ok(Store {
            conn,
            target: DatabaseTarget::Memory,
        })
    }

    pub fn target(&self) -> &DatabaseTarget {
        &self.target
    }

    /// Round-trip `SELECT 1`
    pub fn check_connection(&self) -> Result<i64> {
        let one: i64 = self.conn.query_row("SELECT 1", [], |row| row.get(0))?;
        Ok(one)
    }

    /// Append `group` to `table` in one transaction.
    ///
    /// The table is created first if needed. On any failure the transaction
    /// is rolled back, so neither the new table nor any row from this group
    /// is left behind; a table that already existed is untouched.
    pub fn load_to_table(&mut self, group: &[FundMetadataRecord], table: &str) -> Result<usize> {
        check_table_name(table)?;

        let tx = self
            .conn
            .transaction()
            .map_err(|e| EtlError::Storage(format!("{}: cannot begin transaction: {}", table, e)))?;

        tx.execute(&create_table_sql(table), [])
            .map_err(|e| EtlError::Storage(format!("{}: create table failed: {}", table, e)))?;

        if group.is_empty() {
            tx.commit()?;
            info!(table, "no rows to load");
            return Ok(0);
        }

        {
            let mut stmt = tx
                .prepare(&insert_sql(table))
                .map_err(|e| EtlError::Storage(format!("{}: insert rejected: {}", table, e)))?;

            for record in group {
                stmt.execute(params_from_iter(record.values()))
                    .map_err(|e| EtlError::Storage(format!("{}: insert rejected: {}", table, e)))?;
            }
        }

        tx.commit()
            .map_err(|e| EtlError::Storage(format!("{}: commit failed: {}", table, e)))?;

        info!(table, rows = group.len(), "inserted records");
        Ok(group.len())
    }

    pub fn count_rows(&self, table: &str) -> Result<i64> {
        check_table_name(table)?;
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", table),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// All rows of `table` in insertion order
    pub fn fetch_all(&self, table: &str) -> Result<Vec<FundMetadataRecord>> {
        check_table_name(table)?;
        let columns = quoted_columns();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM \"{}\" ORDER BY rowid",
            columns, table
        ))?;

        let records = stmt
            .query_map([], |row| {
                let mut record = FundMetadataRecord::new(
                    row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                );
                for (i, col) in COLUMNS.iter().enumerate() {
                    if *col == "scheme_name" {
                        continue;
                    }
                    if let Some(value) = row.get::<_, Option<String>>(i)? {
                        record = record.with_attribute(col, value);
                    }
                }
                Ok(record)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

fn open_file(path: &Path) -> rusqlite::Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
}

fn check_table_name(table: &str) -> Result<()> {
    if is_valid_identifier(table) {
        Ok(())
    } else {
        Err(EtlError::Storage(format!("invalid table name '{}'", table)))
    }
}

fn quoted_columns() -> String {
    COLUMNS
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn create_table_sql(table: &str) -> String {
    let columns = COLUMNS
        .iter()
        .map(|c| format!("\"{}\" TEXT", c))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE IF NOT EXISTS \"{}\" ({})", table, columns)
}

fn insert_sql(table: &str) -> String {
    let placeholders = (1..=COLUMNS.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO \"{}\" ({}) VALUES ({})",
        table,
        quoted_columns(),
        placeholders
    )
}
