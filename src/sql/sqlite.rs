//! SQLite executor
//!
//! One `rusqlite::Connection` behind a reentrant mutex. A transaction holds
//! the mutex for its whole lifetime, so every statement issued through it
//! runs on the same connection. Other threads wait for the transaction to
//! finish; the owning thread may keep using the database handle, and its
//! statements run inside the open transaction.

use std::path::Path;
use std::time::Instant;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::Value;

use super::executor::{Database, Executor, Row, Transaction};
use super::SqlDialect;
use crate::config::DatabaseConfig;
use crate::error::{DalError, Result};

/// SQLite database handle
pub struct SqliteDatabase {
    conn: ReentrantMutex<Connection>,
}

impl SqliteDatabase {
    /// Open (or create) a database file; `:memory:` opens a private in-memory db
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        tracing::debug!("Opened sqlite database at {}", path.display());
        Ok(Self {
            conn: ReentrantMutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: ReentrantMutex::new(Connection::open_in_memory()?),
        })
    }

    /// Open the database named by the configuration
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        if config.dialect != SqlDialect::Sqlite {
            return Err(DalError::Config(format!(
                "sqlite executor cannot serve dialect {:?}",
                config.dialect
            )));
        }
        Self::open(&config.path)
    }

    /// Run several `;`-separated statements (schema setup, fixtures)
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.lock().execute_batch(sql)?;
        Ok(())
    }

    /// Begin a transaction on the shared connection
    ///
    /// While it is open, statements issued through this handle on the same
    /// thread join the transaction, and beginning a second one fails with
    /// `DalError::Database`.
    pub fn transaction(&self) -> Result<SqliteTransaction<'_>> {
        SqliteTransaction::begin(self.conn.lock())
    }
}

impl Executor for SqliteDatabase {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::Sqlite
    }

    fn query(&self, sql: &str) -> Result<Vec<Row>> {
        query_rows(&self.conn.lock(), sql)
    }

    fn execute(&self, sql: &str) -> Result<usize> {
        execute(&self.conn.lock(), sql)
    }
}

impl Database for SqliteDatabase {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>> {
        Ok(Box::new(self.transaction()?))
    }
}

/// Transaction holding the connection until commit, rollback or drop
pub struct SqliteTransaction<'a> {
    conn: ReentrantMutexGuard<'a, Connection>,
    finished: bool,
}

impl<'a> SqliteTransaction<'a> {
    fn begin(conn: ReentrantMutexGuard<'a, Connection>) -> Result<Self> {
        conn.execute_batch("BEGIN")?;
        Ok(Self {
            conn,
            finished: false,
        })
    }

    pub fn commit(mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }

    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Executor for SqliteTransaction<'_> {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::Sqlite
    }

    fn query(&self, sql: &str) -> Result<Vec<Row>> {
        query_rows(&self.conn, sql)
    }

    fn execute(&self, sql: &str) -> Result<usize> {
        execute(&self.conn, sql)
    }
}

impl Transaction for SqliteTransaction<'_> {
    fn commit(self: Box<Self>) -> Result<()> {
        SqliteTransaction::commit(*self)
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        SqliteTransaction::rollback(*self)
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Rolling back unfinished transaction");
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!("Rollback failed: {}", e);
            }
        }
    }
}

// =============================================================================
// Statement helpers
// =============================================================================

fn query_rows(conn: &Connection, sql: &str) -> Result<Vec<Row>> {
    let started = Instant::now();
    let rows = collect_rows(conn, sql).map_err(|e| {
        tracing::warn!("{} ({})", sql, e);
        e
    })?;
    tracing::debug!("{} ({} rows, {:?})", sql, rows.len(), started.elapsed());
    Ok(rows)
}

fn collect_rows(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (index, name) in columns.iter().enumerate() {
            record.insert(name.clone(), to_json(row.get_ref(index)?));
        }
        out.push(record);
    }
    Ok(out)
}

fn execute(conn: &Connection, sql: &str) -> Result<usize> {
    let started = Instant::now();
    let affected = conn.execute(sql, []).map_err(|e| {
        tracing::warn!("{} ({})", sql, e);
        e
    })?;
    tracing::debug!("{} ({} affected, {:?})", sql, affected, started.elapsed());
    Ok(affected)
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}
