//! Statement execution interface
//!
//! The query builder only needs to run raw SQL text and read rows back, on
//! either a plain connection or an explicit transaction.

use serde::de::DeserializeOwned;

use super::SqlDialect;
use crate::error::{DalError, Result};

/// One result row, keyed by column name
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Runs raw SQL against a connection or transaction
pub trait Executor {
    /// Dialect of the connected database
    fn dialect(&self) -> SqlDialect;

    /// Run a query and collect every row
    fn query(&self, sql: &str) -> Result<Vec<Row>>;

    /// Run a statement, returning the number of affected rows
    fn execute(&self, sql: &str) -> Result<usize>;
}

/// An open transaction
///
/// Dropping an unfinished transaction rolls it back.
pub trait Transaction: Executor {
    fn commit(self: Box<Self>) -> Result<()>;

    fn rollback(self: Box<Self>) -> Result<()>;
}

/// A shared database handle that can open transactions
pub trait Database: Executor + Send + Sync {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>>;
}

/// Deserialize rows into the caller's destination type
pub fn scan<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(serde_json::Value::Object(row)).map_err(DalError::from))
        .collect()
}

/// Read the `total` column of a single-row count result
pub(crate) fn scan_total(rows: &[Row]) -> Result<u64> {
    rows.first()
        .and_then(|row| row.get("total"))
        .and_then(|total| total.as_u64())
        .ok_or_else(|| DalError::Format("count query returned no total".to_string()))
}
