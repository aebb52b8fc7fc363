//! Query builder
//!
//! Accumulates clauses by value and assembles one raw SELECT statement.
//!
//! ## Clause order
//! ```text
//! SELECT [marker] fields FROM table a [joins] [WHERE p1 AND p2 ...]
//!        [GROUP BY g] [ORDER BY o] [LIMIT offset, count]
//! ```
//! The order is fixed whatever order the builder methods are called in;
//! joins and predicates keep their call order.

use std::fmt;
use std::time::Instant;

use serde::de::DeserializeOwned;

use super::executor::{scan, scan_total, Database, Executor};
use super::value::{Operator, SqlValue};
use super::SqlDialect;
use crate::error::Result;

/// An assembled SQL statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
}

impl Statement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn into_sql(self) -> String {
        self.sql
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

impl AsRef<str> for Statement {
    fn as_ref(&self) -> &str {
        &self.sql
    }
}

/// Fluent SELECT builder
///
/// ```
/// use dalkit::sql::QueryBuilder;
///
/// let statement = QueryBuilder::new("users")
///     .filter("id", "=", 5)
///     .page(2, 10)
///     .build();
/// assert_eq!(statement.sql(), "SELECT * FROM users a WHERE id = 5 LIMIT 10, 10");
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    fields: String,
    joins: Vec<String>,
    predicates: Vec<String>,
    group_by: Option<String>,
    order_by: Option<String>,
    /// (offset, count)
    limit: Option<(u64, u64)>,
}

impl QueryBuilder {
    /// Start a query on `table`, selecting every field
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: "*".to_string(),
            joins: Vec::new(),
            predicates: Vec::new(),
            group_by: None,
            order_by: None,
            limit: None,
        }
    }

    /// Replace the table name
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Replace the selected field list
    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = fields.into();
        self
    }

    /// Append a join clause, e.g. `LEFT JOIN orders b ON b.user_id = a.id`
    pub fn join(mut self, clause: impl Into<String>) -> Self {
        self.joins.push(clause.into());
        self
    }

    /// Append a `field op value` predicate
    ///
    /// `=`/`!=` quote string operands; `in`/`not in` take lists and quote
    /// each string element; `like` always quotes. Other operators are
    /// interpolated verbatim.
    pub fn filter(mut self, field: &str, op: &str, value: impl Into<SqlValue>) -> Self {
        let predicate = Operator::parse(op).render(field, &value.into());
        self.predicates.push(predicate);
        self
    }

    /// Append a predicate fragment verbatim
    pub fn filter_raw(mut self, fragment: impl Into<String>) -> Self {
        self.predicates.push(fragment.into());
        self
    }

    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by = Some(field.into());
        self
    }

    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_by = Some(clause.into());
        self
    }

    /// Paginate: pages start at 1; non-positive pages are treated as 1
    pub fn page(mut self, page: i64, page_size: u64) -> Self {
        let page = page.max(1) as u64;
        let offset = (page - 1).saturating_mul(page_size);
        self.limit = Some((offset, page_size));
        self
    }

    /// Assemble the statement
    pub fn build(&self) -> Statement {
        Statement {
            sql: self.assemble(None, true),
        }
    }

    /// Assemble the main statement of the count path for `dialect`
    pub fn build_with_count(&self, dialect: SqlDialect) -> Statement {
        Statement {
            sql: self.assemble(dialect.count_marker(), true),
        }
    }

    fn assemble(&self, marker: Option<&str>, paged: bool) -> String {
        let mut sql = String::from("SELECT ");
        if let Some(marker) = marker {
            sql.push_str(marker);
            sql.push(' ');
        }
        sql.push_str(&self.fields);
        sql.push_str(" FROM ");
        sql.push_str(&self.table);
        sql.push_str(" a");

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicates.join(" AND "));
        }

        if let Some(group_by) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }

        if let Some(order_by) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }

        if let (true, Some((offset, count))) = (paged, self.limit) {
            sql.push_str(&format!(" LIMIT {}, {}", offset, count));
        }

        sql
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Run the statement and deserialize every row into `T`
    pub fn get<T, E>(self, executor: &E) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        E: Executor + ?Sized,
    {
        let statement = self.build();
        let rows = executor.query(statement.sql())?;
        scan(rows)
    }

    /// Fetch a page plus the total row count inside a transaction of our own
    ///
    /// Both statements run on the same transaction, which is committed on
    /// success and rolled back on failure.
    pub fn get_with_count<T, D>(self, database: &D) -> Result<(Vec<T>, u64)>
    where
        T: DeserializeOwned,
        D: Database + ?Sized,
    {
        let tx = database.begin()?;
        match self.fetch_with_count(&*tx) {
            Ok(result) => {
                tx.commit()?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::warn!("Rollback after failed count query failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    /// Fetch a page plus the total row count on a caller-owned transaction
    ///
    /// No commit or rollback is attempted.
    pub fn get_with_count_in<T, E>(self, tx: &E) -> Result<(Vec<T>, u64)>
    where
        T: DeserializeOwned,
        E: Executor + ?Sized,
    {
        self.fetch_with_count(tx)
    }

    fn fetch_with_count<T, E>(&self, executor: &E) -> Result<(Vec<T>, u64)>
    where
        T: DeserializeOwned,
        E: Executor + ?Sized,
    {
        let started = Instant::now();
        let dialect = executor.dialect();
        let main = self.build_with_count(dialect);
        let count_sql = dialect.total_count_sql(&self.assemble(None, false));

        let rows = executor.query(main.sql())?;
        let total = scan_total(&executor.query(&count_sql)?)?;

        tracing::debug!(
            "Count query on {} returned {} of {} rows in {:?}",
            self.table,
            rows.len(),
            total,
            started.elapsed()
        );
        Ok((scan(rows)?, total))
    }
}
