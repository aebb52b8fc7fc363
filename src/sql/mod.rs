//! SQL Module
//!
//! Raw SELECT assembly and execution against a relational store.
//!
//! ## Responsibilities
//! - Accumulate clauses with a fluent builder
//! - Assemble one statement in fixed clause order
//! - Execute it, optionally with the page's total row count
//!
//! ## Count path
//! ```text
//! BEGIN
//!   SELECT SQL_CALC_FOUND_ROWS ... LIMIT o, n     (MySQL)
//!   SELECT FOUND_ROWS() AS total
//! COMMIT
//!
//! BEGIN
//!   SELECT ... LIMIT o, n                          (SQLite)
//!   SELECT COUNT(*) AS total FROM (SELECT ...)
//! COMMIT
//! ```
//!
//! Statements are built by string interpolation, not parameter binding.
//! Treat field names, raw fragments and non-string operands as trusted.

mod builder;
mod dialect;
mod executor;
mod sqlite;
mod value;

pub use builder::{QueryBuilder, Statement};
pub use dialect::SqlDialect;
pub use executor::{scan, Database, Executor, Row, Transaction};
pub use sqlite::{SqliteDatabase, SqliteTransaction};
pub use value::{Operator, SqlValue};
