//! SQL dialects
//!
//! The only dialect-specific part of statement assembly is how the total
//! (pre-LIMIT) row count is retrieved on the count path.

use serde::{Deserialize, Serialize};

/// Target database flavour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// `SQL_CALC_FOUND_ROWS` marker, then `SELECT FOUND_ROWS()`
    MySql,

    /// No marker; the total is a `COUNT(*)` over the unpaged statement
    #[default]
    Sqlite,
}

impl SqlDialect {
    /// Token placed right after `SELECT` on the count path
    pub fn count_marker(&self) -> Option<&'static str> {
        match self {
            SqlDialect::MySql => Some("SQL_CALC_FOUND_ROWS"),
            SqlDialect::Sqlite => None,
        }
    }

    /// Second statement of the count path, yielding one `total` column
    ///
    /// `unpaged` is the main statement without its LIMIT clause.
    pub fn total_count_sql(&self, unpaged: &str) -> String {
        match self {
            SqlDialect::MySql => "SELECT FOUND_ROWS() AS total".to_string(),
            SqlDialect::Sqlite => format!("SELECT COUNT(*) AS total FROM ({})", unpaged),
        }
    }
}
