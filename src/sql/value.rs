//! Predicate operands and operators
//!
//! Operands are interpolated as literal text. Only string operands are
//! quoted, and quotes inside them are not escaped: never pass untrusted
//! input as a field name, a raw fragment, or a non-string operand.

use std::fmt;

/// A value on the right-hand side of a predicate
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    TextList(Vec<String>),
    IntList(Vec<i64>),
    /// Mixed list; string elements are quoted individually
    List(Vec<SqlValue>),
}

impl SqlValue {
    /// Rendering inside a set: strings quoted, everything else as-is
    fn member(&self) -> String {
        match self {
            SqlValue::Text(s) => quote(s),
            other => other.to_string(),
        }
    }

    /// Comma-separated members for `IN (...)`
    pub(crate) fn set_members(&self) -> String {
        match self {
            SqlValue::TextList(items) => items.iter().map(|s| quote(s)).collect::<Vec<_>>().join(", "),
            SqlValue::IntList(items) => join(items),
            SqlValue::List(items) => items
                .iter()
                .map(SqlValue::member)
                .collect::<Vec<_>>()
                .join(", "),
            scalar => scalar.member(),
        }
    }
}

pub(crate) fn quote(s: &str) -> String {
    format!("'{}'", s)
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Default text formatting, no quoting
impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::UInt(u) => write!(f, "{}", u),
            SqlValue::Float(x) => write!(f, "{}", x),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::TextList(items) => f.write_str(&join(items)),
            SqlValue::IntList(items) => f.write_str(&join(items)),
            SqlValue::List(items) => f.write_str(&join(items)),
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<&String> for SqlValue {
    fn from(s: &String) -> Self {
        SqlValue::Text(s.clone())
    }
}

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for SqlValue {
            fn from(v: $ty) -> Self {
                SqlValue::Int(v as i64)
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for SqlValue {
            fn from(v: $ty) -> Self {
                SqlValue::UInt(v as u64)
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        // Widen through the shortest text so 0.1f32 renders as 0.1
        SqlValue::Float(v.to_string().parse().unwrap_or(f64::from(v)))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

impl From<Vec<String>> for SqlValue {
    fn from(items: Vec<String>) -> Self {
        SqlValue::TextList(items)
    }
}

impl From<Vec<&str>> for SqlValue {
    fn from(items: Vec<&str>) -> Self {
        SqlValue::TextList(items.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for SqlValue {
    fn from(items: [&str; N]) -> Self {
        SqlValue::TextList(items.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<i64>> for SqlValue {
    fn from(items: Vec<i64>) -> Self {
        SqlValue::IntList(items)
    }
}

impl From<Vec<i32>> for SqlValue {
    fn from(items: Vec<i32>) -> Self {
        SqlValue::IntList(items.into_iter().map(i64::from).collect())
    }
}

impl<const N: usize> From<[i64; N]> for SqlValue {
    fn from(items: [i64; N]) -> Self {
        SqlValue::IntList(items.to_vec())
    }
}

impl<const N: usize> From<[i32; N]> for SqlValue {
    fn from(items: [i32; N]) -> Self {
        SqlValue::IntList(items.iter().map(|&i| i64::from(i)).collect())
    }
}

impl From<Vec<SqlValue>> for SqlValue {
    fn from(items: Vec<SqlValue>) -> Self {
        SqlValue::List(items)
    }
}

// =============================================================================
// Operators
// =============================================================================

/// Comparison operator of a predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    In,
    NotIn,
    Like,
    /// Anything else, interpolated verbatim
    Raw(String),
}

impl Operator {
    /// Parse an operator, ignoring case and surrounding whitespace
    pub fn parse(op: &str) -> Self {
        let trimmed = op.trim();
        match trimmed.to_lowercase().as_str() {
            "=" => Operator::Eq,
            "!=" => Operator::Ne,
            "in" => Operator::In,
            "not in" => Operator::NotIn,
            "like" => Operator::Like,
            _ => Operator::Raw(trimmed.to_string()),
        }
    }

    /// Render `field <op> value` with the quoting rules for this operator
    pub(crate) fn render(&self, field: &str, value: &SqlValue) -> String {
        match self {
            Operator::Eq | Operator::Ne => {
                let symbol = if *self == Operator::Eq { "=" } else { "!=" };
                match value {
                    SqlValue::Text(s) => format!("{} {} {}", field, symbol, quote(s)),
                    other => format!("{} {} {}", field, symbol, other),
                }
            }
            Operator::In => format!("{} IN ({})", field, value.set_members()),
            Operator::NotIn => format!("{} NOT IN ({})", field, value.set_members()),
            Operator::Like => format!("{} LIKE {}", field, quote(&value.to_string())),
            Operator::Raw(op) => format!("{} {} {}", field, op, value),
        }
    }
}
