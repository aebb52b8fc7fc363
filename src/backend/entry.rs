//! Stored entries for the in-memory backend

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::error::DalError;

/// Error text for commands issued against a key of another kind
pub(crate) const WRONG_TYPE: &str =
    "WRONGTYPE Operation against a key holding the wrong kind of value";

/// Value held under a key
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    List(VecDeque<String>),
    Set(BTreeSet<String>),
}

impl Value {
    /// Collections are removed from the keyspace once empty
    pub(crate) fn is_empty_collection(&self) -> bool {
        match self {
            Value::Str(_) => false,
            Value::Hash(h) => h.is_empty(),
            Value::List(l) => l.is_empty(),
            Value::Set(s) => s.is_empty(),
        }
    }
}

/// A value plus its optional expiry deadline
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) value: Value,
    pub(crate) expires_at: Option<Instant>,
}

impl Entry {
    pub(crate) fn new(value: Value, ttl: Option<Duration>) -> Self {
        Self {
            value,
            // A TTL past what Instant can represent never expires
            expires_at: ttl.and_then(|d| Instant::now().checked_add(d)),
        }
    }

    pub(crate) fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| Instant::now() >= exp)
            .unwrap_or(false)
    }

    pub(crate) fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|exp| exp.saturating_duration_since(Instant::now()))
    }

    pub(crate) fn as_str(&self) -> Result<&str, DalError> {
        match &self.value {
            Value::Str(s) => Ok(s),
            _ => Err(wrong_type()),
        }
    }

    pub(crate) fn as_hash_mut(&mut self) -> Result<&mut HashMap<String, String>, DalError> {
        match &mut self.value {
            Value::Hash(h) => Ok(h),
            _ => Err(wrong_type()),
        }
    }

    pub(crate) fn as_list_mut(&mut self) -> Result<&mut VecDeque<String>, DalError> {
        match &mut self.value {
            Value::List(l) => Ok(l),
            _ => Err(wrong_type()),
        }
    }

    pub(crate) fn as_set_mut(&mut self) -> Result<&mut BTreeSet<String>, DalError> {
        match &mut self.value {
            Value::Set(s) => Ok(s),
            _ => Err(wrong_type()),
        }
    }
}

pub(crate) fn wrong_type() -> DalError {
    DalError::Store(WRONG_TYPE.to_string())
}
