//! Backend Module
//!
//! The key-value command surface consumed by the cache facade and the lock.
//!
//! ## Commands
//! - Strings: GET, SET (optional expiry), SET NX PX, DEL, EXISTS, EXPIRE,
//!   TTL, INCRBY
//! - Hashes: HSET, HGET, HGETALL, HDEL
//! - Lists: LPUSH, RPUSH, LPOP, RPOP, LRANGE
//! - Sets: SADD, SMEMBERS, SISMEMBER, SREM
//! - Keyspace: KEYS, FLUSHDB
//!
//! Backends report absence with `None`/`false`/empty collections; the
//! facade decides which absences are errors. A failing call (transport,
//! wrong type) returns `DalError::Store` or a backend-specific store error.

mod entry;
mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use memory::MemoryBackend;
#[cfg(feature = "redis")]
pub use self::redis::RedisBackend;

use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;

/// Remaining lifetime of a key, as reported by TTL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key does not exist
    Missing,

    /// Key exists without an expiry
    Persistent,

    /// Key expires after the given duration
    Expires(Duration),
}

/// Key-value store command set
///
/// Handles are shared process-wide; every method takes `&self` and must be
/// safe to call from multiple threads.
pub trait KvBackend: Send + Sync {
    // -------------------------------------------------------------------------
    // Strings
    // -------------------------------------------------------------------------
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a string value; `None` clears any previous expiry
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Store only if the key is absent; returns whether the value was stored
    fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<bool>;

    /// Delete keys; returns how many existed
    fn del(&self, keys: &[&str]) -> Result<u64>;

    /// Delete `key` only if it holds exactly `expected`
    fn del_if_eq(&self, key: &str, expected: &str) -> Result<bool>;

    fn exists(&self, key: &str) -> Result<bool>;

    /// Set an expiry; returns false when the key does not exist
    fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    fn ttl(&self, key: &str) -> Result<KeyTtl>;

    /// Add `delta` to an integer value, creating it at zero if absent
    fn incr_by(&self, key: &str, delta: i64) -> Result<i64>;

    // -------------------------------------------------------------------------
    // Hashes
    // -------------------------------------------------------------------------
    /// Set a hash field; returns true when the field is new
    fn hset(&self, key: &str, field: &str, value: &str) -> Result<bool>;

    fn hget(&self, key: &str, field: &str) -> Result<Option<String>>;

    fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;

    fn hdel(&self, key: &str, fields: &[&str]) -> Result<u64>;

    // -------------------------------------------------------------------------
    // Lists
    // -------------------------------------------------------------------------
    /// Push values to the head, one at a time; returns the new length
    fn lpush(&self, key: &str, values: &[String]) -> Result<u64>;

    /// Push values to the tail; returns the new length
    fn rpush(&self, key: &str, values: &[String]) -> Result<u64>;

    fn lpop(&self, key: &str) -> Result<Option<String>>;

    fn rpop(&self, key: &str) -> Result<Option<String>>;

    /// Inclusive range; negative indexes count from the tail
    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>>;

    // -------------------------------------------------------------------------
    // Sets
    // -------------------------------------------------------------------------
    fn sadd(&self, key: &str, members: &[String]) -> Result<u64>;

    fn smembers(&self, key: &str) -> Result<Vec<String>>;

    fn sismember(&self, key: &str, member: &str) -> Result<bool>;

    fn srem(&self, key: &str, members: &[String]) -> Result<u64>;

    // -------------------------------------------------------------------------
    // Keyspace
    // -------------------------------------------------------------------------
    /// Keys matching a glob pattern (`*`, `?`)
    fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    fn flush_db(&self) -> Result<()>;
}
