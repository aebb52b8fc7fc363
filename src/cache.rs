//! Cache Module
//!
//! Typed key-value facade over an injected [`KvBackend`].
//!
//! ## Responsibilities
//! - Route typed reads/writes through the value codec
//! - Pass raw string reads/writes straight to the backend
//! - Turn backend "not found" signals into [`DalError::MissingKey`]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::backend::{KeyTtl, KvBackend};
use crate::codec::{self, CacheDecode, CacheEncode};
use crate::error::{DalError, Result};
use crate::lock::DistributedLock;

/// Key-value store facade
///
/// Cloning is cheap; clones share the same backend handle.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn KvBackend>,
}

/// A zero TTL means "no expiry"
fn effective_ttl(ttl: Option<Duration>) -> Option<Duration> {
    ttl.filter(|d| !d.is_zero())
}

fn encode_all<V: CacheEncode>(values: &[V]) -> Result<Vec<String>> {
    values.iter().map(|v| v.encode()).collect()
}

impl Cache {
    /// Create a facade over the given backend
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }

    /// The underlying backend handle
    pub fn backend(&self) -> &Arc<dyn KvBackend> {
        &self.backend
    }

    /// Lock primitives sharing this cache's backend and key namespace
    pub fn locks(&self) -> DistributedLock {
        DistributedLock::new(Arc::clone(&self.backend))
    }

    // =========================================================================
    // Strings
    // =========================================================================

    /// Get the raw stored string
    pub fn get(&self, key: &str) -> Result<String> {
        self.backend
            .get(key)?
            .ok_or_else(|| DalError::MissingKey(format!("key {} does not exist", key)))
    }

    /// Get and decode a value
    ///
    /// ```
    /// use std::sync::Arc;
    /// use dalkit::{Cache, MemoryBackend};
    ///
    /// let cache = Cache::new(Arc::new(MemoryBackend::new()));
    /// cache.set_value("answer", &42u32, None).unwrap();
    /// assert_eq!(cache.get_value::<u32>("answer").unwrap(), 42);
    /// ```
    pub fn get_value<T: CacheDecode>(&self, key: &str) -> Result<T> {
        let raw = self.get(key)?;
        codec::decode(&raw)
    }

    /// Get the raw stored bytes
    pub fn get_bytes(&self, key: &str) -> Result<Bytes> {
        self.get(key).map(Bytes::from)
    }

    /// Store a raw string, bypassing the codec
    pub fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.backend.set(key, value, effective_ttl(ttl))
    }

    /// Encode and store a value
    pub fn set_value<T: CacheEncode + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let raw = codec::encode(value)?;
        self.backend.set(key, &raw, effective_ttl(ttl))
    }

    /// Delete one or more keys, returning how many existed
    pub fn delete(&self, keys: &[&str]) -> Result<u64> {
        self.backend.del(keys)
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        self.backend.exists(key)
    }

    /// Set a key's expiry; returns false when the key does not exist
    pub fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.backend.expire(key, ttl)
    }

    /// Remaining lifetime: `None` for keys without expiry
    pub fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        match self.backend.ttl(key)? {
            KeyTtl::Missing => Err(DalError::MissingKey(format!("key {} does not exist", key))),
            KeyTtl::Persistent => Ok(None),
            KeyTtl::Expires(remaining) => Ok(Some(remaining)),
        }
    }

    pub fn incr(&self, key: &str) -> Result<i64> {
        self.backend.incr_by(key, 1)
    }

    pub fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        self.backend.incr_by(key, delta)
    }

    pub fn decr(&self, key: &str) -> Result<i64> {
        self.backend.incr_by(key, -1)
    }

    pub fn decr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let negated = delta
            .checked_neg()
            .ok_or_else(|| DalError::Store(format!("decrement {} out of range", delta)))?;
        self.backend.incr_by(key, negated)
    }

    // =========================================================================
    // Hashes
    // =========================================================================

    /// Encode and store a hash field
    pub fn hset<T: CacheEncode + ?Sized>(&self, key: &str, field: &str, value: &T) -> Result<()> {
        let raw = codec::encode(value)?;
        self.backend.hset(key, field, &raw)?;
        Ok(())
    }

    /// Get the raw text of a hash field
    pub fn hget(&self, key: &str, field: &str) -> Result<String> {
        self.backend.hget(key, field)?.ok_or_else(|| {
            DalError::MissingKey(format!("hash field {}.{} does not exist", key, field))
        })
    }

    /// Get and decode a hash field
    pub fn hget_value<T: CacheDecode>(&self, key: &str, field: &str) -> Result<T> {
        let raw = self.hget(key, field)?;
        codec::decode(&raw)
    }

    /// All fields of a hash; empty when the key does not exist
    pub fn hget_all(&self, key: &str) -> Result<HashMap<String, String>> {
        self.backend.hgetall(key)
    }

    pub fn hdel(&self, key: &str, fields: &[&str]) -> Result<u64> {
        self.backend.hdel(key, fields)
    }

    // =========================================================================
    // Lists
    // =========================================================================

    pub fn lpush<T: CacheEncode>(&self, key: &str, values: &[T]) -> Result<u64> {
        self.backend.lpush(key, &encode_all(values)?)
    }

    pub fn rpush<T: CacheEncode>(&self, key: &str, values: &[T]) -> Result<u64> {
        self.backend.rpush(key, &encode_all(values)?)
    }

    pub fn lpop(&self, key: &str) -> Result<String> {
        self.backend
            .lpop(key)?
            .ok_or_else(|| DalError::MissingKey(format!("list {} is empty", key)))
    }

    pub fn rpop(&self, key: &str) -> Result<String> {
        self.backend
            .rpop(key)?
            .ok_or_else(|| DalError::MissingKey(format!("list {} is empty", key)))
    }

    /// Inclusive range of list elements; negative indexes count from the tail
    pub fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        self.backend.lrange(key, start, stop)
    }

    // =========================================================================
    // Sets
    // =========================================================================

    pub fn sadd<T: CacheEncode>(&self, key: &str, members: &[T]) -> Result<u64> {
        self.backend.sadd(key, &encode_all(members)?)
    }

    pub fn smembers(&self, key: &str) -> Result<Vec<String>> {
        self.backend.smembers(key)
    }

    pub fn sismember<T: CacheEncode + ?Sized>(&self, key: &str, member: &T) -> Result<bool> {
        self.backend.sismember(key, &codec::encode(member)?)
    }

    pub fn srem<T: CacheEncode>(&self, key: &str, members: &[T]) -> Result<u64> {
        self.backend.srem(key, &encode_all(members)?)
    }

    // =========================================================================
    // Keyspace
    // =========================================================================

    /// Keys matching a glob pattern
    pub fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.backend.keys(pattern)
    }

    /// Drop every key in the current database
    pub fn flush_all(&self) -> Result<()> {
        tracing::warn!("Flushing all cache keys");
        self.backend.flush_db()
    }
}
