//! In-memory backend
//!
//! HashMap-based keyspace behind a single RwLock, with Redis semantics for
//! expiry, wrong-type errors and empty collections.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::time::Duration;

use parking_lot::RwLock;
use regex::Regex;

use super::entry::{wrong_type, Entry, Value};
use super::{KeyTtl, KvBackend};
use crate::error::{DalError, Result};

/// In-process key-value backend
///
/// ## Concurrency:
/// - `data`: one RwLock; reads share it, every write is exclusive
/// - Expired entries are dropped lazily by the next write touching them,
///   or eagerly by [`MemoryBackend::purge_expired`]
#[derive(Default)]
pub struct MemoryBackend {
    data: RwLock<HashMap<String, Entry>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let mut data = self.data.write();
        let before = data.len();
        data.retain(|_, entry| !entry.is_expired());
        let purged = before - data.len();
        if purged > 0 {
            tracing::debug!("Purged {} expired keys", purged);
        }
        purged
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.data.read().values().filter(|e| !e.is_expired()).count()
    }

    /// True when no live key exists
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Keyspace helpers
// =============================================================================

fn live<'a>(data: &'a HashMap<String, Entry>, key: &str) -> Option<&'a Entry> {
    data.get(key).filter(|entry| !entry.is_expired())
}

fn live_mut<'a>(data: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
    if data.get(key).map(Entry::is_expired).unwrap_or(false) {
        data.remove(key);
    }
    data.get_mut(key)
}

/// Live entry for `key`, created with `empty` when absent
fn live_or_insert<'a>(
    data: &'a mut HashMap<String, Entry>,
    key: &str,
    empty: fn() -> Value,
) -> &'a mut Entry {
    if data.get(key).map(Entry::is_expired).unwrap_or(false) {
        data.remove(key);
    }
    data.entry(key.to_string())
        .or_insert_with(|| Entry::new(empty(), None))
}

fn remove_if_empty(data: &mut HashMap<String, Entry>, key: &str) {
    if data
        .get(key)
        .map(|entry| entry.value.is_empty_collection())
        .unwrap_or(false)
    {
        data.remove(key);
    }
}

/// Resolve Redis-style inclusive indexes against a list length
fn list_bounds(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { len + start } else { start }.max(0);
    let stop = if stop < 0 { len + stop } else { stop }.min(len - 1);
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// Convert a glob pattern to an anchored regex
fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let mut regex_str = String::with_capacity(pattern.len() * 2);
    regex_str.push('^');

    for c in pattern.chars() {
        match c {
            '*' => regex_str.push_str(".*"),
            '?' => regex_str.push('.'),
            _ => regex_str.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
    }

    regex_str.push('$');
    Regex::new(&regex_str)
        .map_err(|e| DalError::Store(format!("invalid key pattern {:?}: {}", pattern, e)))
}

// =============================================================================
// Command implementations
// =============================================================================

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let data = self.data.read();
        match live(&data, key) {
            Some(entry) => entry.as_str().map(|s| Some(s.to_string())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut data = self.data.write();
        data.insert(key.to_string(), Entry::new(Value::Str(value.to_string()), ttl));
        Ok(())
    }

    fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<bool> {
        // Check and insert under one write guard
        let mut data = self.data.write();
        if live_mut(&mut data, key).is_some() {
            return Ok(false);
        }
        data.insert(key.to_string(), Entry::new(Value::Str(value.to_string()), ttl));
        Ok(true)
    }

    fn del(&self, keys: &[&str]) -> Result<u64> {
        let mut data = self.data.write();
        let mut removed = 0;
        for key in keys {
            if let Some(entry) = data.remove(*key) {
                if !entry.is_expired() {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    fn del_if_eq(&self, key: &str, expected: &str) -> Result<bool> {
        let mut data = self.data.write();
        let matches = match live_mut(&mut data, key) {
            Some(entry) => entry.as_str()? == expected,
            None => false,
        };
        if matches {
            data.remove(key);
        }
        Ok(matches)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(live(&self.data.read(), key).is_some())
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut data = self.data.write();
        match live_mut(&mut data, key) {
            Some(entry) => {
                *entry = Entry::new(entry.value.clone(), Some(ttl));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn ttl(&self, key: &str) -> Result<KeyTtl> {
        let data = self.data.read();
        Ok(match live(&data, key) {
            None => KeyTtl::Missing,
            Some(entry) => match entry.ttl_remaining() {
                Some(remaining) => KeyTtl::Expires(remaining),
                None => KeyTtl::Persistent,
            },
        })
    }

    fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let mut data = self.data.write();
        let entry = live_or_insert(&mut data, key, || Value::Str("0".to_string()));
        let current: i64 = entry.as_str()?.parse().map_err(|_| not_an_integer())?;
        let next = current.checked_add(delta).ok_or_else(not_an_integer)?;
        entry.value = Value::Str(next.to_string());
        Ok(next)
    }

    fn hset(&self, key: &str, field: &str, value: &str) -> Result<bool> {
        let mut data = self.data.write();
        let hash = live_or_insert(&mut data, key, || Value::Hash(HashMap::new())).as_hash_mut()?;
        Ok(hash.insert(field.to_string(), value.to_string()).is_none())
    }

    fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        let data = self.data.read();
        match live(&data, key).map(|entry| &entry.value) {
            None => Ok(None),
            Some(Value::Hash(hash)) => Ok(hash.get(field).cloned()),
            Some(_) => Err(wrong_type()),
        }
    }

    fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let data = self.data.read();
        match live(&data, key).map(|entry| &entry.value) {
            None => Ok(HashMap::new()),
            Some(Value::Hash(hash)) => Ok(hash.clone()),
            Some(_) => Err(wrong_type()),
        }
    }

    fn hdel(&self, key: &str, fields: &[&str]) -> Result<u64> {
        let mut data = self.data.write();
        let removed = match live_mut(&mut data, key) {
            None => return Ok(0),
            Some(entry) => {
                let hash = entry.as_hash_mut()?;
                fields.iter().filter(|f| hash.remove(**f).is_some()).count() as u64
            }
        };
        remove_if_empty(&mut data, key);
        Ok(removed)
    }

    fn lpush(&self, key: &str, values: &[String]) -> Result<u64> {
        let mut data = self.data.write();
        let list = live_or_insert(&mut data, key, || Value::List(VecDeque::new())).as_list_mut()?;
        for value in values {
            list.push_front(value.clone());
        }
        let len = list.len() as u64;
        remove_if_empty(&mut data, key);
        Ok(len)
    }

    fn rpush(&self, key: &str, values: &[String]) -> Result<u64> {
        let mut data = self.data.write();
        let list = live_or_insert(&mut data, key, || Value::List(VecDeque::new())).as_list_mut()?;
        list.extend(values.iter().cloned());
        let len = list.len() as u64;
        remove_if_empty(&mut data, key);
        Ok(len)
    }

    fn lpop(&self, key: &str) -> Result<Option<String>> {
        let mut data = self.data.write();
        let popped = match live_mut(&mut data, key) {
            None => return Ok(None),
            Some(entry) => entry.as_list_mut()?.pop_front(),
        };
        remove_if_empty(&mut data, key);
        Ok(popped)
    }

    fn rpop(&self, key: &str) -> Result<Option<String>> {
        let mut data = self.data.write();
        let popped = match live_mut(&mut data, key) {
            None => return Ok(None),
            Some(entry) => entry.as_list_mut()?.pop_back(),
        };
        remove_if_empty(&mut data, key);
        Ok(popped)
    }

    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let data = self.data.read();
        let list = match live(&data, key).map(|entry| &entry.value) {
            None => return Ok(Vec::new()),
            Some(Value::List(list)) => list,
            Some(_) => return Err(wrong_type()),
        };
        Ok(match list_bounds(list.len(), start, stop) {
            Some((from, to)) => list.range(from..=to).cloned().collect(),
            None => Vec::new(),
        })
    }

    fn sadd(&self, key: &str, members: &[String]) -> Result<u64> {
        let mut data = self.data.write();
        let set = live_or_insert(&mut data, key, || Value::Set(BTreeSet::new())).as_set_mut()?;
        let added = members.iter().filter(|m| set.insert((*m).clone())).count() as u64;
        remove_if_empty(&mut data, key);
        Ok(added)
    }

    fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let data = self.data.read();
        match live(&data, key).map(|entry| &entry.value) {
            None => Ok(Vec::new()),
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(wrong_type()),
        }
    }

    fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let data = self.data.read();
        match live(&data, key).map(|entry| &entry.value) {
            None => Ok(false),
            Some(Value::Set(set)) => Ok(set.contains(member)),
            Some(_) => Err(wrong_type()),
        }
    }

    fn srem(&self, key: &str, members: &[String]) -> Result<u64> {
        let mut data = self.data.write();
        let removed = match live_mut(&mut data, key) {
            None => return Ok(0),
            Some(entry) => {
                let set = entry.as_set_mut()?;
                members.iter().filter(|m| set.remove(m.as_str())).count() as u64
            }
        };
        remove_if_empty(&mut data, key);
        Ok(removed)
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let regex = glob_to_regex(pattern)?;
        let data = self.data.read();
        let mut keys: Vec<String> = data
            .iter()
            .filter(|(key, entry)| !entry.is_expired() && regex.is_match(key.as_str()))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn flush_db(&self) -> Result<()> {
        let mut data = self.data.write();
        let dropped = data.len();
        data.clear();
        tracing::debug!("Flushed {} keys", dropped);
        Ok(())
    }
}

fn not_an_integer() -> DalError {
    DalError::Store("ERR value is not an integer or out of range".to_string())
}
