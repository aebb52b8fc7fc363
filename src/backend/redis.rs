//! Redis backend
//!
//! Issues the command set to a Redis server over one synchronous
//! connection. Connection pooling is left to the caller: share one
//! `RedisBackend` per connection you want to keep open.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use redis::{Client, Connection, Script};

use super::{KeyTtl, KvBackend};
use crate::config::RedisConfig;
use crate::error::Result;

/// Compare-and-delete, atomic on the server
const DEL_IF_EQ: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
end
return 0
"#;

/// Key-value backend over a Redis connection
pub struct RedisBackend {
    conn: Mutex<Connection>,
}

impl RedisBackend {
    /// Connect using the redis section of the configuration, then PING
    pub fn connect(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url())?;
        let mut conn = client.get_connection()?;
        redis::cmd("PING").query::<String>(&mut conn)?;
        tracing::info!("Connected to redis at {}:{}", config.host, config.port);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Wrap an already-open connection
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn query<T: redis::FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T> {
        let mut conn = self.conn.lock();
        Ok(cmd.query(&mut *conn)?)
    }
}

fn millis(ttl: Duration) -> u64 {
    // Redis rejects a zero expiry
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

impl KvBackend for RedisBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.query(redis::cmd("GET").arg(key))
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(millis(ttl));
        }
        self.query::<()>(&cmd)
    }

    fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<bool> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX");
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(millis(ttl));
        }
        let reply: Option<String> = self.query(&cmd)?;
        Ok(reply.is_some())
    }

    fn del(&self, keys: &[&str]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        self.query(redis::cmd("DEL").arg(keys))
    }

    fn del_if_eq(&self, key: &str, expected: &str) -> Result<bool> {
        let mut conn = self.conn.lock();
        let deleted: i64 = Script::new(DEL_IF_EQ)
            .key(key)
            .arg(expected)
            .invoke(&mut *conn)?;
        Ok(deleted > 0)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let count: i64 = self.query(redis::cmd("EXISTS").arg(key))?;
        Ok(count > 0)
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.query(redis::cmd("PEXPIRE").arg(key).arg(millis(ttl)))
    }

    fn ttl(&self, key: &str) -> Result<KeyTtl> {
        let ms: i64 = self.query(redis::cmd("PTTL").arg(key))?;
        Ok(match ms {
            -2 => KeyTtl::Missing,
            ms if ms < 0 => KeyTtl::Persistent,
            ms => KeyTtl::Expires(Duration::from_millis(ms as u64)),
        })
    }

    fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        self.query(redis::cmd("INCRBY").arg(key).arg(delta))
    }

    fn hset(&self, key: &str, field: &str, value: &str) -> Result<bool> {
        let added: i64 = self.query(redis::cmd("HSET").arg(key).arg(field).arg(value))?;
        Ok(added > 0)
    }

    fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        self.query(redis::cmd("HGET").arg(key).arg(field))
    }

    fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        self.query(redis::cmd("HGETALL").arg(key))
    }

    fn hdel(&self, key: &str, fields: &[&str]) -> Result<u64> {
        if fields.is_empty() {
            return Ok(0);
        }
        self.query(redis::cmd("HDEL").arg(key).arg(fields))
    }

    fn lpush(&self, key: &str, values: &[String]) -> Result<u64> {
        if values.is_empty() {
            return self.query(redis::cmd("LLEN").arg(key));
        }
        self.query(redis::cmd("LPUSH").arg(key).arg(values))
    }

    fn rpush(&self, key: &str, values: &[String]) -> Result<u64> {
        if values.is_empty() {
            return self.query(redis::cmd("LLEN").arg(key));
        }
        self.query(redis::cmd("RPUSH").arg(key).arg(values))
    }

    fn lpop(&self, key: &str) -> Result<Option<String>> {
        self.query(redis::cmd("LPOP").arg(key))
    }

    fn rpop(&self, key: &str) -> Result<Option<String>> {
        self.query(redis::cmd("RPOP").arg(key))
    }

    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        self.query(redis::cmd("LRANGE").arg(key).arg(start).arg(stop))
    }

    fn sadd(&self, key: &str, members: &[String]) -> Result<u64> {
        if members.is_empty() {
            return Ok(0);
        }
        self.query(redis::cmd("SADD").arg(key).arg(members))
    }

    fn smembers(&self, key: &str) -> Result<Vec<String>> {
        self.query(redis::cmd("SMEMBERS").arg(key))
    }

    fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        self.query(redis::cmd("SISMEMBER").arg(key).arg(member))
    }

    fn srem(&self, key: &str, members: &[String]) -> Result<u64> {
        if members.is_empty() {
            return Ok(0);
        }
        self.query(redis::cmd("SREM").arg(key).arg(members))
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.query(redis::cmd("KEYS").arg(pattern))?;
        keys.sort();
        Ok(keys)
    }

    fn flush_db(&self) -> Result<()> {
        self.query::<()>(&redis::cmd("FLUSHDB"))
    }
}
