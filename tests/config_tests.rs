//! Configuration Tests
//!
//! Tests verify:
//! - Defaults and builder overrides
//! - YAML loading with partial files
//! - Per-mode file selection
//! - Mode parsing

use std::fs;
use std::path::PathBuf;

use dalkit::config::{DatabaseConfig, LockConfig, RedisConfig};
use dalkit::{Config, DalError, Mode, SqlDialect};
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// =============================================================================
// Default Tests
// =============================================================================

#[test]
fn test_defaults() {
    let config = Config::default();

    assert_eq!(config.mode, Mode::Dev);
    assert_eq!(config.redis.host, "localhost");
    assert_eq!(config.redis.port, 6379);
    assert_eq!(config.redis.db, 0);
    assert!(config.redis.password.is_empty());
    assert_eq!(config.database.path, PathBuf::from(":memory:"));
    assert_eq!(config.database.dialect, SqlDialect::Sqlite);
    assert_eq!(config.lock.wait_timeout_ms, 60_000);
    assert_eq!(config.lock.poll_interval_ms, 50);
}

#[test]
fn test_builder() {
    let config = Config::builder()
        .mode(Mode::Produce)
        .redis_host("cache.internal")
        .redis_port(6380)
        .redis_password("secret")
        .redis_db(2)
        .database_path("/var/lib/app.db")
        .dialect(SqlDialect::MySql)
        .lock_wait_timeout_ms(1_000)
        .lock_poll_interval_ms(20)
        .build();

    assert_eq!(config.mode, Mode::Produce);
    assert_eq!(
        config.redis,
        RedisConfig {
            host: "cache.internal".to_string(),
            port: 6380,
            password: "secret".to_string(),
            db: 2,
            ..RedisConfig::default()
        }
    );
    assert_eq!(
        config.database,
        DatabaseConfig {
            path: PathBuf::from("/var/lib/app.db"),
            dialect: SqlDialect::MySql,
        }
    );
    assert_eq!(
        config.lock,
        LockConfig {
            wait_timeout_ms: 1_000,
            poll_interval_ms: 20,
        }
    );
}

#[test]
fn test_redis_url() {
    let mut redis = RedisConfig::default();
    assert_eq!(redis.url(), "redis://localhost:6379/0");

    redis.password = "pw".to_string();
    redis.db = 3;
    assert_eq!(redis.url(), "redis://:pw@localhost:6379/3");
}

#[test]
fn test_redis_split_password_fallback() {
    let mut redis = RedisConfig {
        password1: "left".to_string(),
        password2: "right".to_string(),
        ..RedisConfig::default()
    };
    assert_eq!(redis.effective_password(), "left#right");
    assert_eq!(redis.url(), "redis://:left%23right@localhost:6379/0");

    // The plain password wins when set
    redis.password = "whole".to_string();
    assert_eq!(redis.effective_password(), "whole");
    assert_eq!(redis.url(), "redis://:whole@localhost:6379/0");
}

#[test]
fn test_redis_split_password_from_yaml() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "split.yaml",
        "redis:\n  password1: ab\n  password2: cd\n",
    );

    let config = Config::from_file(&path).unwrap();
    assert!(config.redis.password.is_empty());
    assert_eq!(config.redis.effective_password(), "ab#cd");
}

// =============================================================================
// File Loading Tests
// =============================================================================

#[test]
fn test_from_file_full() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "app.yaml",
        r#"
mode: test
redis:
  host: redis.test
  port: 7000
  password: hunter2
  db: 1
database:
  path: /tmp/test.db
  dialect: mysql
lock:
  wait_timeout_ms: 500
  poll_interval_ms: 5
"#,
    );

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.mode, Mode::Test);
    assert_eq!(config.redis.host, "redis.test");
    assert_eq!(config.redis.port, 7000);
    assert_eq!(config.redis.password, "hunter2");
    assert_eq!(config.database.path, PathBuf::from("/tmp/test.db"));
    assert_eq!(config.database.dialect, SqlDialect::MySql);
    assert_eq!(config.lock.wait_timeout_ms, 500);
}

#[test]
fn test_from_file_partial_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "partial.yaml", "redis:\n  host: other\n");

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.redis.host, "other");
    assert_eq!(config.redis.port, 6379);
    assert_eq!(config.mode, Mode::Dev);
    assert_eq!(config.lock, LockConfig::default());
}

#[test]
fn test_from_file_missing() {
    let dir = TempDir::new().unwrap();

    let err = Config::from_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, DalError::Config(_)));
}

#[test]
fn test_from_file_invalid_yaml() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "bad.yaml", "redis:\n  port: not-a-port\n");

    let err = Config::from_file(&path).unwrap_err();
    assert!(matches!(err, DalError::Config(_)));
}

#[test]
fn test_for_mode_selects_file() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "dev.yaml", "redis:\n  host: dev-redis\n");
    write_config(&dir, "produce.yaml", "mode: dev\nredis:\n  host: prod-redis\n");

    let dev = Config::for_mode(dir.path(), Mode::Dev).unwrap();
    assert_eq!(dev.redis.host, "dev-redis");

    let produce = Config::for_mode(dir.path(), Mode::Produce).unwrap();
    assert_eq!(produce.redis.host, "prod-redis");
    assert_eq!(produce.mode, Mode::Produce);

    assert!(Config::for_mode(dir.path(), Mode::Test).is_err());
}

// =============================================================================
// Mode Tests
// =============================================================================

#[test]
fn test_mode_parse() {
    assert_eq!("dev".parse::<Mode>().unwrap(), Mode::Dev);
    assert_eq!("TEST".parse::<Mode>().unwrap(), Mode::Test);
    assert_eq!("produce".parse::<Mode>().unwrap(), Mode::Produce);
    assert_eq!("prod".parse::<Mode>().unwrap(), Mode::Produce);

    let err = "staging".parse::<Mode>().unwrap_err();
    assert!(matches!(err, DalError::Config(_)));
}

#[test]
fn test_mode_display_and_filters() {
    assert_eq!(Mode::Produce.to_string(), "produce");
    assert_eq!(Mode::Dev.default_log_filter(), "info,dalkit=debug");
    assert_eq!(Mode::Produce.default_log_filter(), "warn");
}
