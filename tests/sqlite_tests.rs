//! SQLite Execution Tests
//!
//! Tests verify:
//! - Rows deserialize into caller types
//! - Paged fetch with total count, on own and caller transactions
//! - Rollback on failure and on drop
//! - File-backed databases opened from config

use dalkit::config::DatabaseConfig;
use dalkit::sql::{Database, Executor, QueryBuilder, Row, SqlDialect, SqliteDatabase, Transaction};
use dalkit::DalError;
use serde::Deserialize;
use tempfile::TempDir;

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: i64,
    name: String,
    age: i64,
}

#[derive(Debug, Deserialize)]
struct Scored {
    id: i64,
    score: Option<f64>,
}

/// 25 users: ids 1..=25, ages 20..=44, even ids scored
fn setup_db() -> SqliteDatabase {
    let db = SqliteDatabase::open_in_memory().unwrap();
    let mut sql = String::from(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, \
         age INTEGER NOT NULL, score REAL);",
    );
    for id in 1..=25 {
        let score = if id % 2 == 0 { format!("{}.5", id) } else { "NULL".to_string() };
        sql.push_str(&format!(
            "INSERT INTO users (id, name, age, score) VALUES ({}, 'user{}', {}, {});",
            id,
            id,
            id + 19,
            score
        ));
    }
    sql.push_str(
        "CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER, amount INTEGER);\
         INSERT INTO orders (user_id, amount) VALUES (1, 100), (1, 50), (2, 75);",
    );
    db.execute_batch(&sql).unwrap();
    db
}

fn count_users(db: &SqliteDatabase) -> u64 {
    let (_, total) = QueryBuilder::new("users")
        .page(1, 1)
        .get_with_count::<Row, _>(db)
        .unwrap();
    total
}

// =============================================================================
// Plain Fetch Tests
// =============================================================================

#[test]
fn test_get_into_struct() {
    let db = setup_db();

    let users: Vec<User> = QueryBuilder::new("users")
        .fields("id, name, age")
        .filter("id", "=", 5i64)
        .get(&db)
        .unwrap();

    assert_eq!(
        users,
        vec![User {
            id: 5,
            name: "user5".to_string(),
            age: 24,
        }]
    );
}

#[test]
fn test_get_into_rows() {
    let db = setup_db();

    let rows: Vec<Row> = QueryBuilder::new("users")
        .filter("name", "in", vec!["user1", "user2"])
        .order_by("id")
        .get(&db)
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "user1");
    assert_eq!(rows[1]["id"], 2);
    assert!(rows[0]["score"].is_null());
}

#[test]
fn test_nullable_columns() {
    let db = setup_db();

    let rows: Vec<Scored> = QueryBuilder::new("users")
        .fields("id, score")
        .filter("id", "in", vec![3i64, 4])
        .order_by("id")
        .get(&db)
        .unwrap();

    assert_eq!(rows[0].id, 3);
    assert_eq!(rows[0].score, None);
    assert_eq!(rows[1].score, Some(4.5));
}

#[test]
fn test_get_with_join() {
    let db = setup_db();

    let rows: Vec<Row> = QueryBuilder::new("users")
        .fields("a.id, SUM(b.amount) AS spent")
        .join("JOIN orders b ON b.user_id = a.id")
        .group_by("a.id")
        .order_by("a.id")
        .get(&db)
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["spent"], 150);
    assert_eq!(rows[1]["spent"], 75);
}

#[test]
fn test_empty_result() {
    let db = setup_db();

    let users: Vec<User> = QueryBuilder::new("users")
        .filter("id", ">", 1000i64)
        .get(&db)
        .unwrap();

    assert!(users.is_empty());
}

#[test]
fn test_scan_type_mismatch_is_format_error() {
    let db = setup_db();

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Wrong {
        name: i64,
    }

    let err = QueryBuilder::new("users")
        .fields("name")
        .get::<Wrong, _>(&db)
        .unwrap_err();

    assert!(matches!(err, DalError::Format(_)));
}

#[test]
fn test_invalid_sql_is_database_error() {
    let db = setup_db();

    let err = QueryBuilder::new("no_such_table")
        .get::<Row, _>(&db)
        .unwrap_err();

    assert!(matches!(err, DalError::Database(_)));
    assert!(err.is_store_error());
}

// =============================================================================
// Count Path Tests
// =============================================================================

#[test]
fn test_get_with_count_pages() {
    let db = setup_db();

    let (users, total): (Vec<User>, u64) = QueryBuilder::new("users")
        .fields("id, name, age")
        .order_by("id")
        .page(2, 10)
        .get_with_count(&db)
        .unwrap();

    assert_eq!(total, 25);
    assert_eq!(users.len(), 10);
    assert_eq!(users.first().map(|u| u.id), Some(11));
    assert_eq!(users.last().map(|u| u.id), Some(20));
}

#[test]
fn test_get_with_count_last_page() {
    let db = setup_db();

    let (users, total): (Vec<Row>, u64) = QueryBuilder::new("users")
        .page(3, 10)
        .get_with_count(&db)
        .unwrap();

    assert_eq!(total, 25);
    assert_eq!(users.len(), 5);
}

#[test]
fn test_get_with_count_past_end() {
    let db = setup_db();

    let (users, total): (Vec<Row>, u64) = QueryBuilder::new("users")
        .page(9, 10)
        .get_with_count(&db)
        .unwrap();

    assert_eq!(total, 25);
    assert!(users.is_empty());
}

#[test]
fn test_get_with_count_respects_filters() {
    let db = setup_db();

    let (users, total): (Vec<User>, u64) = QueryBuilder::new("users")
        .fields("id, name, age")
        .filter("age", ">=", 40i64)
        .page(1, 2)
        .get_with_count(&db)
        .unwrap();

    assert_eq!(total, 5);
    assert_eq!(users.len(), 2);
}

#[test]
fn test_get_with_count_grouped() {
    let db = setup_db();

    let (rows, total): (Vec<Row>, u64) = QueryBuilder::new("orders")
        .fields("a.user_id, COUNT(*) AS n")
        .group_by("a.user_id")
        .page(1, 1)
        .get_with_count(&db)
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(total, 2);
}

#[test]
fn test_failed_count_rolls_back() {
    let db = setup_db();

    let err = QueryBuilder::new("missing")
        .page(1, 10)
        .get_with_count::<Row, _>(&db)
        .unwrap_err();
    assert!(err.is_store_error());

    // The connection must not be left inside a transaction
    assert_eq!(count_users(&db), 25);
    db.execute_batch("BEGIN; COMMIT;").unwrap();
}

// =============================================================================
// Transaction Tests
// =============================================================================

#[test]
fn test_count_on_caller_transaction() {
    let db = setup_db();

    let tx = db.transaction().unwrap();
    tx.execute("INSERT INTO users (id, name, age) VALUES (26, 'user26', 45)")
        .unwrap();

    let (users, total): (Vec<Row>, u64) = QueryBuilder::new("users")
        .page(3, 10)
        .get_with_count_in(&tx)
        .unwrap();
    assert_eq!(total, 26);
    assert_eq!(users.len(), 6);

    tx.rollback().unwrap();
    assert_eq!(count_users(&db), 25);
}

#[test]
fn test_caller_transaction_commit() {
    let db = setup_db();

    let tx = db.begin().unwrap();
    tx.execute("DELETE FROM users WHERE id > 20").unwrap();

    let (_, total) = QueryBuilder::new("users")
        .get_with_count_in::<Row, _>(&*tx)
        .unwrap();
    assert_eq!(total, 20);

    tx.commit().unwrap();
    assert_eq!(count_users(&db), 20);
}

#[test]
fn test_same_thread_use_during_transaction() {
    let db = setup_db();

    let tx = db.transaction().unwrap();
    tx.execute("INSERT INTO users (id, name, age) VALUES (26, 'user26', 45)")
        .unwrap();

    // Plain statements on the handle run inside the open transaction
    let users: Vec<Row> = QueryBuilder::new("users").get(&db).unwrap();
    assert_eq!(users.len(), 26);

    let err = QueryBuilder::new("users")
        .get_with_count::<Row, _>(&db)
        .unwrap_err();
    assert!(matches!(err, DalError::Database(_)));

    tx.rollback().unwrap();
    assert_eq!(count_users(&db), 25);
}

#[test]
fn test_dropped_transaction_rolls_back() {
    let db = setup_db();

    {
        let tx = db.transaction().unwrap();
        tx.execute("DELETE FROM users").unwrap();
        assert_eq!(
            tx.query("SELECT COUNT(*) AS n FROM users").unwrap()[0]["n"],
            0
        );
    }

    assert_eq!(count_users(&db), 25);
}

#[test]
fn test_executor_reports_sqlite_dialect() {
    let db = setup_db();
    assert_eq!(db.dialect(), SqlDialect::Sqlite);

    let tx = db.transaction().unwrap();
    assert_eq!(tx.dialect(), SqlDialect::Sqlite);
}

// =============================================================================
// File Database Tests
// =============================================================================

#[test]
fn test_file_database_persists() {
    let temp = TempDir::new().unwrap();
    let config = DatabaseConfig {
        path: temp.path().join("app.db"),
        dialect: SqlDialect::Sqlite,
    };

    {
        let db = SqliteDatabase::from_config(&config).unwrap();
        db.execute_batch(
            "CREATE TABLE kv (k TEXT PRIMARY KEY, v TEXT);\
             INSERT INTO kv VALUES ('a', '1'), ('b', '2');",
        )
        .unwrap();
    }

    let db = SqliteDatabase::from_config(&config).unwrap();
    let (rows, total): (Vec<Row>, u64) = QueryBuilder::new("kv")
        .filter("k", "=", "b")
        .get_with_count(&db)
        .unwrap();

    assert_eq!(total, 1);
    assert_eq!(rows[0]["v"], "2");
}

#[test]
fn test_from_config_rejects_mysql() {
    let config = DatabaseConfig {
        path: ":memory:".into(),
        dialect: SqlDialect::MySql,
    };

    let err = SqliteDatabase::from_config(&config).err().unwrap();
    assert!(matches!(err, DalError::Config(_)));
}
