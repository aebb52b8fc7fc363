//! # dalkit
//!
//! A data-access layer for backend services:
//! - Typed cache over a string-keyed store (values encoded to text or JSON)
//! - Distributed locks built on set-if-absent, with polling acquire
//! - Raw SQL query builder with paged fetch and total-count retrieval
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────┐    ┌──────────────────────────────┐
//! │     Cache      DistLock      │    │         QueryBuilder         │
//! │  (typed ops)  (NX + polling) │    │  (clauses → Statement)       │
//! └──────┬──────────────┬────────┘    └──────────────┬───────────────┘
//!        │              │                            │
//!        ▼              │                            ▼
//! ┌─────────────┐       │                   ┌─────────────────┐
//! │ Value Codec │       │                   │ Executor / Tx   │
//! └──────┬──────┘       │                   │   (Database)    │
//!        ▼              ▼                   └────────┬────────┘
//! ┌──────────────────────────────┐                   ▼
//! │          KvBackend           │          ┌─────────────────┐
//! │   (Memory | Redis)           │          │ SqliteDatabase  │
//! └──────────────────────────────┘          └─────────────────┘
//! ```
//!
//! Backends and databases are injected as shared handles; nothing in the
//! crate holds a process-wide client.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod backend;
pub mod cache;
pub mod lock;
pub mod sql;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DalError, Result};
pub use config::{Config, Mode};
pub use backend::{KvBackend, MemoryBackend};
pub use cache::Cache;
pub use lock::{DistributedLock, LockOptions};
pub use sql::{QueryBuilder, SqlDialect, SqliteDatabase, Statement};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of dalkit
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
