//! # Database Handle
//!
//! Opens the SQLite file shared by every back office session on a machine
//! and hands out repositories.
//!
//! ## Sessions Sharing One File
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   briik session A                 briik session B                       │
//! │   Database (pool)                 Database (pool)                       │
//! │        │                                │                               │
//! │        └──────────┐          ┌──────────┘                               │
//! │                   ▼          ▼                                          │
//! │              ┌────────────────────────┐                                 │
//! │              │  briik.db  (WAL)       │  one writer at a time           │
//! │              │  app_settings.next_... │  ◄── CAS: UPDATE … WHERE n = ?  │
//! │              │  orders.invoice_number │  ◄── UNIQUE                     │
//! │              └────────────────────────┘                                 │
//! │                                                                         │
//! │   A writer that finds the file locked waits up to `busy_timeout`        │
//! │   instead of failing with SQLITE_BUSY.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Foreign keys are switched on for every connection (SQLite leaves them
//! off), so deleting a store removes its orders and their lines.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::inventory::InventoryRepository;
use crate::repository::order::OrderRepository;
use crate::repository::settings::SettingsRepository;
use crate::repository::store::StoreRepository;

const IN_MEMORY: &str = ":memory:";

/// Where the data lives and how the pool behaves.
///
/// ```rust,ignore
/// let config = DbConfig::new(data_dir.join("briik.db")).busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,

    /// Default: 4. A CLI session rarely needs more than one.
    pub max_connections: u32,

    /// How long a write waits for another session's lock.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// The file and its parent directory are created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// A private database that disappears with the pool (tests).
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            // every connection would otherwise see its own empty database
            max_connections: 1,
            busy_timeout: Duration::from_secs(1),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
        };

        Ok(options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            .foreign_keys(true))
    }
}

/// Handle to the back office database. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        if !config.is_in_memory() {
            if let Some(dir) = config.database_path.parent().filter(|d| !d.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| DbError::ConnectionFailed(format!("{}: {e}", dir.display())))?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(
            max_connections = config.max_connections,
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Pool ready"
        );

        let db = Database { pool };
        if config.run_migrations {
            migrations::run_migrations(&db.pool).await?;
        }
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn stores(&self) -> StoreRepository {
        StoreRepository::new(self.pool.clone())
    }

    /// Orders with their lines, and invoice number assignment.
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    /// Settings row and the invoice counter.
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.pool.clone())
    }

    /// Waits for open connections to finish. Repository calls fail afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Database closed");
    }
}
