//! # briik-db: Database Layer for the BRIIK Back Office
//!
//! SQLite storage behind async repositories (sqlx).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BRIIK Data Flow                                  │
//! │                                                                         │
//! │  Workspace (apps/backoffice) ── Persistence trait                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     briik-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ StoreRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo      │    │ 001_init.sql │  │   │
//! │  │   │               │    │ SettingsRepo   │    │              │  │   │
//! │  │   │               │    │ InventoryRepo  │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (platform data dir)/briik.db                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use briik_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("briik.db")).await?;
//! let store = db.stores().save(&Store::new("Kiosko", "Cádiz")).await?;
//! let orders = db.orders().list_for_store(&store.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::inventory::InventoryRepository;
pub use repository::order::OrderRepository;
pub use repository::settings::SettingsRepository;
pub use repository::store::StoreRepository;
