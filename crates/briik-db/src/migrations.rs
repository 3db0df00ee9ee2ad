//! # Schema Migrations
//!
//! `migrations/sqlite/*.sql` at the workspace root, embedded into the
//! binary and applied in file name order when a [`Database`](crate::Database)
//! opens.
//!
//! ```text
//! 001_initial_schema.sql   stores, orders, order_lines, app_settings,
//!                          deposits, supplier_invoices, raw_stock,
//!                          product_stock, unique invoice numbers
//! ```
//!
//! Applied files are checksummed by sqlx; change the schema with a new
//! file, never by editing an old one.

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever has not been applied yet.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (total, before) = migration_status(pool).await?;
    MIGRATOR.run(pool).await?;

    if before < total {
        info!(applied = total - before, total, "Schema migrated");
    } else {
        debug!(total, "Schema up to date");
    }
    Ok(())
}

/// `(embedded, applied)`. A fresh file has no bookkeeping table yet and
/// reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: Option<i64> =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
            .ok();

    let applied = applied.and_then(|n| usize::try_from(n).ok()).unwrap_or(0);
    Ok((MIGRATOR.iter().count(), applied))
}
