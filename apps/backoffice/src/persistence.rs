//! # Persistence Collaborator
//!
//! The workspace talks to storage only through [`Persistence`]. The SQLite
//! [`Database`] is the production implementation.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save_*(record)  ──► upsert by existence check                          │
//! │                  ◄── stored record, carrying the CONFIRMED id           │
//! │                      (may differ from the id that was sent)             │
//! │                                                                         │
//! │  delete_*(id)    ──► NotFound when nothing was deleted                  │
//! │                                                                         │
//! │  invoice counter ──► next_invoice_number()                              │
//! │                      compare_and_swap_invoice_counter(expected, next)   │
//! │                      assign_invoice_number(order, number)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;

use briik_core::inventory::Inventory;
use briik_core::{AppSettings, Order, Store};
use briik_db::{Database, DbResult};

/// Storage used by the [`Workspace`](crate::state::Workspace).
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn load_settings(&self) -> DbResult<Option<AppSettings>>;
    async fn save_settings(&self, settings: &AppSettings) -> DbResult<AppSettings>;

    async fn list_stores(&self) -> DbResult<Vec<Store>>;
    async fn save_store(&self, store: &Store) -> DbResult<Store>;
    async fn delete_store(&self, id: &str) -> DbResult<()>;

    async fn list_orders(&self) -> DbResult<Vec<Order>>;
    async fn get_order(&self, id: &str) -> DbResult<Option<Order>>;
    async fn save_order(&self, order: &Order) -> DbResult<Order>;
    async fn delete_order(&self, id: &str) -> DbResult<()>;

    async fn next_invoice_number(&self) -> DbResult<u32>;
    async fn compare_and_swap_invoice_counter(&self, expected: u32, next: u32) -> DbResult<bool>;

    /// `Ok(false)` when the order already carries an invoice number.
    async fn assign_invoice_number(&self, order_id: &str, number: &str) -> DbResult<bool>;

    async fn load_inventory(&self) -> DbResult<Inventory>;
}

#[async_trait]
impl Persistence for Database {
    async fn load_settings(&self) -> DbResult<Option<AppSettings>> {
        self.settings().load().await
    }

    async fn save_settings(&self, settings: &AppSettings) -> DbResult<AppSettings> {
        self.settings().save(settings).await
    }

    async fn list_stores(&self) -> DbResult<Vec<Store>> {
        self.stores().list().await
    }

    async fn save_store(&self, store: &Store) -> DbResult<Store> {
        self.stores().save(store).await
    }

    async fn delete_store(&self, id: &str) -> DbResult<()> {
        self.stores().delete(id).await
    }

    async fn list_orders(&self) -> DbResult<Vec<Order>> {
        self.orders().list().await
    }

    async fn get_order(&self, id: &str) -> DbResult<Option<Order>> {
        self.orders().get_by_id(id).await
    }

    async fn save_order(&self, order: &Order) -> DbResult<Order> {
        self.orders().save(order).await
    }

    async fn delete_order(&self, id: &str) -> DbResult<()> {
        self.orders().delete(id).await
    }

    async fn next_invoice_number(&self) -> DbResult<u32> {
        self.settings().next_invoice_number().await
    }

    async fn compare_and_swap_invoice_counter(&self, expected: u32, next: u32) -> DbResult<bool> {
        self.settings()
            .compare_and_swap_invoice_counter(expected, next)
            .await
    }

    async fn assign_invoice_number(&self, order_id: &str, number: &str) -> DbResult<bool> {
        self.orders().assign_invoice_number(order_id, number).await
    }

    async fn load_inventory(&self) -> DbResult<Inventory> {
        self.inventory().load().await
    }
}

// =============================================================================
// Test Double
// =============================================================================

/// In-memory database with switches for failing writes and for simulating
/// a second session that takes invoice numbers.
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use super::*;
    use briik_db::{DbConfig, DbError};

    pub struct FlakyDb {
        pub db: Database,
        fail_writes: AtomicBool,
        steal_invoice_numbers: AtomicU32,
    }

    impl FlakyDb {
        pub async fn new() -> Self {
            FlakyDb {
                db: Database::new(DbConfig::in_memory()).await.unwrap(),
                fail_writes: AtomicBool::new(false),
                steal_invoice_numbers: AtomicU32::new(0),
            }
        }

        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// The next `n` counter reads are each followed by another session
        /// moving the counter forward before our compare-and-swap.
        pub fn steal_invoice_numbers(&self, n: u32) {
            self.steal_invoice_numbers.store(n, Ordering::SeqCst);
        }

        fn check_write(&self) -> DbResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(DbError::ConnectionFailed("injected failure".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Persistence for FlakyDb {
        async fn load_settings(&self) -> DbResult<Option<AppSettings>> {
            self.db.load_settings().await
        }

        async fn save_settings(&self, settings: &AppSettings) -> DbResult<AppSettings> {
            self.check_write()?;
            self.db.save_settings(settings).await
        }

        async fn list_stores(&self) -> DbResult<Vec<Store>> {
            self.db.list_stores().await
        }

        async fn save_store(&self, store: &Store) -> DbResult<Store> {
            self.check_write()?;
            self.db.save_store(store).await
        }

        async fn delete_store(&self, id: &str) -> DbResult<()> {
            self.check_write()?;
            self.db.delete_store(id).await
        }

        async fn list_orders(&self) -> DbResult<Vec<Order>> {
            self.db.list_orders().await
        }

        async fn get_order(&self, id: &str) -> DbResult<Option<Order>> {
            self.db.get_order(id).await
        }

        async fn save_order(&self, order: &Order) -> DbResult<Order> {
            self.check_write()?;
            self.db.save_order(order).await
        }

        async fn delete_order(&self, id: &str) -> DbResult<()> {
            self.check_write()?;
            self.db.delete_order(id).await
        }

        async fn next_invoice_number(&self) -> DbResult<u32> {
            let current = self.db.next_invoice_number().await?;

            let pending = self.steal_invoice_numbers.load(Ordering::SeqCst);
            if pending > 0 {
                self.steal_invoice_numbers.store(pending - 1, Ordering::SeqCst);
                self.db
                    .compare_and_swap_invoice_counter(current, current + 1)
                    .await?;
            }

            Ok(current)
        }

        async fn compare_and_swap_invoice_counter(&self, expected: u32, next: u32) -> DbResult<bool> {
            self.check_write()?;
            self.db.compare_and_swap_invoice_counter(expected, next).await
        }

        async fn assign_invoice_number(&self, order_id: &str, number: &str) -> DbResult<bool> {
            self.check_write()?;
            self.db.assign_invoice_number(order_id, number).await
        }

        async fn load_inventory(&self) -> DbResult<Inventory> {
            self.db.load_inventory().await
        }
    }
}
