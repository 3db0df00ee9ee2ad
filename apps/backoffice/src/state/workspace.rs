//! # Workspace
//!
//! The in-memory copy of the back office data, kept in step with storage
//! through an optimistic two-phase commit.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Optimistic Write                                     │
//! │                                                                         │
//! │  1. validate (hard errors only, advisories never block)                 │
//! │  2. apply locally            record ─► Pending (temp id for new ones)   │
//! │  3. persist                  Persistence::save_*                        │
//! │                                                                         │
//! │     ok ──► remap temp id ─► confirmed id                                │
//! │            (orders.store_id, Selection) and mark Confirmed              │
//! │                                                                         │
//! │     err ─► roll back: new record removed, edited record restored        │
//! │            error returned to the caller                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Import and Sync
//! An XML import replaces everything local with Pending records and
//! schedules deletions for records that are not in the document.
//! [`Workspace::sync_pending`] pushes deletions, settings, stores and then
//! orders, carrying on past failures and reporting them.
//!
//! ## Invoice Numbers
//! ```text
//! loop up to invoice_retry_limit:
//!     n = next_invoice_number()                  (storage)
//!     number = issue_invoice_number(order, n)    (pure)
//!     CAS(n → n+1)          ✗ ──► retry
//!     assign(order, number) ✗ taken by another order ──► retry
//!                           ✗ order already invoiced ──► reload, done
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use briik_core::analytics::{dashboard_stats, DashboardStats};
use briik_core::directory::{orders_for_store, prepare_new_store, search_stores};
use briik_core::document::{prepare_document, PreparedDocument};
use briik_core::inventory::Inventory;
use briik_core::invoice::{issue_invoice_number, InvoiceIssue};
use briik_core::order::{self as ops, LineEdit};
use briik_core::pricing::{document_totals, order_totals, OrderTotals, TaxBreakdown};
use briik_core::validation::{
    order_advisories, validate_order, validate_settings, validate_store, Advisory,
};
use briik_core::{new_id, AppData, AppSettings, CoreError, CoreResult, DocumentKind, Order, Store};
use briik_db::DbError;
use briik_xml::{export_to_xml, import_from_xml};

use super::tracked::{find, position, RecordState, Selection, Tracked};
use crate::error::{ApiError, ApiResult};
use crate::persistence::Persistence;

/// A deletion scheduled by an import, applied by the next sync.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Deletion {
    Store(String),
    Order(String),
}

/// What an import changed locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub settings_replaced: bool,
    pub stores: usize,
    pub orders: usize,
    pub scheduled_deletions: usize,
}

/// Outcome of [`Workspace::sync_pending`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub deleted: usize,
    pub settings_saved: bool,
    pub stores_saved: usize,
    pub orders_saved: usize,
    /// One message per record left pending.
    pub failures: Vec<String>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Local state of one back office session.
pub struct Workspace {
    persistence: Arc<dyn Persistence>,
    invoice_retry_limit: u32,
    settings: Tracked<AppSettings>,
    stores: Vec<Tracked<Store>>,
    orders: Vec<Tracked<Order>>,
    selection: Selection,
    deletions: Vec<Deletion>,
}

impl Workspace {
    /// Reads everything from storage. A database without settings gets the
    /// default catalog.
    pub async fn load(persistence: Arc<dyn Persistence>, invoice_retry_limit: u32) -> ApiResult<Self> {
        let settings = match persistence.load_settings().await? {
            Some(settings) => settings,
            None => {
                info!("No settings stored, seeding the default catalog");
                persistence.save_settings(&AppSettings::default()).await?
            }
        };
        let stores = persistence.list_stores().await?;
        let orders = persistence.list_orders().await?;

        info!(stores = stores.len(), orders = orders.len(), "Workspace loaded");

        Ok(Workspace {
            persistence,
            invoice_retry_limit: invoice_retry_limit.max(1),
            settings: Tracked::confirmed(settings),
            stores: stores.into_iter().map(Tracked::confirmed).collect(),
            orders: orders.into_iter().map(Tracked::confirmed).collect(),
            selection: Selection::default(),
            deletions: Vec::new(),
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn settings(&self) -> &AppSettings {
        &self.settings.record
    }

    pub fn stores(&self) -> impl Iterator<Item = &Store> {
        self.stores.iter().map(|t| &t.record)
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().map(|t| &t.record)
    }

    pub fn store(&self, id: &str) -> Option<&Store> {
        find(&self.stores, id).map(|t| &t.record)
    }

    pub fn order(&self, id: &str) -> Option<&Order> {
        find(&self.orders, id).map(|t| &t.record)
    }

    pub fn order_by_number(&self, number: &str) -> Option<&Order> {
        self.orders().find(|o| o.number == number)
    }

    pub fn store_state(&self, id: &str) -> Option<RecordState> {
        find(&self.stores, id).map(|t| t.state)
    }

    pub fn order_state(&self, id: &str) -> Option<RecordState> {
        find(&self.orders, id).map(|t| t.state)
    }

    pub fn settings_state(&self) -> RecordState {
        self.settings.state
    }

    /// Records and deletions not yet in storage.
    pub fn pending_count(&self) -> usize {
        let settings = usize::from(self.settings.is_pending());
        let stores = self.stores.iter().filter(|t| t.is_pending()).count();
        let orders = self.orders.iter().filter(|t| t.is_pending()).count();
        settings + stores + orders + self.deletions.len()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Stores whose name or city contains `term`, sorted by name.
    pub fn search_stores(&self, term: &str) -> Vec<Store> {
        let stores = self.store_records();
        search_stores(&stores, term).into_iter().cloned().collect()
    }

    /// Orders of `store_id`, newest number first.
    pub fn orders_for_store(&self, store_id: &str) -> Vec<Order> {
        let orders = self.order_records();
        orders_for_store(&orders, store_id).into_iter().cloned().collect()
    }

    /// Snapshot of everything, as exported.
    pub fn app_data(&self) -> AppData {
        AppData {
            settings: self.settings.record.clone(),
            stores: self.store_records(),
            orders: self.order_records(),
        }
    }

    pub fn export_xml(&self) -> ApiResult<String> {
        Ok(export_to_xml(&self.app_data())?)
    }

    pub fn order_totals(&self, order_id: &str) -> ApiResult<OrderTotals> {
        let order = self.require_order(order_id)?;
        Ok(order_totals(order, &self.settings.record.line_types))
    }

    /// VAT and RE (when the store requires it) on top of the order total.
    pub fn tax_breakdown(&self, order_id: &str) -> ApiResult<TaxBreakdown> {
        let order = self.require_order(order_id)?;
        let store = self.store(&order.store_id);
        Ok(document_totals(
            order,
            store,
            &self.settings.record.billing,
            DocumentKind::Invoice,
        ))
    }

    pub fn advisories(&self, order_id: &str) -> ApiResult<Vec<Advisory>> {
        let order = self.require_order(order_id)?;
        Ok(order_advisories(order, &self.settings.record))
    }

    /// Renderer input for an invoice or delivery note.
    pub fn document(&self, order_id: &str, kind: DocumentKind) -> ApiResult<PreparedDocument> {
        let order = self.require_order(order_id)?;
        let store = self
            .store(&order.store_id)
            .ok_or_else(|| CoreError::StoreNotFound(order.store_id.clone()))?;
        Ok(prepare_document(order, store, &self.settings.record.billing, kind)?)
    }

    /// Deposits, supplier invoices and stock, read straight from storage.
    pub async fn inventory(&self) -> ApiResult<Inventory> {
        Ok(self.persistence.load_inventory().await?)
    }

    pub fn dashboard(&self) -> DashboardStats {
        dashboard_stats(
            &self.order_records(),
            &self.store_records(),
            &self.settings.record,
        )
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn select_store(&mut self, store_id: Option<&str>) -> ApiResult<()> {
        if let Some(id) = store_id {
            if self.store(id).is_none() {
                return Err(CoreError::StoreNotFound(id.to_string()).into());
            }
        }
        self.selection.store_id = store_id.map(str::to_string);
        self.selection.order_id = None;
        Ok(())
    }

    /// Selects an order and its store.
    pub fn select_order(&mut self, order_id: Option<&str>) -> ApiResult<()> {
        match order_id {
            Some(id) => {
                let store_id = self.require_order(id)?.store_id.clone();
                self.selection.store_id = Some(store_id);
                self.selection.order_id = Some(id.to_string());
            }
            None => self.selection.order_id = None,
        }
        Ok(())
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Replaces the catalog and billing settings.
    ///
    /// Every settings problem is reported at once. The invoice counter in
    /// storage never moves back.
    pub async fn update_settings(&mut self, settings: AppSettings) -> ApiResult<()> {
        let issues = validate_settings(&settings);
        if !issues.is_empty() {
            let message = issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ApiError::validation(message));
        }

        let previous = std::mem::replace(&mut self.settings, Tracked::pending(settings.clone()));
        match self.persistence.save_settings(&settings).await {
            Ok(stored) => {
                self.settings.confirm(stored);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Saving settings failed, rolling back");
                self.settings = previous;
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Stores
    // =========================================================================

    /// Creates a store and returns its confirmed id.
    pub async fn create_store(&mut self, store: Store) -> ApiResult<String> {
        let mut store = prepare_new_store(store);
        validate_store(&store)?;
        if store.id.is_empty() || self.store(&store.id).is_some() {
            store.id = new_id();
        }

        let local_id = store.id.clone();
        self.stores.push(Tracked::pending(store.clone()));

        match self.persistence.save_store(&store).await {
            Ok(stored) => {
                let id = stored.id.clone();
                self.confirm_store(&local_id, stored);
                debug!(id = %id, "Store created");
                Ok(id)
            }
            Err(e) => {
                warn!(error = %e, "Creating store failed, rolling back");
                self.stores.retain(|t| t.record.id != local_id);
                Err(e.into())
            }
        }
    }

    pub async fn update_store(&mut self, store: Store) -> ApiResult<()> {
        let pos = position(&self.stores, &store.id)
            .ok_or_else(|| CoreError::StoreNotFound(store.id.clone()))?;
        validate_store(&store)?;

        let previous = std::mem::replace(&mut self.stores[pos], Tracked::pending(store.clone()));
        match self.persistence.save_store(&store).await {
            Ok(stored) => {
                self.confirm_store(&store.id, stored);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, id = %store.id, "Updating store failed, rolling back");
                self.stores[pos] = previous;
                Err(e.into())
            }
        }
    }

    /// Deletes a store with all of its orders.
    pub async fn delete_store(&mut self, store_id: &str) -> ApiResult<()> {
        let pos = position(&self.stores, store_id)
            .ok_or_else(|| CoreError::StoreNotFound(store_id.to_string()))?;

        let previous_orders = self.orders.clone();
        let removed = self.stores.remove(pos);
        let removed_order_ids: Vec<String> = self
            .orders
            .iter()
            .filter(|t| t.record.store_id == store_id)
            .map(|t| t.record.id.clone())
            .collect();
        self.orders.retain(|t| t.record.store_id != store_id);

        match self.persistence.delete_store(store_id).await {
            Ok(()) => {}
            Err(DbError::NotFound { .. }) if removed.is_pending() => {}
            Err(e) => {
                warn!(error = %e, id = %store_id, "Deleting store failed, rolling back");
                self.stores.insert(pos, removed);
                self.orders = previous_orders;
                return Err(e.into());
            }
        }

        self.selection.forget(Some(store_id), &removed_order_ids);
        debug!(id = %store_id, orders = removed_order_ids.len(), "Store deleted");
        Ok(())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Creates an empty order for `store_id` and returns its confirmed id.
    pub async fn create_order(&mut self, store_id: &str, date: NaiveDate) -> ApiResult<String> {
        let store_id = self.ensure_store_saved(store_id).await?;
        let order = ops::new_order(&store_id, &self.settings.record, self.orders.len(), date);
        self.insert_order(order).await
    }

    /// Copies an order under a new number, without its invoice number.
    pub async fn clone_order(&mut self, order_id: &str, date: NaiveDate) -> ApiResult<String> {
        let source = self.require_order(order_id)?.clone();
        let store_id = self.ensure_store_saved(&source.store_id).await?;

        let mut copy = ops::clone_order(&source, &self.settings.record, self.orders.len(), date);
        copy.store_id = store_id;
        self.insert_order(copy).await
    }

    /// Saves a full order as edited by the caller. Cached SKUs are derived
    /// again and the invoice number cannot be changed this way.
    pub async fn save_order(&mut self, mut order: Order) -> ApiResult<String> {
        order.invoice_number = self.require_order(&order.id)?.invoice_number.clone();
        ops::refresh_skus(&mut order, &self.settings.record);

        let order_id = order.id.clone();
        self.persist_order(&order_id, order).await
    }

    /// Appends a line seeded from the catalog and returns its id.
    pub async fn add_line(&mut self, order_id: &str) -> ApiResult<String> {
        self.edit_order(order_id, |order, settings| ops::add_line(order, settings))
            .await
    }

    pub async fn update_line(&mut self, order_id: &str, line_id: &str, edit: LineEdit) -> ApiResult<()> {
        self.edit_order(order_id, |order, settings| {
            ops::update_line(order, line_id, edit, settings)
        })
        .await
    }

    pub async fn remove_line(&mut self, order_id: &str, line_id: &str) -> ApiResult<()> {
        self.edit_order(order_id, |order, _| ops::remove_line(order, line_id).map(|_| ()))
            .await
    }

    pub async fn set_status(&mut self, order_id: &str, status: &str) -> ApiResult<()> {
        self.edit_order(order_id, |order, _| {
            order.status = status.to_string();
            Ok(())
        })
        .await
    }

    /// Waives shipping regardless of the order amount.
    pub async fn set_shipping_override(&mut self, order_id: &str, waived: bool) -> ApiResult<()> {
        self.edit_order(order_id, |order, _| {
            order.shipping_override = waived;
            Ok(())
        })
        .await
    }

    pub async fn set_notes(&mut self, order_id: &str, notes: Option<String>) -> ApiResult<()> {
        self.edit_order(order_id, |order, _| {
            order.notes = notes.filter(|n| !n.trim().is_empty());
            Ok(())
        })
        .await
    }

    pub async fn delete_order(&mut self, order_id: &str) -> ApiResult<()> {
        let pos = position(&self.orders, order_id)
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        let removed = self.orders.remove(pos);

        match self.persistence.delete_order(order_id).await {
            Ok(()) => {}
            Err(DbError::NotFound { .. }) if removed.is_pending() => {}
            Err(e) => {
                warn!(error = %e, id = %order_id, "Deleting order failed, rolling back");
                self.orders.insert(pos, removed);
                return Err(e.into());
            }
        }

        self.selection.forget(None, &[order_id.to_string()]);
        Ok(())
    }

    // =========================================================================
    // Invoices
    // =========================================================================

    /// Gives the order an invoice number, or returns the one it has.
    ///
    /// ## Errors
    /// [`ErrorCode::Conflict`](crate::error::ErrorCode::Conflict) when other
    /// sessions kept taking the counter for `invoice_retry_limit` attempts.
    pub async fn issue_invoice(&mut self, order_id: &str) -> ApiResult<InvoiceIssue> {
        let tracked = find(&self.orders, order_id)
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        if let Some(number) = tracked.record.invoice_number.clone().filter(|n| !n.is_empty()) {
            return Ok(InvoiceIssue::AlreadyIssued { number });
        }

        // storage must know the order before a number can be attached to it
        let order_id = if tracked.is_pending() {
            let draft = tracked.record.clone();
            self.persist_order(order_id, draft).await?
        } else {
            order_id.to_string()
        };

        for attempt in 1..=self.invoice_retry_limit {
            let counter = self.persistence.next_invoice_number().await?;

            let mut billing = self.settings.record.billing.clone();
            billing.next_invoice_number = counter;

            let order = self.require_order(&order_id)?;
            let (number, advanced) = match issue_invoice_number(order, &billing) {
                InvoiceIssue::Issued { number, billing } => (number, billing),
                already => return Ok(already),
            };

            let swapped = match self
                .persistence
                .compare_and_swap_invoice_counter(counter, advanced.next_invoice_number)
                .await
            {
                Ok(swapped) => swapped,
                Err(DbError::Locked) => false,
                Err(e) => return Err(e.into()),
            };
            if !swapped {
                debug!(attempt, counter, "Invoice counter moved, retrying");
                continue;
            }
            self.settings.record.billing.next_invoice_number = advanced.next_invoice_number;

            match self.persistence.assign_invoice_number(&order_id, &number).await {
                Ok(true) => {
                    if let Some(pos) = position(&self.orders, &order_id) {
                        self.orders[pos].record.invoice_number = Some(number.clone());
                    }
                    info!(order_id = %order_id, number = %number, "Invoice issued");
                    return Ok(InvoiceIssue::Issued {
                        number,
                        billing: advanced,
                    });
                }
                Ok(false) => return self.adopt_stored_invoice(&order_id).await,
                Err(e) if e.is_conflict() => {
                    warn!(attempt, number = %number, error = %e, "Invoice number not assigned, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ApiError::conflict(format!(
            "Could not reserve an invoice number after {} attempts",
            self.invoice_retry_limit
        )))
    }

    /// Another session invoiced the order first: take its number.
    async fn adopt_stored_invoice(&mut self, order_id: &str) -> ApiResult<InvoiceIssue> {
        let stored = self
            .persistence
            .get_order(order_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Order", order_id))?;
        let number = stored
            .invoice_number
            .clone()
            .ok_or_else(|| ApiError::internal("Order lost its invoice number"))?;

        info!(order_id = %order_id, number = %number, "Order was invoiced by another session");
        self.confirm_order(order_id, stored);
        Ok(InvoiceIssue::AlreadyIssued { number })
    }

    // =========================================================================
    // Import / Sync
    // =========================================================================

    /// Replaces local state with the content of a BRIIKData document.
    ///
    /// Nothing changes when the document cannot be read. Imported records
    /// stay Pending until [`sync_pending`](Self::sync_pending).
    pub fn import_xml(&mut self, xml: &str, today: NaiveDate) -> ApiResult<ImportSummary> {
        let imported = import_from_xml(xml, today)?;

        let store_ids: HashSet<&str> = imported.stores.iter().map(|s| s.id.as_str()).collect();
        let order_ids: HashSet<&str> = imported.orders.iter().map(|o| o.id.as_str()).collect();

        self.deletions.retain(|d| match d {
            Deletion::Store(id) => !store_ids.contains(id.as_str()),
            Deletion::Order(id) => !order_ids.contains(id.as_str()),
        });
        for t in &self.orders {
            if !order_ids.contains(t.record.id.as_str()) {
                self.deletions.push(Deletion::Order(t.record.id.clone()));
            }
        }
        for t in &self.stores {
            if !store_ids.contains(t.record.id.as_str()) {
                self.deletions.push(Deletion::Store(t.record.id.clone()));
            }
        }

        let settings_replaced = imported.settings.is_some();
        let data = imported.into_app_data(self.settings.record.clone());
        if settings_replaced {
            let mut settings = data.settings;
            let current = self.settings.record.billing.next_invoice_number;
            settings.billing.next_invoice_number = settings.billing.next_invoice_number.max(current);
            self.settings = Tracked::pending(settings);
        }

        let summary = ImportSummary {
            settings_replaced,
            stores: data.stores.len(),
            orders: data.orders.len(),
            scheduled_deletions: self.deletions.len(),
        };

        self.stores = data.stores.into_iter().map(Tracked::pending).collect();
        self.orders = data.orders.into_iter().map(Tracked::pending).collect();
        self.selection = Selection::default();

        info!(
            stores = summary.stores,
            orders = summary.orders,
            deletions = summary.scheduled_deletions,
            "Imported BRIIKData document"
        );
        Ok(summary)
    }

    /// Pushes every pending change to storage.
    ///
    /// Order: scheduled deletions, settings, stores (remapping the store ids
    /// of orders), orders. A failed record stays Pending and is reported.
    pub async fn sync_pending(&mut self) -> SyncReport {
        let mut report = SyncReport::default();

        self.sync_deletions(&mut report).await;

        if self.settings.is_pending() {
            match self.persistence.save_settings(&self.settings.record).await {
                Ok(stored) => {
                    self.settings.confirm(stored);
                    report.settings_saved = true;
                }
                Err(e) => report.failures.push(format!("settings: {e}")),
            }
        }

        let pending_stores: Vec<Store> = self
            .stores
            .iter()
            .filter(|t| t.is_pending())
            .map(|t| t.record.clone())
            .collect();
        for store in pending_stores {
            match self.persistence.save_store(&store).await {
                Ok(stored) => {
                    self.confirm_store(&store.id, stored);
                    report.stores_saved += 1;
                }
                Err(e) => report.failures.push(format!("store {}: {e}", store.name)),
            }
        }

        let pending_orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|t| t.is_pending())
            .map(|t| t.record.clone())
            .collect();
        for order in pending_orders {
            match self.store_state(&order.store_id) {
                Some(RecordState::Confirmed) => {}
                _ => {
                    report
                        .failures
                        .push(format!("order {}: store is not saved", order.number));
                    continue;
                }
            }
            match self.persistence.save_order(&order).await {
                Ok(stored) => {
                    self.confirm_order(&order.id, stored);
                    report.orders_saved += 1;
                }
                Err(e) => report.failures.push(format!("order {}: {e}", order.number)),
            }
        }

        info!(
            deleted = report.deleted,
            stores = report.stores_saved,
            orders = report.orders_saved,
            failures = report.failures.len(),
            "Synced pending changes"
        );
        report
    }

    async fn sync_deletions(&mut self, report: &mut SyncReport) {
        let deletions = std::mem::take(&mut self.deletions);
        let (orders, stores): (Vec<_>, Vec<_>) = deletions
            .into_iter()
            .partition(|d| matches!(d, Deletion::Order(_)));

        for deletion in orders.into_iter().chain(stores) {
            let result = match &deletion {
                Deletion::Order(id) => self.persistence.delete_order(id).await,
                Deletion::Store(id) => self.persistence.delete_store(id).await,
            };
            match result {
                Ok(()) => report.deleted += 1,
                // already gone, e.g. removed together with its store
                Err(DbError::NotFound { .. }) => {}
                Err(e) => {
                    report.failures.push(format!("delete {deletion:?}: {e}"));
                    self.deletions.push(deletion);
                }
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn store_records(&self) -> Vec<Store> {
        self.stores().cloned().collect()
    }

    fn order_records(&self) -> Vec<Order> {
        self.orders().cloned().collect()
    }

    fn require_order(&self, order_id: &str) -> CoreResult<&Order> {
        self.order(order_id)
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))
    }

    /// Saves a Pending store (from an import) so orders can reference it.
    async fn ensure_store_saved(&mut self, store_id: &str) -> ApiResult<String> {
        let tracked = find(&self.stores, store_id)
            .ok_or_else(|| CoreError::StoreNotFound(store_id.to_string()))?;
        if !tracked.is_pending() {
            return Ok(store_id.to_string());
        }

        let store = tracked.record.clone();
        let stored = self.persistence.save_store(&store).await?;
        let id = stored.id.clone();
        self.confirm_store(store_id, stored);
        Ok(id)
    }

    async fn insert_order(&mut self, order: Order) -> ApiResult<String> {
        let local_id = order.id.clone();
        self.orders.push(Tracked::pending(order.clone()));

        match self.persistence.save_order(&order).await {
            Ok(stored) => {
                let id = stored.id.clone();
                self.confirm_order(&local_id, stored);
                debug!(id = %id, number = %order.number, "Order created");
                Ok(id)
            }
            Err(e) => {
                warn!(error = %e, number = %order.number, "Creating order failed, rolling back");
                self.orders.retain(|t| t.record.id != local_id);
                Err(e.into())
            }
        }
    }

    /// Applies `edit` to a copy of the order, then persists the copy.
    async fn edit_order<T>(
        &mut self,
        order_id: &str,
        edit: impl FnOnce(&mut Order, &AppSettings) -> CoreResult<T>,
    ) -> ApiResult<T> {
        let mut draft = self.require_order(order_id)?.clone();
        let invoice_number = draft.invoice_number.clone();

        let out = edit(&mut draft, &self.settings.record)?;
        draft.id = order_id.to_string();
        draft.invoice_number = invoice_number;

        self.persist_order(order_id, draft).await?;
        Ok(out)
    }

    /// Validates and saves `draft` over the order `order_id`, rolling back
    /// on failure. Returns the confirmed id.
    async fn persist_order(&mut self, order_id: &str, mut draft: Order) -> ApiResult<String> {
        validate_order(&draft, &self.store_records())?;
        let store_id = self.ensure_store_saved(&draft.store_id).await?;
        draft.store_id = store_id;

        let pos = position(&self.orders, order_id)
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        let previous = std::mem::replace(&mut self.orders[pos], Tracked::pending(draft.clone()));

        match self.persistence.save_order(&draft).await {
            Ok(stored) => {
                let id = stored.id.clone();
                self.confirm_order(order_id, stored);
                Ok(id)
            }
            Err(e) => {
                warn!(error = %e, id = %order_id, "Saving order failed, rolling back");
                self.orders[pos] = previous;
                Err(e.into())
            }
        }
    }

    fn confirm_store(&mut self, local_id: &str, stored: Store) {
        if stored.id != local_id {
            debug!(from = %local_id, to = %stored.id, "Remapping store id");
            for t in &mut self.orders {
                if t.record.store_id == local_id {
                    t.record.store_id = stored.id.clone();
                }
            }
            self.selection.remap_store(local_id, &stored.id);
        }
        if let Some(pos) = position(&self.stores, local_id) {
            self.stores[pos].confirm(stored);
        }
    }

    fn confirm_order(&mut self, local_id: &str, stored: Order) {
        if stored.id != local_id {
            debug!(from = %local_id, to = %stored.id, "Remapping order id");
            self.selection.remap_order(local_id, &stored.id);
        }
        if let Some(pos) = position(&self.orders, local_id) {
            self.orders[pos].confirm(stored);
        }
    }
}
