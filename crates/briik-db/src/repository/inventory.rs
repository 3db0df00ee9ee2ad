//! # Inventory Repository
//!
//! Deposits, supplier invoices, raw material and finished product stock.
//! Each family has `save_*` (upsert, confirmed id), a list and a delete.

use chrono::NaiveDate;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use briik_core::inventory::{Deposit, Inventory, ProductStock, RawStock, SupplierInvoice};
use briik_core::money::Money;

use super::{confirm_id, to_u32};
use crate::error::{DbError, DbResult};

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, FromRow)]
struct DepositRow {
    id: String,
    store_id: String,
    product_name: String,
    qty: i64,
    date: NaiveDate,
    notes: Option<String>,
}

impl TryFrom<DepositRow> for Deposit {
    type Error = DbError;

    fn try_from(row: DepositRow) -> DbResult<Self> {
        Ok(Deposit {
            id: row.id,
            store_id: row.store_id,
            product_name: row.product_name,
            qty: to_u32("deposits.qty", row.qty)?,
            date: row.date,
            notes: row.notes,
        })
    }
}

#[derive(Debug, FromRow)]
struct SupplierInvoiceRow {
    id: String,
    supplier_name: String,
    invoice_number: String,
    date: NaiveDate,
    amount_cents: i64,
    notes: Option<String>,
}

impl From<SupplierInvoiceRow> for SupplierInvoice {
    fn from(row: SupplierInvoiceRow) -> Self {
        SupplierInvoice {
            id: row.id,
            supplier_name: row.supplier_name,
            invoice_number: row.invoice_number,
            date: row.date,
            amount: Money::from_cents(row.amount_cents),
            notes: row.notes,
        }
    }
}

#[derive(Debug, FromRow)]
struct RawStockRow {
    id: String,
    item_name: String,
    qty: i64,
    unit: String,
    supplier_name: Option<String>,
}

impl TryFrom<RawStockRow> for RawStock {
    type Error = DbError;

    fn try_from(row: RawStockRow) -> DbResult<Self> {
        Ok(RawStock {
            id: row.id,
            item_name: row.item_name,
            qty: to_u32("raw_stock.qty", row.qty)?,
            unit: row.unit,
            supplier_name: row.supplier_name,
        })
    }
}

#[derive(Debug, FromRow)]
struct ProductStockRow {
    id: String,
    model_code: String,
    color_code: String,
    qty: i64,
}

impl TryFrom<ProductStockRow> for ProductStock {
    type Error = DbError;

    fn try_from(row: ProductStockRow) -> DbResult<Self> {
        Ok(ProductStock {
            id: row.id,
            model_code: row.model_code,
            color_code: row.color_code,
            qty: to_u32("product_stock.qty", row.qty)?,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for inventory records.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Every inventory record.
    pub async fn load(&self) -> DbResult<Inventory> {
        Ok(Inventory {
            deposits: self.deposits().await?,
            supplier_invoices: self.supplier_invoices().await?,
            raw_stock: self.raw_stock().await?,
            product_stock: self.product_stock().await?,
        })
    }

    // -------------------------------------------------------------------------
    // Deposits
    // -------------------------------------------------------------------------

    pub async fn deposits(&self) -> DbResult<Vec<Deposit>> {
        let rows: Vec<DepositRow> = sqlx::query_as(
            "SELECT id, store_id, product_name, qty, date, notes FROM deposits ORDER BY date, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Deposit::try_from).collect()
    }

    pub async fn save_deposit(&self, deposit: &Deposit) -> DbResult<Deposit> {
        let id = confirm_id(&deposit.id);
        debug!(id = %id, store_id = %deposit.store_id, "Saving deposit");

        sqlx::query(
            r#"
            INSERT INTO deposits (id, store_id, product_name, qty, date, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (id) DO UPDATE SET
                store_id = excluded.store_id,
                product_name = excluded.product_name,
                qty = excluded.qty,
                date = excluded.date,
                notes = excluded.notes
            "#,
        )
        .bind(&id)
        .bind(&deposit.store_id)
        .bind(&deposit.product_name)
        .bind(i64::from(deposit.qty))
        .bind(deposit.date)
        .bind(&deposit.notes)
        .execute(&self.pool)
        .await?;

        Ok(Deposit {
            id,
            ..deposit.clone()
        })
    }

    pub async fn delete_deposit(&self, id: &str) -> DbResult<()> {
        self.delete_from("deposits", "Deposit", id).await
    }

    // -------------------------------------------------------------------------
    // Supplier invoices
    // -------------------------------------------------------------------------

    pub async fn supplier_invoices(&self) -> DbResult<Vec<SupplierInvoice>> {
        let rows: Vec<SupplierInvoiceRow> = sqlx::query_as(
            r#"
            SELECT id, supplier_name, invoice_number, date, amount_cents, notes
            FROM supplier_invoices ORDER BY date, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SupplierInvoice::from).collect())
    }

    pub async fn save_supplier_invoice(&self, invoice: &SupplierInvoice) -> DbResult<SupplierInvoice> {
        let id = confirm_id(&invoice.id);
        debug!(id = %id, supplier = %invoice.supplier_name, "Saving supplier invoice");

        sqlx::query(
            r#"
            INSERT INTO supplier_invoices (id, supplier_name, invoice_number, date, amount_cents, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (id) DO UPDATE SET
                supplier_name = excluded.supplier_name,
                invoice_number = excluded.invoice_number,
                date = excluded.date,
                amount_cents = excluded.amount_cents,
                notes = excluded.notes
            "#,
        )
        .bind(&id)
        .bind(&invoice.supplier_name)
        .bind(&invoice.invoice_number)
        .bind(invoice.date)
        .bind(invoice.amount.cents())
        .bind(&invoice.notes)
        .execute(&self.pool)
        .await?;

        Ok(SupplierInvoice {
            id,
            ..invoice.clone()
        })
    }

    pub async fn delete_supplier_invoice(&self, id: &str) -> DbResult<()> {
        self.delete_from("supplier_invoices", "SupplierInvoice", id).await
    }

    // -------------------------------------------------------------------------
    // Raw material
    // -------------------------------------------------------------------------

    pub async fn raw_stock(&self) -> DbResult<Vec<RawStock>> {
        let rows: Vec<RawStockRow> = sqlx::query_as(
            "SELECT id, item_name, qty, unit, supplier_name FROM raw_stock ORDER BY item_name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RawStock::try_from).collect()
    }

    pub async fn save_raw_stock(&self, item: &RawStock) -> DbResult<RawStock> {
        let id = confirm_id(&item.id);
        debug!(id = %id, item = %item.item_name, "Saving raw stock");

        sqlx::query(
            r#"
            INSERT INTO raw_stock (id, item_name, qty, unit, supplier_name)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (id) DO UPDATE SET
                item_name = excluded.item_name,
                qty = excluded.qty,
                unit = excluded.unit,
                supplier_name = excluded.supplier_name
            "#,
        )
        .bind(&id)
        .bind(&item.item_name)
        .bind(i64::from(item.qty))
        .bind(&item.unit)
        .bind(&item.supplier_name)
        .execute(&self.pool)
        .await?;

        Ok(RawStock {
            id,
            ..item.clone()
        })
    }

    pub async fn delete_raw_stock(&self, id: &str) -> DbResult<()> {
        self.delete_from("raw_stock", "RawStock", id).await
    }

    // -------------------------------------------------------------------------
    // Finished product
    // -------------------------------------------------------------------------

    pub async fn product_stock(&self) -> DbResult<Vec<ProductStock>> {
        let rows: Vec<ProductStockRow> = sqlx::query_as(
            "SELECT id, model_code, color_code, qty FROM product_stock ORDER BY model_code, color_code",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProductStock::try_from).collect()
    }

    /// Upserts a stock record. A second record for the same model/color
    /// fails with [`DbError::UniqueViolation`].
    pub async fn save_product_stock(&self, stock: &ProductStock) -> DbResult<ProductStock> {
        let id = confirm_id(&stock.id);
        debug!(id = %id, model = %stock.model_code, color = %stock.color_code, "Saving product stock");

        sqlx::query(
            r#"
            INSERT INTO product_stock (id, model_code, color_code, qty)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (id) DO UPDATE SET
                model_code = excluded.model_code,
                color_code = excluded.color_code,
                qty = excluded.qty
            "#,
        )
        .bind(&id)
        .bind(&stock.model_code)
        .bind(&stock.color_code)
        .bind(i64::from(stock.qty))
        .execute(&self.pool)
        .await?;

        Ok(ProductStock {
            id,
            ..stock.clone()
        })
    }

    pub async fn delete_product_stock(&self, id: &str) -> DbResult<()> {
        self.delete_from("product_stock", "ProductStock", id).await
    }

    /// `table` is always one of the constants above, never caller input.
    async fn delete_from(&self, table: &str, entity: &str, id: &str) -> DbResult<()> {
        debug!(table, id = %id, "Deleting inventory record");

        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?1"))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(entity, id));
        }

        Ok(())
    }
}
