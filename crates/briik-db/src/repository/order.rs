//! # Order Repository
//!
//! Orders are stored with their lines; a save replaces the whole line set.
//!
//! ## Save Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    SELECT invoice_number            ← existence check                  │
//! │    INSERT orders / UPDATE orders    ← invoice_number never cleared     │
//! │    DELETE order_lines WHERE order_id                                   │
//! │    INSERT order_lines × n           ← position keeps line order        │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An invoice number already in storage wins over the one carried by the
//! record being saved: a stale copy of an order cannot un-invoice it.

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use briik_core::money::Money;
use briik_core::types::{Order, OrderLine};

use super::{confirm_id, to_u32};
use crate::error::{DbError, DbResult};

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    store_id: String,
    number: String,
    invoice_number: Option<String>,
    date: NaiveDate,
    status: String,
    shipping_policy: String,
    shipping_cost_cents: i64,
    free_from_pvd_cents: i64,
    notes: Option<String>,
    shipping_override: bool,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Order {
        Order {
            id: self.id,
            store_id: self.store_id,
            number: self.number,
            invoice_number: self.invoice_number,
            date: self.date,
            status: self.status,
            lines,
            shipping_policy: self.shipping_policy,
            shipping_cost: Money::from_cents(self.shipping_cost_cents),
            free_from_pvd: Money::from_cents(self.free_from_pvd_cents),
            notes: self.notes,
            shipping_override: self.shipping_override,
        }
    }
}

#[derive(Debug, FromRow)]
struct LineRow {
    id: String,
    order_id: String,
    line_type: String,
    model: String,
    color: String,
    name: String,
    qty: i64,
    sku: String,
    pvd_unit_cents: i64,
    pvp_unit_cents: i64,
}

impl TryFrom<LineRow> for OrderLine {
    type Error = DbError;

    fn try_from(row: LineRow) -> DbResult<Self> {
        Ok(OrderLine {
            id: row.id,
            line_type: row.line_type,
            model: row.model,
            color: row.color,
            name: row.name,
            qty: to_u32("order_lines.qty", row.qty)?,
            sku: row.sku,
            pvd_unit: Money::from_cents(row.pvd_unit_cents),
            pvp_unit: Money::from_cents(row.pvp_unit_cents),
        })
    }
}

const SELECT_ORDER: &str = r#"
    SELECT id, store_id, number, invoice_number, date, status,
           shipping_policy, shipping_cost_cents, free_from_pvd_cents,
           notes, shipping_override
    FROM orders
"#;

const SELECT_LINE: &str = r#"
    SELECT l.id, l.order_id, l.line_type, l.model, l.color, l.name,
           l.qty, l.sku, l.pvd_unit_cents, l.pvp_unit_cents
    FROM order_lines l
"#;

/// Repository for orders and their lines.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("{SELECT_ORDER} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines: Vec<LineRow> = sqlx::query_as(&format!(
            "{SELECT_LINE} WHERE l.order_id = ?1 ORDER BY l.position"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let lines = lines
            .into_iter()
            .map(OrderLine::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Some(row.into_order(lines)))
    }

    /// All orders with their lines, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> =
            sqlx::query_as(&format!("{SELECT_ORDER} ORDER BY date, number, id"))
                .fetch_all(&self.pool)
                .await?;

        let lines: Vec<LineRow> =
            sqlx::query_as(&format!("{SELECT_LINE} ORDER BY l.order_id, l.position"))
                .fetch_all(&self.pool)
                .await?;

        assemble(rows, lines)
    }

    /// Orders of one store with their lines, oldest first.
    pub async fn list_for_store(&self, store_id: &str) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{SELECT_ORDER} WHERE store_id = ?1 ORDER BY date, number, id"
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        let lines: Vec<LineRow> = sqlx::query_as(&format!(
            "{SELECT_LINE} JOIN orders o ON o.id = l.order_id \
             WHERE o.store_id = ?1 ORDER BY l.order_id, l.position"
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        assemble(rows, lines)
    }

    /// Inserts or updates `order` and replaces its lines. Returns the order
    /// as stored: confirmed order and line ids, stored invoice number.
    pub async fn save(&self, order: &Order) -> DbResult<Order> {
        let id = confirm_id(&order.id);
        let mut tx = self.pool.begin().await?;

        let existing: Option<Option<String>> =
            sqlx::query_scalar("SELECT invoice_number FROM orders WHERE id = ?1")
                .bind(&id)
                .fetch_optional(&mut *tx)
                .await?;

        debug!(
            id = %id,
            client_id = %order.id,
            number = %order.number,
            lines = order.lines.len(),
            exists = existing.is_some(),
            "Saving order"
        );

        let invoice_number = match &existing {
            Some(Some(stored)) => Some(stored.clone()),
            _ => order.invoice_number.clone(),
        };

        let sql = if existing.is_some() {
            r#"
            UPDATE orders SET
                store_id = ?2, number = ?3, invoice_number = ?4, date = ?5,
                status = ?6, shipping_policy = ?7, shipping_cost_cents = ?8,
                free_from_pvd_cents = ?9, notes = ?10, shipping_override = ?11,
                updated_at = datetime('now')
            WHERE id = ?1
            "#
        } else {
            r#"
            INSERT INTO orders (
                id, store_id, number, invoice_number, date,
                status, shipping_policy, shipping_cost_cents,
                free_from_pvd_cents, notes, shipping_override
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#
        };

        sqlx::query(sql)
            .bind(&id)
            .bind(&order.store_id)
            .bind(&order.number)
            .bind(&invoice_number)
            .bind(order.date)
            .bind(&order.status)
            .bind(&order.shipping_policy)
            .bind(order.shipping_cost.cents())
            .bind(order.free_from_pvd.cents())
            .bind(&order.notes)
            .bind(order.shipping_override)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM order_lines WHERE order_id = ?1")
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        let mut lines = Vec::with_capacity(order.lines.len());
        for (position, line) in order.lines.iter().enumerate() {
            let line = OrderLine {
                id: confirm_id(&line.id),
                ..line.clone()
            };

            sqlx::query(
                r#"
                INSERT INTO order_lines (
                    id, order_id, position, line_type, model, color, name,
                    qty, sku, pvd_unit_cents, pvp_unit_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(&line.id)
            .bind(&id)
            .bind(position as i64)
            .bind(&line.line_type)
            .bind(&line.model)
            .bind(&line.color)
            .bind(&line.name)
            .bind(i64::from(line.qty))
            .bind(&line.sku)
            .bind(line.pvd_unit.cents())
            .bind(line.pvp_unit.cents())
            .execute(&mut *tx)
            .await?;

            lines.push(line);
        }

        tx.commit().await?;

        Ok(Order {
            id,
            invoice_number,
            lines,
            ..order.clone()
        })
    }

    /// Stores `number` on an order that has none yet.
    ///
    /// ## Returns
    /// * `Ok(true)` - assigned
    /// * `Ok(false)` - the order already carries an invoice number
    /// * `Err(DbError::UniqueViolation)` - `number` belongs to another order
    /// * `Err(DbError::NotFound)` - no such order
    pub async fn assign_invoice_number(&self, order_id: &str, number: &str) -> DbResult<bool> {
        debug!(order_id = %order_id, number = %number, "Assigning invoice number");

        let result = sqlx::query(
            r#"
            UPDATE orders SET invoice_number = ?2, updated_at = datetime('now')
            WHERE id = ?1 AND invoice_number IS NULL
            "#,
        )
        .bind(order_id)
        .bind(number)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: number.to_string(),
            },
            other => other,
        })?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        match self.get_by_id(order_id).await? {
            Some(_) => Ok(false),
            None => Err(DbError::not_found("Order", order_id)),
        }
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting order");

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn assemble(rows: Vec<OrderRow>, lines: Vec<LineRow>) -> DbResult<Vec<Order>> {
    let mut by_order: HashMap<String, Vec<OrderLine>> = HashMap::new();
    for row in lines {
        let order_id = row.order_id.clone();
        by_order.entry(order_id).or_default().push(OrderLine::try_from(row)?);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let lines = by_order.remove(&row.id).unwrap_or_default();
            row.into_order(lines)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use briik_core::catalog::AppSettings;
    use briik_core::order::{add_line, new_order, update_line, LineEdit};
    use briik_core::types::{Order, Store};

    async fn setup() -> (Database, Store) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = db.stores().save(&Store::new("Kiosko Azul", "Cádiz")).await.unwrap();
        (db, store)
    }

    fn order_for(store: &Store, count: usize) -> Order {
        let settings = AppSettings::default();
        let date = NaiveDate::from_ymd_opt(2026, 10, 2).unwrap();
        let mut order = new_order(&store.id, &settings, count, date);
        let first = add_line(&mut order, &settings).unwrap();
        update_line(&mut order, &first, LineEdit::Qty(6), &settings).unwrap();
        let second = add_line(&mut order, &settings).unwrap();
        update_line(&mut order, &second, LineEdit::Name("Leo".into()), &settings).unwrap();
        order
    }

    #[tokio::test]
    async fn test_save_and_load_with_lines() {
        let (db, store) = setup().await;
        let order = order_for(&store, 0);

        let saved = db.orders().save(&order).await.unwrap();
        let loaded = db.orders().get_by_id(&saved.id).await.unwrap().unwrap();

        assert_eq!(loaded, saved);
        assert_eq!(loaded.lines.len(), 2);
        assert_eq!(loaded.lines[0].qty, 6);
        assert_eq!(loaded.lines[1].name, "Leo");
    }

    #[tokio::test]
    async fn test_resave_replaces_lines() {
        let (db, store) = setup().await;
        let mut order = db.orders().save(&order_for(&store, 0)).await.unwrap();

        order.lines.remove(0);
        order.notes = Some("solo uno".into());
        db.orders().save(&order).await.unwrap();

        let loaded = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(loaded.lines.len(), 1);
        assert_eq!(loaded.notes.as_deref(), Some("solo uno"));
        assert_eq!(db.orders().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_store_rejected() {
        let (db, _) = setup().await;
        let orphan = order_for(&Store::new("Nunca guardada", "Lugo"), 0);

        let err = db.orders().save(&orphan).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_store_delete_cascades() {
        let (db, store) = setup().await;
        db.orders().save(&order_for(&store, 0)).await.unwrap();
        db.orders().save(&order_for(&store, 1)).await.unwrap();
        assert_eq!(db.orders().list_for_store(&store.id).await.unwrap().len(), 2);

        db.stores().delete(&store.id).await.unwrap();
        assert_eq!(db.orders().count().await.unwrap(), 0);
        assert!(db.orders().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invoice_assigned_once() {
        let (db, store) = setup().await;
        let a = db.orders().save(&order_for(&store, 0)).await.unwrap();
        let b = db.orders().save(&order_for(&store, 1)).await.unwrap();

        assert!(db.orders().assign_invoice_number(&a.id, "INV-0001").await.unwrap());
        assert!(!db.orders().assign_invoice_number(&a.id, "INV-0002").await.unwrap());

        let err = db.orders().assign_invoice_number(&b.id, "INV-0001").await.unwrap_err();
        assert!(err.is_conflict());

        assert!(matches!(
            db.orders().assign_invoice_number("missing", "INV-0003").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_stale_save_keeps_invoice_number() {
        let (db, store) = setup().await;
        let stale = db.orders().save(&order_for(&store, 0)).await.unwrap();
        db.orders().assign_invoice_number(&stale.id, "INV-0007").await.unwrap();

        let saved = db.orders().save(&stale).await.unwrap();
        assert_eq!(saved.invoice_number.as_deref(), Some("INV-0007"));

        let loaded = db.orders().get_by_id(&stale.id).await.unwrap().unwrap();
        assert_eq!(loaded.invoice_number.as_deref(), Some("INV-0007"));
    }
}
