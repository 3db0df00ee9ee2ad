//! # Domain Types
//!
//! Stores, orders and order lines.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Store       │   │      Order      │   │   OrderLine     │       │
//! │  │  ─────────────  │◄──│  ─────────────  │──►│  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  name, city     │   │  store_id (FK)  │   │  line_type (FK) │       │
//! │  │  requires_re    │   │  number         │   │  model, color   │       │
//! │  └─────────────────┘   │  invoice_number │   │  qty, sku       │       │
//! │                        │  shipping snap. │   │  pvd/pvp unit   │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: generated locally (UUID v4), possibly replaced by the id the
//!   persistence layer confirms on first save
//! - Business key: `order.number` ("PED-0001"), stable and human-readable
//!
//! Foreign keys into the catalog (`line_type`, `model`, `color`, `status`)
//! are plain strings. Dangling values are tolerated and flagged by
//! [`crate::validation`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::AppSettings;
use crate::money::Money;

/// Generates a fresh local identifier (UUID v4).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// True when `id` looks like an identifier the persistence layer accepts.
pub fn is_confirmed_id(id: &str) -> bool {
    uuid::Uuid::parse_str(id).is_ok()
}

// =============================================================================
// Store
// =============================================================================

/// A retail point that places orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: String,
    pub name: String,
    pub city: String,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub nif: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub instagram: Option<String>,
    pub notes: Option<String>,

    /// Store is subject to recargo de equivalencia on invoices.
    #[serde(rename = "requiresRE", default)]
    pub requires_re: bool,
}

impl Store {
    /// Creates a store with a fresh local id and no optional fields.
    pub fn new(name: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            city: city.into(),
            address: None,
            postal_code: None,
            province: None,
            country: None,
            nif: None,
            contact: None,
            email: None,
            phone: None,
            instagram: None,
            notes: None,
            requires_re: false,
        }
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// One priced row of an order.
///
/// `sku` is a cache of [`crate::sku::generate_sku`] over
/// (line_type, model, color, name). Prices are seeded from the line type
/// when the line is created and are never re-read from the catalog after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: String,

    /// `LineType.code_type` this line belongs to.
    #[serde(rename = "type")]
    pub line_type: String,

    /// Model code (empty when not set).
    pub model: String,

    /// Color code (empty when not set).
    pub color: String,

    /// Personalised name (empty when not set).
    pub name: String,

    pub qty: u32,
    pub sku: String,

    #[serde(rename = "pvdUnit")]
    pub pvd_unit: Money,

    #[serde(rename = "pvpUnit")]
    pub pvp_unit: Money,
}

impl OrderLine {
    /// `qty * pvd_unit`.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.pvd_unit.multiply_quantity(self.qty)
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order placed by a store.
///
/// `shipping_cost` and `free_from_pvd` are snapshots of the rules at the
/// time the order was created. Later rule edits do not reprice it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub store_id: String,

    /// Human reference, e.g. `PED-0007`.
    pub number: String,

    /// Set at most once by invoice issuance.
    pub invoice_number: Option<String>,

    #[ts(as = "String")]
    pub date: NaiveDate,

    /// Expected to match a `Status.name`; unknown values render as-is.
    pub status: String,

    pub lines: Vec<OrderLine>,
    pub shipping_policy: String,
    pub shipping_cost: Money,

    #[serde(rename = "freeFromPVD")]
    pub free_from_pvd: Money,

    pub notes: Option<String>,

    /// Manual shipping waiver, independent of the threshold.
    #[serde(default)]
    pub shipping_override: bool,
}

impl Order {
    pub fn line(&self, line_id: &str) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    pub fn line_mut(&mut self, line_id: &str) -> Option<&mut OrderLine> {
        self.lines.iter_mut().find(|l| l.id == line_id)
    }

    /// True once an invoice number has been issued.
    pub fn is_invoiced(&self) -> bool {
        self.invoice_number
            .as_deref()
            .is_some_and(|n| !n.is_empty())
    }
}

// =============================================================================
// App Data
// =============================================================================

/// The complete application state: catalog plus every store and order.
///
/// This is the unit the XML codec exports and imports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    pub settings: AppSettings,
    pub stores: Vec<Store>,
    pub orders: Vec<Order>,
}

impl AppData {
    pub fn store(&self, id: &str) -> Option<&Store> {
        self.stores.iter().find(|s| s.id == id)
    }

    pub fn order(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    /// Looks an order up by its human number (`PED-0003`).
    pub fn order_by_number(&self, number: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.number == number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_is_confirmable() {
        let id = new_id();
        assert!(is_confirmed_id(&id));
        assert!(!is_confirmed_id("tmp-123"));
        assert_ne!(new_id(), id);
    }

    #[test]
    fn test_line_subtotal() {
        let line = OrderLine {
            id: new_id(),
            line_type: "GEN".to_string(),
            model: "B01".to_string(),
            color: "MINT".to_string(),
            name: String::new(),
            qty: 4,
            sku: "BRIIK-GEN-B01-MINT".to_string(),
            pvd_unit: Money::from_cents(640),
            pvp_unit: Money::from_cents(1390),
        };
        assert_eq!(line.subtotal().cents(), 2560);
    }

    #[test]
    fn test_store_serializes_re_flag() {
        let mut store = Store::new("Juguetes Luna", "Valencia");
        store.requires_re = true;
        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json["requiresRE"], true);
        assert_eq!(json["postalCode"], serde_json::Value::Null);
    }

    #[test]
    fn test_order_line_type_renamed() {
        let json = serde_json::json!({
            "id": "l1", "type": "PER", "model": "B01", "color": "MINT",
            "name": "Ana", "qty": 2, "sku": "X", "pvdUnit": 790, "pvpUnit": 1690
        });
        let line: OrderLine = serde_json::from_value(json).unwrap();
        assert_eq!(line.line_type, "PER");
        assert_eq!(line.pvd_unit.cents(), 790);
    }
}
