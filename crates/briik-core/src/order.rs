//! # Order Editing
//!
//! Creating, editing and cloning orders while keeping the cached SKUs
//! consistent.
//!
//! ## Line Edit Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Edit            SKU recomputed   Prices re-seeded   Notes              │
//! │  ─────────────   ──────────────   ────────────────   ─────────────────  │
//! │  LineType        yes              yes (known type)   from type defaults │
//! │  Model / Color   yes              no                                    │
//! │  Name            yes              no                                    │
//! │  Qty             no               no                 clamped to >= 1    │
//! │  PvdUnit/PvpUnit no               no                 manual override    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::AppSettings;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::sku::generate_sku;
use crate::types::{new_id, Order, OrderLine};

/// Prefix of human order numbers.
pub const ORDER_NUMBER_PREFIX: &str = "PED-";

/// Shipping policy written on new orders.
pub const DEFAULT_SHIPPING_POLICY: &str = "Península";

/// `PED-` followed by `n` zero-padded to four digits.
pub fn order_number(n: usize) -> String {
    format!("{ORDER_NUMBER_PREFIX}{n:04}")
}

// =============================================================================
// Creation
// =============================================================================

/// Creates an empty order for `store_id`.
///
/// The order number derives from how many orders already exist. Shipping
/// terms are a snapshot of the current rules.
pub fn new_order(
    store_id: &str,
    settings: &AppSettings,
    existing_order_count: usize,
    date: NaiveDate,
) -> Order {
    Order {
        id: new_id(),
        store_id: store_id.to_string(),
        number: order_number(existing_order_count + 1),
        invoice_number: None,
        date,
        status: settings.initial_status().to_string(),
        lines: Vec::new(),
        shipping_policy: DEFAULT_SHIPPING_POLICY.to_string(),
        shipping_cost: settings.rules.shipping_cost,
        free_from_pvd: settings.rules.free_from_pvd,
        notes: None,
        shipping_override: false,
    }
}

/// Creates a line of the first line type with the first model and color.
///
/// ## Errors
/// [`CoreError::EmptyCatalog`] when no line type is configured.
pub fn new_line(settings: &AppSettings) -> CoreResult<OrderLine> {
    let lt = settings.line_types.first().ok_or(CoreError::EmptyCatalog)?;

    let mut line = OrderLine {
        id: new_id(),
        line_type: lt.code_type.clone(),
        model: settings.models.first().map(|m| m.code.clone()).unwrap_or_default(),
        color: settings.colors.first().map(|c| c.code.clone()).unwrap_or_default(),
        name: String::new(),
        qty: 1,
        sku: String::new(),
        pvd_unit: lt.default_pvd_unit,
        pvp_unit: lt.default_pvp_unit,
    };
    line.sku = generate_sku(&line, settings);
    Ok(line)
}

/// Appends a new line to `order` and returns its id.
pub fn add_line(order: &mut Order, settings: &AppSettings) -> CoreResult<String> {
    let line = new_line(settings)?;
    let id = line.id.clone();
    order.lines.push(line);
    Ok(id)
}

/// Removes a line from `order`.
pub fn remove_line(order: &mut Order, line_id: &str) -> CoreResult<OrderLine> {
    let pos = order
        .lines
        .iter()
        .position(|l| l.id == line_id)
        .ok_or_else(|| CoreError::LineNotFound {
            order_id: order.id.clone(),
            line_id: line_id.to_string(),
        })?;
    Ok(order.lines.remove(pos))
}

// =============================================================================
// Editing
// =============================================================================

/// A single field change on a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum LineEdit {
    LineType(String),
    Model(String),
    Color(String),
    Name(String),
    Qty(u32),
    PvdUnit(Money),
    PvpUnit(Money),
}

impl LineEdit {
    /// True when the edit touches an input of the SKU.
    pub fn affects_sku(&self) -> bool {
        matches!(
            self,
            LineEdit::LineType(_) | LineEdit::Model(_) | LineEdit::Color(_) | LineEdit::Name(_)
        )
    }
}

/// Applies `edit` to `line` and refreshes what depends on it.
pub fn apply_line_edit(line: &mut OrderLine, edit: LineEdit, settings: &AppSettings) {
    let refresh_sku = edit.affects_sku();

    match edit {
        LineEdit::LineType(code) => {
            if let Some(lt) = settings.line_type(&code) {
                line.pvd_unit = lt.default_pvd_unit;
                line.pvp_unit = lt.default_pvp_unit;
            }
            line.line_type = code;
        }
        LineEdit::Model(code) => line.model = code,
        LineEdit::Color(code) => line.color = code,
        LineEdit::Name(name) => line.name = name,
        LineEdit::Qty(qty) => line.qty = qty.max(1),
        LineEdit::PvdUnit(price) => line.pvd_unit = price,
        LineEdit::PvpUnit(price) => line.pvp_unit = price,
    }

    if refresh_sku {
        line.sku = generate_sku(line, settings);
    }
}

/// Applies `edit` to the line `line_id` of `order`.
pub fn update_line(
    order: &mut Order,
    line_id: &str,
    edit: LineEdit,
    settings: &AppSettings,
) -> CoreResult<()> {
    let order_id = order.id.clone();
    let line = order
        .line_mut(line_id)
        .ok_or_else(|| CoreError::LineNotFound {
            order_id,
            line_id: line_id.to_string(),
        })?;
    apply_line_edit(line, edit, settings);
    Ok(())
}

/// Re-derives every cached SKU of `order`.
pub fn refresh_skus(order: &mut Order, settings: &AppSettings) {
    for line in &mut order.lines {
        line.sku = generate_sku(line, settings);
    }
}

// =============================================================================
// Cloning
// =============================================================================

/// Copies `order` as a brand-new order.
///
/// New order and line ids, next order number, the given date and the
/// initial status. The invoice number is never copied.
pub fn clone_order(
    order: &Order,
    settings: &AppSettings,
    existing_order_count: usize,
    date: NaiveDate,
) -> Order {
    let mut copy = order.clone();
    copy.id = new_id();
    copy.number = order_number(existing_order_count + 1);
    copy.date = date;
    copy.status = settings.initial_status().to_string();
    copy.invoice_number = None;
    for line in &mut copy.lines {
        line.id = new_id();
    }
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Rules;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_new_order_snapshots_rules() {
        let mut settings = AppSettings::default();
        settings.rules = Rules {
            shipping_cost: Money::from_cents(990),
            ..Rules::default()
        };

        let order = new_order("s1", &settings, 6, today());
        assert_eq!(order.number, "PED-0007");
        assert_eq!(order.status, "Borrador");
        assert_eq!(order.shipping_policy, "Península");
        assert_eq!(order.shipping_cost.cents(), 990);
        assert_eq!(order.free_from_pvd.cents(), 5000);

        // later rule edits do not touch the order
        settings.rules.shipping_cost = Money::from_cents(100);
        assert_eq!(order.shipping_cost.cents(), 990);
    }

    #[test]
    fn test_new_line_defaults() {
        let settings = AppSettings::default();
        let line = new_line(&settings).unwrap();
        assert_eq!(line.line_type, "GEN");
        assert_eq!(line.model, "B01");
        assert_eq!(line.color, "MINT");
        assert_eq!(line.qty, 1);
        assert_eq!(line.sku, "BRIIK-GEN-B01-MINT");
        assert_eq!(line.pvd_unit.cents(), 640);
    }

    #[test]
    fn test_new_line_needs_catalog() {
        let mut settings = AppSettings::default();
        settings.line_types.clear();
        assert!(matches!(new_line(&settings), Err(CoreError::EmptyCatalog)));
    }

    #[test]
    fn test_type_change_reseeds_and_rederives() {
        let settings = AppSettings::default();
        let mut order = new_order("s1", &settings, 0, today());
        let id = add_line(&mut order, &settings).unwrap();

        update_line(&mut order, &id, LineEdit::PvdUnit(Money::from_cents(500)), &settings).unwrap();
        update_line(&mut order, &id, LineEdit::LineType("PER".to_string()), &settings).unwrap();
        update_line(&mut order, &id, LineEdit::Name("luCAS".to_string()), &settings).unwrap();

        let line = order.line(&id).unwrap();
        assert_eq!(line.pvd_unit.cents(), 790);
        assert_eq!(line.pvp_unit.cents(), 1690);
        assert_eq!(line.sku, "BRIIK-PER-B01-MINT-LUCAS");
    }

    #[test]
    fn test_unknown_type_keeps_prices() {
        let settings = AppSettings::default();
        let mut line = new_line(&settings).unwrap();
        apply_line_edit(&mut line, LineEdit::LineType("GONE".to_string()), &settings);
        assert_eq!(line.pvd_unit.cents(), 640);
        assert_eq!(line.sku, "UNKNOWN");
    }

    #[test]
    fn test_qty_clamped() {
        let settings = AppSettings::default();
        let mut line = new_line(&settings).unwrap();
        apply_line_edit(&mut line, LineEdit::Qty(0), &settings);
        assert_eq!(line.qty, 1);
        apply_line_edit(&mut line, LineEdit::Qty(12), &settings);
        assert_eq!(line.qty, 12);
    }

    #[test]
    fn test_update_missing_line() {
        let settings = AppSettings::default();
        let mut order = new_order("s1", &settings, 0, today());
        let err = update_line(&mut order, "nope", LineEdit::Qty(2), &settings).unwrap_err();
        assert!(matches!(err, CoreError::LineNotFound { .. }));
        assert!(remove_line(&mut order, "nope").is_err());
    }

    #[test]
    fn test_clone_order() {
        let settings = AppSettings::default();
        let mut original = new_order("s1", &settings, 0, today());
        add_line(&mut original, &settings).unwrap();
        add_line(&mut original, &settings).unwrap();
        original.status = "Enviado".to_string();
        original.invoice_number = Some("INV-2026-0001".to_string());

        let later = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
        let copy = clone_order(&original, &settings, 4, later);

        assert_ne!(copy.id, original.id);
        assert_eq!(copy.number, "PED-0005");
        assert_eq!(copy.date, later);
        assert_eq!(copy.status, "Borrador");
        assert_eq!(copy.invoice_number, None);
        assert_eq!(copy.lines.len(), 2);
        for (a, b) in copy.lines.iter().zip(&original.lines) {
            assert_ne!(a.id, b.id);
            assert_eq!(a.sku, b.sku);
        }
    }

    #[test]
    fn test_refresh_skus_after_catalog_change() {
        let mut settings = AppSettings::default();
        let mut order = new_order("s1", &settings, 0, today());
        add_line(&mut order, &settings).unwrap();

        settings.line_types[0].sku_prefix = "BK-G".to_string();
        refresh_skus(&mut order, &settings);
        assert_eq!(order.lines[0].sku, "BK-G-B01-MINT");
    }

    #[test]
    fn test_line_edit_wire_format() {
        let edit: LineEdit = serde_json::from_str(r#"{"field":"qty","value":3}"#).unwrap();
        assert_eq!(edit, LineEdit::Qty(3));
    }
}
