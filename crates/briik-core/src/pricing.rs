//! # Line & Order Pricing
//!
//! Totals are always recomputed from lines; they are never stored.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lines ──► Σ qty × pvd_unit ──► subtotal                                │
//! │                                    │                                    │
//! │        shipping_override ──┐       ▼                                    │
//! │                            ├──► free? ──► shipping (0 or order snapshot)│
//! │  subtotal >= free_from_pvd ┘       │                                    │
//! │                                    ▼                                    │
//! │                     tax base = subtotal + shipping                      │
//! │                                    │                                    │
//! │            ┌───────────────────────┴───────────────────┐               │
//! │            ▼                                           ▼               │
//! │   Delivery note: total = base          Invoice: base + VAT (+ RE)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The shipping snapshot (`order.shipping_cost`, `order.free_from_pvd`) is
//! read from the order, never from the current rules.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::{BillingInfo, LineType};
use crate::money::{Money, TaxRate};
use crate::types::{Order, Store};

// =============================================================================
// Document Kind
// =============================================================================

/// Which document a total is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Taxed document.
    Invoice,
    /// Untaxed packing document.
    DeliveryNote,
}

// =============================================================================
// Aggregates
// =============================================================================

/// `qty * pvd_unit` of every line, summed.
pub fn order_subtotal(order: &Order) -> Money {
    order.lines.iter().map(|l| l.subtotal()).sum()
}

/// Σ qty over all lines.
pub fn real_units(order: &Order) -> u64 {
    order.lines.iter().map(|l| l.qty as u64).sum()
}

/// Σ qty × line-type weight. Unknown types weigh 1.
pub fn equivalence_units(order: &Order, line_types: &[LineType]) -> u64 {
    order
        .lines
        .iter()
        .map(|line| {
            let weight = line_types
                .iter()
                .find(|lt| lt.code_type == line.line_type)
                .map(LineType::weight)
                .unwrap_or(1);
            line.qty as u64 * weight as u64
        })
        .sum()
}

// =============================================================================
// Shipping
// =============================================================================

/// Shipping is waived by the manual override or once the subtotal reaches
/// the order's threshold (inclusive).
pub fn is_free_shipping(order: &Order) -> bool {
    order.shipping_override || order_subtotal(order) >= order.free_from_pvd
}

/// Shipping actually charged for the order.
pub fn shipping_cost(order: &Order) -> Money {
    if is_free_shipping(order) {
        Money::zero()
    } else {
        order.shipping_cost
    }
}

/// Subtotal plus charged shipping.
pub fn order_total(order: &Order) -> Money {
    order_subtotal(order) + shipping_cost(order)
}

// =============================================================================
// Totals
// =============================================================================

/// Untaxed totals of an order, as shown in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping: Money,
    pub free_shipping: bool,
    pub total: Money,
    pub real_units: u64,
    pub equivalence_units: u64,
}

pub fn order_totals(order: &Order, line_types: &[LineType]) -> OrderTotals {
    let subtotal = order_subtotal(order);
    let shipping = shipping_cost(order);
    OrderTotals {
        subtotal,
        shipping,
        free_shipping: is_free_shipping(order),
        total: subtotal + shipping,
        real_units: real_units(order),
        equivalence_units: equivalence_units(order, line_types),
    }
}

/// One tax row (rate and resulting amount).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxLine {
    pub rate: TaxRate,
    pub amount: Money,
}

/// Tax computation for a document.
///
/// For delivery notes `vat` and `re` are `None` and `total == tax_base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax_base: Money,
    pub vat: Option<TaxLine>,
    pub re: Option<TaxLine>,
    pub total: Money,
}

impl TaxBreakdown {
    pub fn vat_amount(&self) -> Money {
        self.vat.map(|t| t.amount).unwrap_or_default()
    }

    pub fn re_amount(&self) -> Money {
        self.re.map(|t| t.amount).unwrap_or_default()
    }
}

/// Tax over an arbitrary base.
///
/// VAT always applies; RE only when `requires_re`.
pub fn invoice_tax(tax_base: Money, billing: &BillingInfo, requires_re: bool) -> (TaxLine, Option<TaxLine>) {
    let vat = TaxLine {
        rate: billing.vat_rate,
        amount: tax_base.percentage(billing.vat_rate),
    };
    let re = requires_re.then(|| TaxLine {
        rate: billing.re_rate,
        amount: tax_base.percentage(billing.re_rate),
    });
    (vat, re)
}

/// Full breakdown of what a document for `order` charges.
///
/// ## Example
/// ```rust
/// use briik_core::catalog::BillingInfo;
/// use briik_core::pricing::{document_totals, DocumentKind};
/// # use briik_core::types::{Order, Store};
/// # use briik_core::money::Money;
/// # let mut store = Store::new("Tienda", "Bilbao");
/// # store.requires_re = true;
/// # let order = Order {
/// #     id: "o".into(), store_id: store.id.clone(), number: "PED-0001".into(),
/// #     invoice_number: None, date: chrono::NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
/// #     status: "Borrador".into(), lines: vec![], shipping_policy: "Península".into(),
/// #     shipping_cost: Money::from_cents(10000), free_from_pvd: Money::from_cents(50000),
/// #     notes: None, shipping_override: false,
/// # };
/// let totals = document_totals(&order, Some(&store), &BillingInfo::default(), DocumentKind::Invoice);
/// assert_eq!(totals.total.cents(), 12620);
/// ```
pub fn document_totals(
    order: &Order,
    store: Option<&Store>,
    billing: &BillingInfo,
    kind: DocumentKind,
) -> TaxBreakdown {
    let subtotal = order_subtotal(order);
    let shipping = shipping_cost(order);
    let tax_base = subtotal + shipping;

    match kind {
        DocumentKind::DeliveryNote => TaxBreakdown {
            subtotal,
            shipping,
            tax_base,
            vat: None,
            re: None,
            total: tax_base,
        },
        DocumentKind::Invoice => {
            let requires_re = store.is_some_and(|s| s.requires_re);
            let (vat, re) = invoice_tax(tax_base, billing, requires_re);
            let re_amount = re.map(|t| t.amount).unwrap_or_default();
            TaxBreakdown {
                subtotal,
                shipping,
                tax_base,
                vat: Some(vat),
                re,
                total: tax_base + vat.amount + re_amount,
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AppSettings;
    use crate::types::OrderLine;
    use chrono::NaiveDate;

    fn line(line_type: &str, qty: u32, pvd_cents: i64) -> OrderLine {
        OrderLine {
            id: crate::types::new_id(),
            line_type: line_type.to_string(),
            model: "B01".to_string(),
            color: "MINT".to_string(),
            name: String::new(),
            qty,
            sku: String::new(),
            pvd_unit: Money::from_cents(pvd_cents),
            pvp_unit: Money::zero(),
        }
    }

    fn order(lines: Vec<OrderLine>) -> Order {
        Order {
            id: "o1".to_string(),
            store_id: "s1".to_string(),
            number: "PED-0001".to_string(),
            invoice_number: None,
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            status: "Borrador".to_string(),
            lines,
            shipping_policy: "Península".to_string(),
            shipping_cost: Money::from_cents(750),
            free_from_pvd: Money::from_cents(5000),
            notes: None,
            shipping_override: false,
        }
    }

    #[test]
    fn test_subtotal_and_units() {
        let settings = AppSettings::default();
        let o = order(vec![line("GEN", 3, 640), line("PACK3_GEN", 2, 1920)]);

        assert_eq!(order_subtotal(&o).cents(), 3 * 640 + 2 * 1920);
        assert_eq!(real_units(&o), 5);
        assert_eq!(equivalence_units(&o, &settings.line_types), 3 + 6);
    }

    #[test]
    fn test_unknown_type_weighs_one() {
        let o = order(vec![line("MYSTERY", 4, 100)]);
        assert_eq!(equivalence_units(&o, &AppSettings::default().line_types), 4);
    }

    #[test]
    fn test_moq_scenario_units() {
        let o = order(vec![line("GEN", 3, 640)]);
        assert_eq!(real_units(&o), 3);
        assert_eq!(equivalence_units(&o, &AppSettings::default().line_types), 3);
    }

    #[test]
    fn test_shipping_charged_below_threshold() {
        // 45€ subtotal, threshold 50€, shipping 7.50€
        let o = order(vec![line("GEN", 1, 4500)]);
        assert!(!is_free_shipping(&o));
        assert_eq!(shipping_cost(&o).cents(), 750);
        assert_eq!(order_total(&o).cents(), 5250);
    }

    #[test]
    fn test_shipping_override_waives() {
        let mut o = order(vec![line("GEN", 1, 4500)]);
        o.shipping_override = true;
        assert_eq!(shipping_cost(&o), Money::zero());
        assert_eq!(order_total(&o).cents(), 4500);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let o = order(vec![line("GEN", 1, 5000)]);
        assert!(is_free_shipping(&o));
        assert_eq!(order_total(&o).cents(), 5000);

        let o = order(vec![line("GEN", 1, 4999)]);
        assert!(!is_free_shipping(&o));
    }

    #[test]
    fn test_order_totals_bundle() {
        let settings = AppSettings::default();
        let totals = order_totals(&order(vec![line("GEN", 1, 4500)]), &settings.line_types);
        assert_eq!(totals.subtotal.cents(), 4500);
        assert_eq!(totals.shipping.cents(), 750);
        assert!(!totals.free_shipping);
        assert_eq!(totals.total.cents(), 5250);
    }

    #[test]
    fn test_invoice_with_re() {
        // tax base 100€ = 100€ of lines, shipping waived
        let mut store = Store::new("Tienda", "Sevilla");
        store.requires_re = true;
        let o = order(vec![line("GEN", 10, 1000)]);

        let t = document_totals(&o, Some(&store), &BillingInfo::default(), DocumentKind::Invoice);
        assert_eq!(t.tax_base.cents(), 10000);
        assert_eq!(t.vat_amount().cents(), 2100);
        assert_eq!(t.re_amount().cents(), 520);
        assert_eq!(t.total.cents(), 12620);
    }

    #[test]
    fn test_invoice_without_re() {
        let store = Store::new("Tienda", "Sevilla");
        let o = order(vec![line("GEN", 10, 1000)]);

        let t = document_totals(&o, Some(&store), &BillingInfo::default(), DocumentKind::Invoice);
        assert!(t.re.is_none());
        assert_eq!(t.total.cents(), 12100);
    }

    #[test]
    fn test_delivery_note_is_untaxed() {
        let mut store = Store::new("Tienda", "Sevilla");
        store.requires_re = true;
        let o = order(vec![line("GEN", 1, 4500)]);

        let t = document_totals(&o, Some(&store), &BillingInfo::default(), DocumentKind::DeliveryNote);
        assert!(t.vat.is_none());
        assert!(t.re.is_none());
        assert_eq!(t.total.cents(), 5250);
    }
}
