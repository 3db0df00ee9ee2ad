//! # Dashboard Analytics
//!
//! Aggregates over all orders for the dashboard. Every figure is derived
//! from the same pricing functions the editor uses, so the dashboard and
//! the documents never disagree.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::catalog::AppSettings;
use crate::money::Money;
use crate::pricing::order_total;
use crate::types::{Order, Store};

/// Label used for orders whose store no longer exists.
pub const DELETED_STORE_LABEL: &str = "Tienda Eliminada";

/// How many entries the "top" rankings keep.
pub const TOP_N: usize = 5;

/// A labelled value in a ranking or distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Ranked<T> {
    pub label: String,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePoint {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Sum of order totals, shipping included.
    #[serde(rename = "totalPVD")]
    pub total_pvd: Money,
    pub total_orders: usize,
    pub total_equivalence_units: u64,
    pub active_stores: usize,
    pub top_stores: Vec<Ranked<Money>>,
    /// Ascending by date.
    pub revenue_timeline: Vec<RevenuePoint>,
    /// Units per line-type label, in first-seen order.
    pub type_distribution: Vec<Ranked<u64>>,
    pub top_models: Vec<Ranked<u64>>,
    pub top_colors: Vec<Ranked<u64>>,
}

/// Accumulator that keeps first-seen order of labels.
#[derive(Default)]
struct Tally<T> {
    entries: Vec<Ranked<T>>,
}

impl<T: Copy + std::ops::AddAssign + Ord> Tally<T> {
    fn add(&mut self, label: &str, value: T) {
        match self.entries.iter_mut().find(|e| e.label == label) {
            Some(entry) => entry.value += value,
            None => self.entries.push(Ranked {
                label: label.to_string(),
                value,
            }),
        }
    }

    /// Highest values first; ties keep first-seen order.
    fn top(mut self, n: usize) -> Vec<Ranked<T>> {
        self.entries.sort_by(|a, b| b.value.cmp(&a.value));
        self.entries.truncate(n);
        self.entries
    }
}

pub fn dashboard_stats(orders: &[Order], stores: &[Store], settings: &AppSettings) -> DashboardStats {
    let mut total_pvd = Money::zero();
    let mut total_equiv = 0u64;
    let mut by_store: Tally<Money> = Tally::default();
    let mut by_date: BTreeMap<NaiveDate, Money> = BTreeMap::new();
    let mut by_type: Tally<u64> = Tally::default();
    let mut by_model: Tally<u64> = Tally::default();
    let mut by_color: Tally<u64> = Tally::default();

    for order in orders {
        let store_name = stores
            .iter()
            .find(|s| s.id == order.store_id)
            .map(|s| s.name.as_str())
            .unwrap_or(DELETED_STORE_LABEL);

        let total = order_total(order);
        total_pvd += total;
        by_store.add(store_name, total);
        *by_date.entry(order.date).or_default() += total;

        for line in &order.lines {
            let qty = line.qty as u64;
            let line_type = settings.line_type(&line.line_type);

            total_equiv += qty * line_type.map(|lt| lt.weight()).unwrap_or(1) as u64;
            by_type.add(
                line_type
                    .map(|lt| lt.label.as_str())
                    .unwrap_or(line.line_type.as_str()),
                qty,
            );

            if !line.model.is_empty() {
                by_model.add(settings.model_name(&line.model), qty);
            }
            if !line.color.is_empty() {
                by_color.add(settings.color_name(&line.color), qty);
            }
        }
    }

    DashboardStats {
        total_pvd,
        total_orders: orders.len(),
        total_equivalence_units: total_equiv,
        active_stores: stores.len(),
        top_stores: by_store.top(TOP_N),
        revenue_timeline: by_date
            .into_iter()
            .map(|(date, revenue)| RevenuePoint { date, revenue })
            .collect(),
        type_distribution: by_type.entries,
        top_models: by_model.top(TOP_N),
        top_colors: by_color.top(TOP_N),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderLine;

    fn line(line_type: &str, model: &str, color: &str, qty: u32, pvd: i64) -> OrderLine {
        OrderLine {
            id: crate::types::new_id(),
            line_type: line_type.to_string(),
            model: model.to_string(),
            color: color.to_string(),
            name: String::new(),
            qty,
            sku: String::new(),
            pvd_unit: Money::from_cents(pvd),
            pvp_unit: Money::zero(),
        }
    }

    fn order(store_id: &str, day: u32, lines: Vec<OrderLine>) -> Order {
        Order {
            id: crate::types::new_id(),
            store_id: store_id.to_string(),
            number: format!("PED-{day:04}"),
            invoice_number: None,
            date: NaiveDate::from_ymd_opt(2026, 6, day).unwrap(),
            status: "Confirmado".to_string(),
            lines,
            shipping_policy: "Península".to_string(),
            shipping_cost: Money::from_cents(750),
            free_from_pvd: Money::from_cents(5000),
            notes: None,
            shipping_override: false,
        }
    }

    #[test]
    fn test_dashboard_aggregates() {
        let settings = AppSettings::default();
        let luna = Store::new("Luna", "Madrid");
        let sol = Store::new("Sol", "Cádiz");

        let orders = vec![
            // 60€, free shipping
            order(&luna.id, 3, vec![line("GEN", "B01", "MINT", 6, 1000)]),
            // 20€ + 7.50€ shipping
            order(&sol.id, 1, vec![line("PACK3_GEN", "", "", 1, 2000)]),
            // store gone: 10€ + 7.50€
            order("gone", 3, vec![line("GEN", "B02", "MINT", 1, 1000)]),
        ];

        let stats = dashboard_stats(&orders, &[luna, sol], &settings);

        assert_eq!(stats.total_pvd.cents(), 6000 + 2750 + 1750);
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.active_stores, 2);
        assert_eq!(stats.total_equivalence_units, 6 + 3 + 1);

        assert_eq!(stats.top_stores[0].label, "Luna");
        assert!(stats.top_stores.iter().any(|r| r.label == DELETED_STORE_LABEL));

        assert_eq!(stats.revenue_timeline.len(), 2);
        assert_eq!(stats.revenue_timeline[0].date, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
        assert_eq!(stats.revenue_timeline[1].revenue.cents(), 7750);

        assert_eq!(stats.type_distribution[0].label, "Genérico");
        assert_eq!(stats.type_distribution[0].value, 7);
        assert_eq!(stats.top_models[0].label, "DinoPop");
        assert_eq!(stats.top_colors, vec![Ranked { label: "Mint".to_string(), value: 7 }]);
    }

    #[test]
    fn test_top_is_capped() {
        let settings = AppSettings::default();
        let stores: Vec<Store> = (0..7).map(|i| Store::new(format!("S{i}"), "X")).collect();
        let orders: Vec<Order> = stores
            .iter()
            .enumerate()
            .map(|(i, s)| order(&s.id, 1, vec![line("GEN", "B01", "MINT", 1, 100 * (i as i64 + 1))]))
            .collect();

        let stats = dashboard_stats(&orders, &stores, &settings);
        assert_eq!(stats.top_stores.len(), TOP_N);
        assert_eq!(stats.top_stores[0].label, "S6");
    }
}
