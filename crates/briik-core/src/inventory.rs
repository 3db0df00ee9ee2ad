//! # Inventory Records
//!
//! Bookkeeping that sits beside orders: stock deposited at stores,
//! supplier invoices, raw material and manufactured product stock.
//! None of it feeds pricing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Goods left at a store on deposit (consignment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    pub id: String,
    pub store_id: String,
    pub product_name: String,
    pub qty: u32,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub notes: Option<String>,
}

/// An invoice received from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SupplierInvoice {
    pub id: String,
    pub supplier_name: String,
    pub invoice_number: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub amount: Money,
    pub notes: Option<String>,
}

/// Raw material on hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RawStock {
    pub id: String,
    pub item_name: String,
    pub qty: u32,
    /// Free-text unit ("uds", "kg", ...).
    pub unit: String,
    pub supplier_name: Option<String>,
}

/// Finished product on hand, one record per (model, color).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductStock {
    pub id: String,
    pub model_code: String,
    pub color_code: String,
    pub qty: u32,
}

/// All inventory records of an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub deposits: Vec<Deposit>,
    pub supplier_invoices: Vec<SupplierInvoice>,
    pub raw_stock: Vec<RawStock>,
    pub product_stock: Vec<ProductStock>,
}

impl Inventory {
    /// Units of finished product for a model/color pair (0 when untracked).
    pub fn stock_level(&self, model_code: &str, color_code: &str) -> u32 {
        self.product_stock
            .iter()
            .find(|p| p.model_code == model_code && p.color_code == color_code)
            .map(|p| p.qty)
            .unwrap_or(0)
    }

    /// Units currently on deposit at `store_id`.
    pub fn deposited_at(&self, store_id: &str) -> u64 {
        self.deposits
            .iter()
            .filter(|d| d.store_id == store_id)
            .map(|d| d.qty as u64)
            .sum()
    }

    /// Total owed across supplier invoices.
    pub fn supplier_spend(&self) -> Money {
        self.supplier_invoices.iter().map(|i| i.amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_queries() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let inventory = Inventory {
            deposits: vec![
                Deposit {
                    id: "d1".into(),
                    store_id: "s1".into(),
                    product_name: "DinoPop Mint".into(),
                    qty: 4,
                    date,
                    notes: None,
                },
                Deposit {
                    id: "d2".into(),
                    store_id: "s1".into(),
                    product_name: "UniPop Quartz".into(),
                    qty: 2,
                    date,
                    notes: Some("escaparate".into()),
                },
            ],
            supplier_invoices: vec![SupplierInvoice {
                id: "f1".into(),
                supplier_name: "Plásticos Norte".into(),
                invoice_number: "PN-77".into(),
                date,
                amount: Money::from_cents(12050),
                notes: None,
            }],
            raw_stock: Vec::new(),
            product_stock: vec![ProductStock {
                id: "p1".into(),
                model_code: "B01".into(),
                color_code: "MINT".into(),
                qty: 40,
            }],
        };

        assert_eq!(inventory.deposited_at("s1"), 6);
        assert_eq!(inventory.deposited_at("s2"), 0);
        assert_eq!(inventory.stock_level("B01", "MINT"), 40);
        assert_eq!(inventory.stock_level("B01", "QUARTZ"), 0);
        assert_eq!(inventory.supplier_spend().cents(), 12050);
    }
}
