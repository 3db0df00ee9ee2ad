//! # Invoice Numbering
//!
//! The invoice counter lives in `BillingInfo.next_invoice_number`. Issuing a
//! number is a pure state transition; committing it atomically is the
//! persistence layer's job (compare-and-swap on the counter row).
//!
//! ## Transition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  order.invoice_number set?                                              │
//! │     │                                                                   │
//! │     ├── yes ──► AlreadyIssued { number }      billing untouched         │
//! │     │                                                                   │
//! │     └── no  ──► number  = prefix + pad4(next)                           │
//! │                 billing.next_invoice_number = next + 1                  │
//! │                 Issued { number, billing }                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::catalog::BillingInfo;
use crate::types::Order;

/// Outcome of [`issue_invoice_number`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceIssue {
    /// A new number was taken from the counter.
    Issued { number: String, billing: BillingInfo },

    /// The order already carries a number. Nothing changes.
    AlreadyIssued { number: String },
}

impl InvoiceIssue {
    /// The invoice number the order ends up with.
    pub fn number(&self) -> &str {
        match self {
            InvoiceIssue::Issued { number, .. } => number,
            InvoiceIssue::AlreadyIssued { number } => number,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, InvoiceIssue::Issued { .. })
    }
}

/// `prefix` followed by `n` zero-padded to four digits.
///
/// ```rust
/// use briik_core::invoice::format_invoice_number;
///
/// assert_eq!(format_invoice_number("INV-2026-", 7), "INV-2026-0007");
/// assert_eq!(format_invoice_number("F", 12345), "F12345");
/// ```
pub fn format_invoice_number(prefix: &str, n: u32) -> String {
    format!("{prefix}{n:04}")
}

/// Takes the next invoice number for `order` from `billing`.
pub fn issue_invoice_number(order: &Order, billing: &BillingInfo) -> InvoiceIssue {
    if let Some(existing) = order.invoice_number.as_deref().filter(|n| !n.is_empty()) {
        return InvoiceIssue::AlreadyIssued {
            number: existing.to_string(),
        };
    }

    let number = format_invoice_number(&billing.invoice_prefix, billing.next_invoice_number);
    let mut next = billing.clone();
    next.next_invoice_number = billing.next_invoice_number.saturating_add(1);

    InvoiceIssue::Issued {
        number,
        billing: next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use chrono::NaiveDate;

    fn order() -> Order {
        Order {
            id: "o1".to_string(),
            store_id: "s1".to_string(),
            number: "PED-0001".to_string(),
            invoice_number: None,
            date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            status: "Confirmado".to_string(),
            lines: Vec::new(),
            shipping_policy: "Península".to_string(),
            shipping_cost: Money::from_cents(750),
            free_from_pvd: Money::from_cents(5000),
            notes: None,
            shipping_override: false,
        }
    }

    #[test]
    fn test_issue_advances_counter() {
        let billing = BillingInfo::default();
        let issue = issue_invoice_number(&order(), &billing);

        match issue {
            InvoiceIssue::Issued { number, billing: next } => {
                assert_eq!(number, "INV-2026-0001");
                assert_eq!(next.next_invoice_number, 2);
            }
            other => panic!("expected a new number, got {other:?}"),
        }
    }

    #[test]
    fn test_issue_twice_is_noop() {
        let mut o = order();
        let billing = BillingInfo::default();

        let first = issue_invoice_number(&o, &billing);
        let InvoiceIssue::Issued { number, billing: after_first } = first.clone() else {
            panic!("first issue must allocate");
        };
        o.invoice_number = Some(number.clone());

        let second = issue_invoice_number(&o, &after_first);
        assert_eq!(second, InvoiceIssue::AlreadyIssued { number: number.clone() });
        assert_eq!(second.number(), first.number());
        // counter moved exactly once
        assert_eq!(after_first.next_invoice_number, billing.next_invoice_number + 1);
    }

    #[test]
    fn test_empty_invoice_number_counts_as_unset() {
        let mut o = order();
        o.invoice_number = Some(String::new());
        assert!(issue_invoice_number(&o, &BillingInfo::default()).is_new());
    }
}
