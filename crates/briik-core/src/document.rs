//! # Document Preparation
//!
//! Builds everything a renderer needs to print an invoice or a delivery
//! note. Rendering itself (PDF, text, ...) happens outside this crate and
//! only consumes a [`PreparedDocument`].
//!
//! ## Layout Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BRIIK                                               FACTURA | ALBARÁN  │
//! │                                                                         │
//! │  EMISOR: issuer block            CLIENTE: client block ("---" if empty) │
//! │                                                                         │
//! │  Nº DOCUMENTO: number            FECHA: date                            │
//! │                                                                         │
//! │  Ref/SKU │ Descripción │ Cant. │ Precio │ Total                         │
//! │  ...one row per line...                                                 │
//! │                                                                         │
//! │                                      Subtotal / Envío                   │
//! │                                      IVA / RE        (invoice only)     │
//! │                                      TOTAL | TOTAL PVD                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::BillingInfo;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{document_totals, DocumentKind, TaxBreakdown};
use crate::types::{Order, OrderLine, Store};

/// Printed when an invoice is rendered before a number was issued.
pub const MISSING_INVOICE_NUMBER: &str = "SIN NÚMERO";

/// Printed for empty client fields.
pub const MISSING_FIELD: &str = "---";

pub const DOCUMENT_FOOTER: &str =
    "Gracias por su confianza. | BRIIK - Innovación en Regalo Infantil";

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRow {
    pub sku: String,
    pub description: String,
    pub qty: u32,
    pub unit_price: Money,
    pub total: Money,
}

/// One labelled amount in the totals block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TotalRow {
    pub label: String,
    pub amount: Money,
    /// Printed in bold (grand total).
    pub emphasized: bool,
}

/// Renderer input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PreparedDocument {
    pub kind: DocumentKind,
    pub title: String,
    pub number: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub issuer: Vec<String>,
    pub client: Vec<String>,
    pub rows: Vec<DocumentRow>,
    pub totals: Vec<TotalRow>,
    pub breakdown: TaxBreakdown,
    pub footer: String,
    pub file_name: String,
}

/// Builds the renderer input for `order`.
///
/// ## Errors
/// [`CoreError::BillingNotConfigured`] when the issuer has no company name.
pub fn prepare_document(
    order: &Order,
    store: &Store,
    billing: &BillingInfo,
    kind: DocumentKind,
) -> CoreResult<PreparedDocument> {
    if !billing.is_configured() {
        return Err(CoreError::BillingNotConfigured);
    }

    let (title, file_title) = match kind {
        DocumentKind::Invoice => ("FACTURA", "Factura"),
        DocumentKind::DeliveryNote => ("ALBARÁN", "Albaran"),
    };

    let number = match kind {
        DocumentKind::Invoice => order
            .invoice_number
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| MISSING_INVOICE_NUMBER.to_string()),
        DocumentKind::DeliveryNote => order.number.clone(),
    };

    let breakdown = document_totals(order, Some(store), billing, kind);

    Ok(PreparedDocument {
        kind,
        title: title.to_string(),
        file_name: format!("{}_{}.pdf", file_title, sanitize_file_component(&number)),
        number,
        date: order.date,
        issuer: issuer_block(billing),
        client: client_block(store),
        rows: order.lines.iter().map(document_row).collect(),
        totals: total_rows(&breakdown, billing, kind),
        breakdown,
        footer: DOCUMENT_FOOTER.to_string(),
    })
}

fn issuer_block(billing: &BillingInfo) -> Vec<String> {
    vec![
        billing.company_name.clone(),
        format!("NIF: {}", billing.nif),
        billing.address.clone(),
        format!("{} {}", billing.postal_code, billing.city),
        format!("{}, {}", billing.province, billing.country),
        format!("Email: {}", billing.email),
        format!("Tel: {}", billing.phone),
    ]
}

fn client_block(store: &Store) -> Vec<String> {
    let field = |value: &Option<String>| -> String {
        value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(MISSING_FIELD)
            .to_string()
    };
    let city = if store.city.trim().is_empty() {
        MISSING_FIELD.to_string()
    } else {
        store.city.clone()
    };

    vec![
        store.name.clone(),
        format!("NIF/CIF: {}", field(&store.nif)),
        field(&store.address),
        format!("{} {}", field(&store.postal_code), city),
        format!("{}, {}", field(&store.province), field(&store.country)),
        format!("Email: {}", field(&store.email)),
        format!("Tel: {}", field(&store.phone)),
    ]
}

fn document_row(line: &OrderLine) -> DocumentRow {
    let mut description = format!("{} {}", line.model, line.color);
    if !line.name.is_empty() {
        description.push_str(&format!(" ({})", line.name));
    }

    DocumentRow {
        sku: line.sku.clone(),
        description: description.trim().to_string(),
        qty: line.qty,
        unit_price: line.pvd_unit,
        total: line.subtotal(),
    }
}

fn total_rows(breakdown: &TaxBreakdown, billing: &BillingInfo, kind: DocumentKind) -> Vec<TotalRow> {
    let row = |label: String, amount: Money, emphasized: bool| TotalRow {
        label,
        amount,
        emphasized,
    };

    let mut rows = vec![
        row("Subtotal:".to_string(), breakdown.subtotal, false),
        row("Envío:".to_string(), breakdown.shipping, false),
    ];

    if let Some(vat) = breakdown.vat {
        rows.push(row(format!("IVA ({}):", billing.vat_rate), vat.amount, false));
    }
    if let Some(re) = breakdown.re {
        rows.push(row(format!("RE ({}):", billing.re_rate), re.amount, false));
    }

    let total_label = match kind {
        DocumentKind::Invoice => "TOTAL:",
        DocumentKind::DeliveryNote => "TOTAL PVD:",
    };
    rows.push(row(total_label.to_string(), breakdown.total, true));
    rows
}

/// Replaces everything except ASCII letters and digits with `_`.
pub fn sanitize_file_component(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
