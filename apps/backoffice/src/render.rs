//! # Document Rendering
//!
//! Turns a [`PreparedDocument`] into bytes. PDF output belongs to an outer
//! shell; the back office ships a plain-text renderer that follows the same
//! layout.
//!
//! ```text
//! BRIIK                                                         FACTURA
//! ---------------------------------------------------------------------
//! EMISOR                              CLIENTE
//! BRIIK SL                            Kiosko
//! ...
//! Nº DOCUMENTO: INV-2026-0001         FECHA: 2026-10-01
//! ---------------------------------------------------------------------
//! Ref/SKU                  Descripción           Cant.   Precio   Total
//! ...
//! ```

use std::fmt::Write as _;

use briik_core::document::PreparedDocument;

use crate::error::{ApiError, ApiResult};

/// Produces the binary form of a prepared invoice or delivery note.
pub trait DocumentRenderer: Send + Sync {
    /// File extension of the output, without the dot.
    fn extension(&self) -> &'static str;

    fn render(&self, document: &PreparedDocument) -> ApiResult<Vec<u8>>;
}

const WIDTH: usize = 78;
const COLUMN: usize = 38;

/// Fixed-width UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl DocumentRenderer for TextRenderer {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, doc: &PreparedDocument) -> ApiResult<Vec<u8>> {
        let mut out = String::new();
        write_document(&mut out, doc)
            .map_err(|e| ApiError::internal(format!("Rendering failed: {e}")))?;
        Ok(out.into_bytes())
    }
}

fn write_document(out: &mut String, doc: &PreparedDocument) -> std::fmt::Result {
    let rule = "-".repeat(WIDTH);

    writeln!(out, "{}{:>width$}", "BRIIK", doc.title, width = WIDTH - "BRIIK".len())?;
    writeln!(out, "{rule}")?;

    writeln!(out, "{}{}", pad("EMISOR:", COLUMN), "CLIENTE:")?;
    let lines = doc.issuer.len().max(doc.client.len());
    for i in 0..lines {
        let issuer = doc.issuer.get(i).map(String::as_str).unwrap_or("");
        let client = doc.client.get(i).map(String::as_str).unwrap_or("");
        writeln!(out, "{}{}", pad(issuer, COLUMN), client)?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "{}FECHA: {}",
        pad(&format!("Nº DOCUMENTO: {}", doc.number), COLUMN),
        doc.date.format("%d/%m/%Y")
    )?;
    writeln!(out, "{rule}")?;

    writeln!(
        out,
        "{:<24} {:<24} {:>6} {:>9} {:>10}",
        "Ref/SKU", "Descripción", "Cant.", "Precio", "Total"
    )?;
    for row in &doc.rows {
        writeln!(
            out,
            "{:<24} {:<24} {:>6} {:>9} {:>10}",
            clip(&row.sku, 24),
            clip(&row.description, 24),
            row.qty,
            row.unit_price.to_string(),
            row.total.to_string()
        )?;
    }
    writeln!(out, "{rule}")?;

    for total in &doc.totals {
        let amount = total.amount.to_string();
        let label = if total.emphasized {
            total.label.to_uppercase()
        } else {
            total.label.clone()
        };
        writeln!(out, "{:>62} {:>15}", label, amount)?;
    }

    writeln!(out)?;
    writeln!(out, "{}", doc.footer)?;
    Ok(())
}

/// Left-aligns `text` in `width` characters (not bytes).
fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        format!("{} ", clip(text, width - 1))
    } else {
        format!("{text}{}", " ".repeat(width - len))
    }
}

fn clip(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use briik_core::catalog::AppSettings;
    use briik_core::document::prepare_document;
    use briik_core::order::{add_line, new_order};
    use briik_core::{DocumentKind, Store};
    use chrono::NaiveDate;

    fn document(kind: DocumentKind) -> PreparedDocument {
        let settings = AppSettings::default();
        let mut store = Store::new("Kiosko Azul", "Cádiz");
        store.requires_re = true;
        let date = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();

        let mut order = new_order(&store.id, &settings, 0, date);
        add_line(&mut order, &settings).unwrap();
        order.invoice_number = Some("INV-2026-0001".into());

        prepare_document(&order, &store, &settings.billing, kind).unwrap()
    }

    #[test]
    fn test_invoice_text_contains_layout() {
        let bytes = TextRenderer.render(&document(DocumentKind::Invoice)).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("BRIIK"));
        assert!(text.contains("FACTURA"));
        assert!(text.contains("Nº DOCUMENTO: INV-2026-0001"));
        assert!(text.contains("FECHA: 01/10/2026"));
        assert!(text.contains("Kiosko Azul"));
        assert!(text.contains("IVA (21%):"));
        assert!(text.contains("RE (5.2%):"));
        assert!(text.contains("TOTAL:"));
        assert!(text.trim_end().ends_with(&doc_footer()));
    }

    #[test]
    fn test_delivery_note_has_no_taxes() {
        let bytes = TextRenderer
            .render(&document(DocumentKind::DeliveryNote))
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("ALBARÁN"));
        assert!(text.contains("Nº DOCUMENTO: PED-0001"));
        assert!(text.contains("TOTAL PVD:"));
        assert!(!text.contains("IVA"));
    }

    #[test]
    fn test_pad_counts_characters() {
        assert_eq!(pad("Cádiz", 7), "Cádiz  ");
        assert_eq!(pad("abcdef", 4), "abc ");
    }

    fn doc_footer() -> String {
        briik_core::document::DOCUMENT_FOOTER.to_string()
    }
}
