//! # Import
//!
//! Parses a BRIIKData document back into domain values.
//!
//! ## Tolerance Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Fatal (XmlError, nothing applied)    Tolerated (fallback + warn log)   │
//! │  ─────────────────────────────────    ───────────────────────────────   │
//! │  malformed markup                     malformed number / date           │
//! │  missing <BRIIKData> root             missing element (silent default)  │
//! │                                       missing id attribute (new id)     │
//! │                                       qty / equivalence units < 1       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Settings are optional: a document without `<Settings>` yields
//! `settings: None` and the caller decides which catalog to keep.

use chrono::NaiveDate;

use briik_core::catalog::{
    AppSettings, BillingInfo, Color, LineType, Model, Rules, Status, DEFAULT_SCHEMA_VERSION,
};
use briik_core::money::{Money, TaxRate};
use briik_core::types::{new_id, AppData, Order, OrderLine, Store};

use crate::error::{XmlError, XmlResult};
use crate::tree::{parse, Node};
use crate::ROOT_ELEMENT;

/// What a document contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedData {
    /// `None` when the document has no `<Settings>` block.
    pub settings: Option<AppSettings>,
    pub stores: Vec<Store>,
    pub orders: Vec<Order>,
}

impl ImportedData {
    /// Completes the import into a full [`AppData`], keeping `current`
    /// settings when the document carried none.
    pub fn into_app_data(self, current: AppSettings) -> AppData {
        AppData {
            settings: self.settings.unwrap_or(current),
            stores: self.stores,
            orders: self.orders,
        }
    }
}

/// Parses a BRIIKData document.
///
/// `today` is used for orders whose date is missing or unreadable.
pub fn import_from_xml(xml: &str, today: NaiveDate) -> XmlResult<ImportedData> {
    let root = parse(xml)?;
    if root.name != ROOT_ELEMENT {
        return Err(XmlError::MissingRoot { found: root.name });
    }

    let version = root
        .attr("version")
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_SCHEMA_VERSION);

    let settings = root.child("Settings").map(|s| read_settings(s, version));

    let stores: Vec<Store> = root
        .child_or_empty("Stores")
        .children_named("Store")
        .map(read_store)
        .collect();

    let orders: Vec<Order> = root
        .child_or_empty("Orders")
        .children_named("Order")
        .map(|o| read_order(o, today))
        .collect();

    tracing::debug!(
        has_settings = settings.is_some(),
        stores = stores.len(),
        orders = orders.len(),
        "Imported BRIIKData document"
    );

    Ok(ImportedData {
        settings,
        stores,
        orders,
    })
}

// =============================================================================
// Settings
// =============================================================================

fn read_settings(node: &Node, version: &str) -> AppSettings {
    let rules = node.child_or_empty("Rules");

    AppSettings {
        version: version.to_string(),
        rules: Rules {
            moq: uint(rules, "MOQ", 6),
            shipping_cost: money(rules, "ShippingCost", Money::zero()),
            free_from_pvd: money(rules, "FreeFromPVD", Money::zero()),
            lead_time_generic: text(rules, "LeadTimeGeneric"),
            lead_time_personalized: text(rules, "LeadTimePersonalized"),
            lead_time_transport: text(rules, "LeadTimeTransport"),
            name_max_suggested: uint(rules, "NameMaxSuggested", 12),
            name_normalize: flag(rules, "NameNormalize"),
            allow_emojis: flag(rules, "AllowEmojis"),
        },
        billing: node
            .child("Billing")
            .map(read_billing)
            .unwrap_or_else(BillingInfo::minimal),
        statuses: node
            .child_or_empty("Statuses")
            .children_named("Status")
            .map(|s| Status {
                name: text(s, "Name"),
                order: int(s, "Order", 0),
                badge_color: text(s, "BadgeColor"),
            })
            .collect(),
        models: node
            .child_or_empty("Models")
            .children_named("Model")
            .map(|m| Model {
                code: text(m, "Code"),
                name: text(m, "Name"),
            })
            .collect(),
        colors: node
            .child_or_empty("Colors")
            .children_named("Color")
            .map(|c| Color {
                code: text(c, "Code"),
                name: text(c, "Name"),
            })
            .collect(),
        line_types: node
            .child_or_empty("LineTypes")
            .children_named("LineType")
            .map(read_line_type)
            .collect(),
    }
}

fn read_billing(node: &Node) -> BillingInfo {
    BillingInfo {
        company_name: text(node, "CompanyName"),
        nif: text(node, "NIF"),
        address: text(node, "Address"),
        postal_code: text(node, "PostalCode"),
        city: text(node, "City"),
        province: text(node, "Province"),
        country: text(node, "Country"),
        email: text(node, "Email"),
        phone: text(node, "Phone"),
        vat_rate: rate(node, "VATRate", TaxRate::from_bps(2100)),
        re_rate: rate(node, "RERate", TaxRate::from_bps(520)),
        invoice_prefix: text(node, "InvoicePrefix"),
        next_invoice_number: uint(node, "NextInvoiceNumber", 1),
    }
}

fn read_line_type(node: &Node) -> LineType {
    LineType {
        code_type: text(node, "CodeType"),
        label: text(node, "Label"),
        sku_prefix: text(node, "SKUPrefix"),
        sku_fixed: text(node, "SKUFixed"),
        requires_model: flag(node, "RequiresModel"),
        requires_color: flag(node, "RequiresColor"),
        requires_name: flag(node, "RequiresName"),
        default_pvd_unit: money(node, "DefaultPVDUnit", Money::zero()),
        default_pvp_unit: money(node, "DefaultPVPUnit", Money::zero()),
        equivalence_units: uint(node, "EquivalenceUnits", 1).max(1),
    }
}

// =============================================================================
// Stores & Orders
// =============================================================================

fn read_store(node: &Node) -> Store {
    Store {
        id: id_attr(node),
        name: text(node, "Name"),
        city: text(node, "City"),
        address: optional(node, "Address"),
        postal_code: optional(node, "PostalCode"),
        province: optional(node, "Province"),
        country: optional(node, "Country"),
        nif: optional(node, "NIF"),
        contact: optional(node, "Contact"),
        email: optional(node, "Email"),
        phone: optional(node, "Phone"),
        instagram: optional(node, "Instagram"),
        notes: optional(node, "Notes"),
        requires_re: flag(node, "RequiresRE"),
    }
}

fn read_order(node: &Node, today: NaiveDate) -> Order {
    let shipping = node.child_or_empty("Shipping");

    Order {
        id: id_attr(node),
        store_id: node.attr("storeId").unwrap_or_default().to_string(),
        number: node.attr("number").unwrap_or_default().to_string(),
        invoice_number: optional(node, "InvoiceNumber"),
        date: date(node, "Date", today),
        status: text(node, "Status"),
        lines: node
            .child_or_empty("Lines")
            .children_named("Line")
            .map(read_line)
            .collect(),
        shipping_policy: text(shipping, "Policy"),
        shipping_cost: money(shipping, "Cost", Money::zero()),
        free_from_pvd: money(shipping, "FreeFromPVD", Money::zero()),
        notes: optional(node, "Notes"),
        shipping_override: flag(node, "ShippingOverride"),
    }
}

fn read_line(node: &Node) -> OrderLine {
    OrderLine {
        id: id_attr(node),
        line_type: text(node, "Type"),
        model: text(node, "Model"),
        color: text(node, "Color"),
        name: text(node, "Name"),
        qty: uint(node, "Qty", 1).max(1),
        sku: text(node, "SKU"),
        pvd_unit: money(node, "PVDUnit", Money::zero()),
        pvp_unit: money(node, "PVPUnit", Money::zero()),
    }
}

// =============================================================================
// Field Readers
// =============================================================================

fn id_attr(node: &Node) -> String {
    match node.attr("id").filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => new_id(),
    }
}

fn text(node: &Node, tag: &str) -> String {
    node.text_of(tag).to_string()
}

fn optional(node: &Node, tag: &str) -> Option<String> {
    let value = node.text_of(tag);
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn flag(node: &Node, tag: &str) -> bool {
    node.text_of(tag).trim() == "true"
}

/// Non-empty trimmed text, or `None` when the element is absent or blank.
fn raw<'a>(node: &'a Node, tag: &str) -> Option<&'a str> {
    Some(node.text_of(tag).trim()).filter(|v| !v.is_empty())
}

fn int(node: &Node, tag: &str, fallback: i32) -> i32 {
    let Some(value) = raw(node, tag) else {
        return fallback;
    };
    match parse_integer(value).and_then(|n| i32::try_from(n).ok()) {
        Some(n) => n,
        None => {
            warn_fallback(node, tag, value, &fallback);
            fallback
        }
    }
}

fn uint(node: &Node, tag: &str, fallback: u32) -> u32 {
    let Some(value) = raw(node, tag) else {
        return fallback;
    };
    match parse_integer(value).and_then(|n| u32::try_from(n).ok()) {
        Some(n) => n,
        None => {
            warn_fallback(node, tag, value, &fallback);
            fallback
        }
    }
}

/// Integers may be written with a fraction ("6.0"); the fraction is dropped.
fn parse_integer(value: &str) -> Option<i64> {
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    let f: f64 = value.parse().ok()?;
    f.is_finite().then(|| f.trunc() as i64)
}

fn money(node: &Node, tag: &str, fallback: Money) -> Money {
    let Some(value) = raw(node, tag) else {
        return fallback;
    };
    Money::parse_decimal(value).unwrap_or_else(|| {
        warn_fallback(node, tag, value, &fallback);
        fallback
    })
}

fn rate(node: &Node, tag: &str, fallback: TaxRate) -> TaxRate {
    let Some(value) = raw(node, tag) else {
        return fallback;
    };
    TaxRate::parse_percentage(value).unwrap_or_else(|| {
        warn_fallback(node, tag, value, &fallback);
        fallback
    })
}

fn date(node: &Node, tag: &str, today: NaiveDate) -> NaiveDate {
    let value = node.text_of(tag).trim();
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => {
            tracing::warn!(
                element = %node.name,
                field = tag,
                value = value,
                fallback = %today,
                "Unreadable date in import, using today"
            );
            today
        }
    }
}

fn warn_fallback(node: &Node, tag: &str, value: &str, fallback: &dyn std::fmt::Display) {
    tracing::warn!(
        element = %node.name,
        field = tag,
        value = value,
        fallback = %fallback,
        "Malformed number in import, using fallback"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::export_to_xml;
    use briik_core::pricing::order_totals;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn sample() -> AppData {
        let mut settings = AppSettings::default();
        settings.billing.next_invoice_number = 42;
        settings.billing.re_rate = TaxRate::from_bps(525);
        settings.rules.allow_emojis = true;

        let mut store = Store::new("Juguetes & Co <Centro>", "Bilbao");
        store.address = Some("Gran Vía 1".to_string());
        store.instagram = Some("@juguetes".to_string());
        store.notes = Some("Entregar \"antes\" de las 10 'h'".to_string());
        store.requires_re = true;

        let order = Order {
            id: "order-1".to_string(),
            store_id: store.id.clone(),
            number: "PED-0001".to_string(),
            invoice_number: Some("INV-2026-0041".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            status: "En Producción".to_string(),
            lines: vec![
                OrderLine {
                    id: "line-1".to_string(),
                    line_type: "PER".to_string(),
                    model: "B01".to_string(),
                    color: "MINT".to_string(),
                    name: "Ana <3".to_string(),
                    qty: 4,
                    sku: "BRIIK-PER-B01-MINT-ANA<3".to_string(),
                    pvd_unit: Money::from_cents(790),
                    pvp_unit: Money::from_cents(1690),
                },
                OrderLine {
                    id: "line-2".to_string(),
                    line_type: "PACK3_GEN".to_string(),
                    model: String::new(),
                    color: String::new(),
                    name: String::new(),
                    qty: 2,
                    sku: "BRIIK-PACK3-GEN".to_string(),
                    pvd_unit: Money::from_cents(1920),
                    pvp_unit: Money::from_cents(3990),
                },
            ],
            shipping_policy: "Península".to_string(),
            shipping_cost: Money::from_cents(750),
            free_from_pvd: Money::from_cents(5000),
            notes: Some("Factura & albarán".to_string()),
            shipping_override: true,
        };

        AppData {
            settings,
            stores: vec![store],
            orders: vec![order],
        }
    }

    #[test]
    fn test_round_trip() {
        let data = sample();
        let xml = export_to_xml(&data).unwrap();
        let back = import_from_xml(&xml, today()).unwrap();

        let restored = back.into_app_data(AppSettings::default());
        assert_eq!(restored, data);
    }

    #[test]
    fn test_missing_root_fails() {
        let err = import_from_xml("<Other><Stores/></Other>", today()).unwrap_err();
        assert!(matches!(err, XmlError::MissingRoot { found } if found == "Other"));
    }

    #[test]
    fn test_malformed_fails() {
        assert!(import_from_xml("<BRIIKData><Stores></BRIIKData>", today()).is_err());
        assert!(import_from_xml("", today()).is_err());
    }

    #[test]
    fn test_settings_optional() {
        let xml = r#"<BRIIKData version="1.1"><Stores/><Orders/></BRIIKData>"#;
        let data = import_from_xml(xml, today()).unwrap();
        assert!(data.settings.is_none());
        assert!(data.stores.is_empty());

        let current = AppSettings::default();
        assert_eq!(data.into_app_data(current.clone()).settings, current);
    }

    #[test]
    fn test_settings_fallbacks() {
        let xml = r#"<BRIIKData><Settings>
            <Rules><MOQ>many</MOQ><ShippingCost>5,5</ShippingCost></Rules>
            <LineTypes><LineType><CodeType>X</CodeType><EquivalenceUnits>0</EquivalenceUnits></LineType></LineTypes>
            <Statuses><Status><Name>Nuevo</Name></Status></Statuses>
        </Settings></BRIIKData>"#;
        let settings = import_from_xml(xml, today()).unwrap().settings.unwrap();

        assert_eq!(settings.version, "1.1");
        assert_eq!(settings.rules.moq, 6);
        assert_eq!(settings.rules.shipping_cost, Money::zero());
        assert_eq!(settings.rules.name_max_suggested, 12);
        assert!(!settings.rules.name_normalize);
        assert_eq!(settings.billing, BillingInfo::minimal());
        assert_eq!(settings.line_types[0].equivalence_units, 1);
        assert_eq!(settings.statuses[0].order, 0);
    }

    #[test]
    fn test_billing_rate_fallbacks() {
        let xml = r#"<BRIIKData><Settings><Billing>
            <CompanyName>Otra SL</CompanyName><VATRate></VATRate><RERate>x</RERate>
        </Billing></Settings></BRIIKData>"#;
        let billing = import_from_xml(xml, today()).unwrap().settings.unwrap().billing;

        assert_eq!(billing.company_name, "Otra SL");
        assert_eq!(billing.vat_rate.bps(), 2100);
        assert_eq!(billing.re_rate.bps(), 520);
        assert_eq!(billing.next_invoice_number, 1);
    }

    #[test]
    fn test_status_order_not_confused_with_orders() {
        let xml = r#"<BRIIKData>
            <Settings><Statuses><Status><Name>A</Name><Order>3</Order></Status></Statuses></Settings>
            <Orders/>
        </BRIIKData>"#;
        let data = import_from_xml(xml, today()).unwrap();
        assert!(data.orders.is_empty());
        assert_eq!(data.settings.unwrap().statuses[0].order, 3);
    }

    #[test]
    fn test_missing_ids_generated() {
        let xml = r#"<BRIIKData>
            <Stores><Store><Name>Sin id</Name></Store></Stores>
            <Orders><Order number="PED-0009"><Lines><Line><Type>GEN</Type></Line></Lines></Order></Orders>
        </BRIIKData>"#;
        let data = import_from_xml(xml, today()).unwrap();

        assert!(briik_core::types::is_confirmed_id(&data.stores[0].id));
        assert!(briik_core::types::is_confirmed_id(&data.orders[0].id));
        assert!(!data.orders[0].lines[0].id.is_empty());
        assert_eq!(data.orders[0].store_id, "");
    }

    #[test]
    fn test_order_value_fallbacks() {
        let xml = r#"<BRIIKData><Orders>
            <Order id="o1" storeId="s1" number="PED-0001">
              <Date>31/12/2025</Date>
              <Lines>
                <Line id="l1"><Qty>0</Qty><PVDUnit>abc</PVDUnit></Line>
                <Line id="l2"><Qty>-4</Qty><PVDUnit>6.4</PVDUnit></Line>
              </Lines>
            </Order>
        </Orders></BRIIKData>"#;
        let order = import_from_xml(xml, today()).unwrap().orders.remove(0);

        assert_eq!(order.date, today());
        assert_eq!(order.invoice_number, None);
        assert_eq!(order.notes, None);
        assert!(!order.shipping_override);
        assert_eq!(order.lines[0].qty, 1);
        assert_eq!(order.lines[0].pvd_unit, Money::zero());
        assert_eq!(order.lines[1].qty, 1);
        assert_eq!(order.lines[1].pvd_unit.cents(), 640);
    }

    #[test]
    fn test_huge_prices_fall_back_and_totals_stay_finite() {
        let xml = r#"<BRIIKData><Orders>
            <Order id="o1" storeId="s1" number="PED-0001">
              <Shipping><Cost>1e30</Cost><FreeFromPVD>50.00</FreeFromPVD></Shipping>
              <Lines>
                <Line id="l1"><Type>GEN</Type><Qty>1000</Qty><PVDUnit>1e17</PVDUnit></Line>
                <Line id="l2"><Type>GEN</Type><Qty>1000</Qty><PVDUnit>100000000000</PVDUnit></Line>
              </Lines>
            </Order>
        </Orders></BRIIKData>"#;
        let order = import_from_xml(xml, today()).unwrap().orders.remove(0);

        assert_eq!(order.lines[0].pvd_unit, Money::zero());
        assert_eq!(order.lines[1].pvd_unit.cents(), 10_000_000_000_000);
        assert_eq!(order.shipping_cost, Money::zero());

        let totals = order_totals(&order, &AppSettings::default().line_types);
        assert_eq!(totals.subtotal.cents(), 10_000_000_000_000_000);
        assert_eq!(totals.total, totals.subtotal);
        assert_eq!(totals.real_units, 2000);
    }
}
