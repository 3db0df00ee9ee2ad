//! # Export
//!
//! Serialises [`AppData`] into a BRIIKData document.
//!
//! ## Field Rendering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Money, rates ──► two fraction digits      "7.50", "5.20"               │
//! │  bool         ──► "true" / "false"                                      │
//! │  None / ""    ──► empty element            <Notes></Notes>              │
//! │  text         ──► escaped (& < > ' ")                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Element order is fixed; the importer does not depend on it, but diffs
//! between two exports stay readable.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;

use briik_core::catalog::{AppSettings, DEFAULT_SCHEMA_VERSION};
use briik_core::money::{Money, TaxRate};
use briik_core::types::{AppData, Order, OrderLine, Store};

use crate::error::XmlResult;
use crate::ROOT_ELEMENT;

type XmlWriter = Writer<Vec<u8>>;

/// Renders `data` as a complete BRIIKData document (UTF-8, indented).
pub fn export_to_xml(data: &AppData) -> XmlResult<String> {
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);

    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let version = if data.settings.version.is_empty() {
        DEFAULT_SCHEMA_VERSION
    } else {
        data.settings.version.as_str()
    };
    let mut root = BytesStart::new(ROOT_ELEMENT);
    root.push_attribute(("version", version));
    w.write_event(Event::Start(root))?;

    write_settings(&mut w, &data.settings)?;

    open(&mut w, "Stores")?;
    for store in &data.stores {
        write_store(&mut w, store)?;
    }
    close(&mut w, "Stores")?;

    open(&mut w, "Orders")?;
    for order in &data.orders {
        write_order(&mut w, order)?;
    }
    close(&mut w, "Orders")?;

    close(&mut w, ROOT_ELEMENT)?;

    tracing::debug!(
        stores = data.stores.len(),
        orders = data.orders.len(),
        "Exported BRIIKData document"
    );

    Ok(String::from_utf8(w.into_inner())?)
}

// =============================================================================
// Sections
// =============================================================================

fn write_settings(w: &mut XmlWriter, settings: &AppSettings) -> XmlResult<()> {
    let rules = &settings.rules;
    let billing = &settings.billing;

    open(w, "Settings")?;

    open(w, "Rules")?;
    leaf(w, "MOQ", &rules.moq.to_string())?;
    leaf(w, "ShippingCost", &money(rules.shipping_cost))?;
    leaf(w, "FreeFromPVD", &money(rules.free_from_pvd))?;
    leaf(w, "LeadTimeGeneric", &rules.lead_time_generic)?;
    leaf(w, "LeadTimePersonalized", &rules.lead_time_personalized)?;
    leaf(w, "LeadTimeTransport", &rules.lead_time_transport)?;
    leaf(w, "NameMaxSuggested", &rules.name_max_suggested.to_string())?;
    leaf(w, "NameNormalize", boolean(rules.name_normalize))?;
    leaf(w, "AllowEmojis", boolean(rules.allow_emojis))?;
    close(w, "Rules")?;

    open(w, "Billing")?;
    leaf(w, "CompanyName", &billing.company_name)?;
    leaf(w, "NIF", &billing.nif)?;
    leaf(w, "Address", &billing.address)?;
    leaf(w, "PostalCode", &billing.postal_code)?;
    leaf(w, "City", &billing.city)?;
    leaf(w, "Province", &billing.province)?;
    leaf(w, "Country", &billing.country)?;
    leaf(w, "Email", &billing.email)?;
    leaf(w, "Phone", &billing.phone)?;
    leaf(w, "VATRate", &rate(billing.vat_rate))?;
    leaf(w, "RERate", &rate(billing.re_rate))?;
    leaf(w, "InvoicePrefix", &billing.invoice_prefix)?;
    leaf(w, "NextInvoiceNumber", &billing.next_invoice_number.to_string())?;
    close(w, "Billing")?;

    open(w, "Statuses")?;
    for status in &settings.statuses {
        open(w, "Status")?;
        leaf(w, "Name", &status.name)?;
        leaf(w, "Order", &status.order.to_string())?;
        leaf(w, "BadgeColor", &status.badge_color)?;
        close(w, "Status")?;
    }
    close(w, "Statuses")?;

    open(w, "Models")?;
    for model in &settings.models {
        open(w, "Model")?;
        leaf(w, "Code", &model.code)?;
        leaf(w, "Name", &model.name)?;
        close(w, "Model")?;
    }
    close(w, "Models")?;

    open(w, "Colors")?;
    for color in &settings.colors {
        open(w, "Color")?;
        leaf(w, "Code", &color.code)?;
        leaf(w, "Name", &color.name)?;
        close(w, "Color")?;
    }
    close(w, "Colors")?;

    open(w, "LineTypes")?;
    for lt in &settings.line_types {
        open(w, "LineType")?;
        leaf(w, "CodeType", &lt.code_type)?;
        leaf(w, "Label", &lt.label)?;
        leaf(w, "SKUPrefix", &lt.sku_prefix)?;
        leaf(w, "SKUFixed", &lt.sku_fixed)?;
        leaf(w, "RequiresModel", boolean(lt.requires_model))?;
        leaf(w, "RequiresColor", boolean(lt.requires_color))?;
        leaf(w, "RequiresName", boolean(lt.requires_name))?;
        leaf(w, "DefaultPVDUnit", &money(lt.default_pvd_unit))?;
        leaf(w, "DefaultPVPUnit", &money(lt.default_pvp_unit))?;
        leaf(w, "EquivalenceUnits", &lt.equivalence_units.to_string())?;
        close(w, "LineType")?;
    }
    close(w, "LineTypes")?;

    close(w, "Settings")
}

fn write_store(w: &mut XmlWriter, store: &Store) -> XmlResult<()> {
    let mut start = BytesStart::new("Store");
    start.push_attribute(("id", store.id.as_str()));
    w.write_event(Event::Start(start))?;

    leaf(w, "Name", &store.name)?;
    leaf(w, "City", &store.city)?;
    leaf(w, "Address", optional(&store.address))?;
    leaf(w, "PostalCode", optional(&store.postal_code))?;
    leaf(w, "Province", optional(&store.province))?;
    leaf(w, "Country", optional(&store.country))?;
    leaf(w, "NIF", optional(&store.nif))?;
    leaf(w, "Contact", optional(&store.contact))?;
    leaf(w, "Email", optional(&store.email))?;
    leaf(w, "Phone", optional(&store.phone))?;
    leaf(w, "Instagram", optional(&store.instagram))?;
    leaf(w, "Notes", optional(&store.notes))?;
    leaf(w, "RequiresRE", boolean(store.requires_re))?;

    close(w, "Store")
}

fn write_order(w: &mut XmlWriter, order: &Order) -> XmlResult<()> {
    let mut start = BytesStart::new("Order");
    start.push_attribute(("id", order.id.as_str()));
    start.push_attribute(("storeId", order.store_id.as_str()));
    start.push_attribute(("number", order.number.as_str()));
    w.write_event(Event::Start(start))?;

    leaf(w, "InvoiceNumber", optional(&order.invoice_number))?;
    leaf(w, "Date", &order.date.format("%Y-%m-%d").to_string())?;
    leaf(w, "Status", &order.status)?;

    open(w, "Shipping")?;
    leaf(w, "Policy", &order.shipping_policy)?;
    leaf(w, "Cost", &money(order.shipping_cost))?;
    leaf(w, "FreeFromPVD", &money(order.free_from_pvd))?;
    close(w, "Shipping")?;

    leaf(w, "Notes", optional(&order.notes))?;
    leaf(w, "ShippingOverride", boolean(order.shipping_override))?;

    open(w, "Lines")?;
    for line in &order.lines {
        write_line(w, line)?;
    }
    close(w, "Lines")?;

    close(w, "Order")
}

fn write_line(w: &mut XmlWriter, line: &OrderLine) -> XmlResult<()> {
    let mut start = BytesStart::new("Line");
    start.push_attribute(("id", line.id.as_str()));
    w.write_event(Event::Start(start))?;

    leaf(w, "Type", &line.line_type)?;
    leaf(w, "Model", &line.model)?;
    leaf(w, "Color", &line.color)?;
    leaf(w, "Name", &line.name)?;
    leaf(w, "Qty", &line.qty.to_string())?;
    leaf(w, "SKU", &line.sku)?;
    leaf(w, "PVDUnit", &money(line.pvd_unit))?;
    leaf(w, "PVPUnit", &money(line.pvp_unit))?;

    close(w, "Line")
}

// =============================================================================
// Primitives
// =============================================================================

fn open(w: &mut XmlWriter, name: &str) -> XmlResult<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn close(w: &mut XmlWriter, name: &str) -> XmlResult<()> {
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// `<name>escaped value</name>` on one line.
fn leaf(w: &mut XmlWriter, name: &str, value: &str) -> XmlResult<()> {
    w.create_element(name)
        .write_text_content(BytesText::new(value))?;
    Ok(())
}

fn money(value: Money) -> String {
    value.to_decimal_string()
}

fn rate(value: TaxRate) -> String {
    value.to_decimal_string()
}

fn boolean(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn optional(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}
