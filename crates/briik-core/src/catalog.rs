//! # Catalog & Rules
//!
//! Static configuration that drives SKU derivation, pricing and documents.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          AppSettings                                    │
//! │                                                                         │
//! │  version ─── "1.1"                                                      │
//! │  rules ───── Rules        MOQ, shipping, lead times, name policy        │
//! │  billing ─── BillingInfo  issuer data, VAT/RE, invoice counter          │
//! │  statuses ── [Status]     keyed by name                                 │
//! │  models ──── [Model]      keyed by code                                 │
//! │  colors ──── [Color]      keyed by code                                 │
//! │  line_types  [LineType]   keyed by code_type                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Settings are a plain value. Every pricing function takes what it needs
//! as an explicit argument; nothing reads a global.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, TaxRate};

/// Schema version written into new settings and XML exports.
pub const DEFAULT_SCHEMA_VERSION: &str = "1.1";

/// Status name used when the catalog defines none.
pub const FALLBACK_STATUS: &str = "Borrador";

// =============================================================================
// Rules
// =============================================================================

/// Commercial rules applied to new orders and to line advisories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Rules {
    /// Minimum order quantity in real units.
    pub moq: u32,

    /// Shipping cost charged below the free-shipping threshold.
    pub shipping_cost: Money,

    /// Subtotal (PVD) from which shipping is waived.
    #[serde(rename = "freeFromPVD")]
    pub free_from_pvd: Money,

    pub lead_time_generic: String,
    pub lead_time_personalized: String,
    pub lead_time_transport: String,

    /// Personalised names longer than this raise an advisory.
    pub name_max_suggested: u32,

    /// Capitalise personalised names before building the SKU.
    pub name_normalize: bool,

    pub allow_emojis: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            moq: 6,
            shipping_cost: Money::from_cents(750),
            free_from_pvd: Money::from_cents(5000),
            lead_time_generic: "24-48 h".to_string(),
            lead_time_personalized: "48-72 h".to_string(),
            lead_time_transport: "24-48 h".to_string(),
            name_max_suggested: 12,
            name_normalize: true,
            allow_emojis: false,
        }
    }
}

// =============================================================================
// Billing
// =============================================================================

/// Issuer data printed on documents, tax rates and the invoice counter.
///
/// `next_invoice_number` is only ever advanced by invoice issuance
/// (see [`crate::invoice`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillingInfo {
    pub company_name: String,
    pub nif: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub email: String,
    pub phone: String,

    /// VAT applied to every invoice.
    pub vat_rate: TaxRate,

    /// Recargo de equivalencia, applied only to stores flagged `requires_re`.
    pub re_rate: TaxRate,

    pub invoice_prefix: String,
    pub next_invoice_number: u32,
}

impl BillingInfo {
    /// Billing block used when a settings document carries no billing data.
    ///
    /// Deliberately thinner than [`BillingInfo::default`]: only the company
    /// name, rates and counter are known.
    pub fn minimal() -> Self {
        Self {
            company_name: "BRIIK SL".to_string(),
            nif: String::new(),
            address: String::new(),
            postal_code: String::new(),
            city: String::new(),
            province: String::new(),
            country: String::new(),
            email: String::new(),
            phone: String::new(),
            vat_rate: TaxRate::from_bps(2100),
            re_rate: TaxRate::from_bps(520),
            invoice_prefix: "INV-".to_string(),
            next_invoice_number: 1,
        }
    }

    /// True when documents can be produced (issuer name present).
    pub fn is_configured(&self) -> bool {
        !self.company_name.trim().is_empty()
    }
}

impl Default for BillingInfo {
    fn default() -> Self {
        Self {
            company_name: "BRIIK SL".to_string(),
            nif: "B12345678".to_string(),
            address: "Calle Ejemplo 123".to_string(),
            postal_code: "28001".to_string(),
            city: "Madrid".to_string(),
            province: "Madrid".to_string(),
            country: "España".to_string(),
            email: "finanzas@briik.es".to_string(),
            phone: "+34 912 345 678".to_string(),
            vat_rate: TaxRate::from_bps(2100),
            re_rate: TaxRate::from_bps(520),
            invoice_prefix: "INV-2026-".to_string(),
            next_invoice_number: 1,
        }
    }
}

// =============================================================================
// Keyed Catalog Entries
// =============================================================================

/// Order workflow status. `name` is the key orders refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub name: String,
    /// Sort rank.
    pub order: i32,
    pub badge_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Model {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Color {
    pub code: String,
    pub name: String,
}

/// Product category template.
///
/// ## SKU Source
/// Exactly one of `sku_prefix` / `sku_fixed` is expected to be non-empty.
/// A non-empty `sku_fixed` wins and the line's model/color/name are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineType {
    pub code_type: String,
    pub label: String,
    pub sku_prefix: String,
    pub sku_fixed: String,
    pub requires_model: bool,
    pub requires_color: bool,
    pub requires_name: bool,

    /// Seed wholesale price for new lines of this type.
    #[serde(rename = "defaultPVDUnit")]
    pub default_pvd_unit: Money,

    /// Seed suggested retail price for new lines of this type.
    #[serde(rename = "defaultPVPUnit")]
    pub default_pvp_unit: Money,

    /// Capacity weight consumed per unit sold.
    pub equivalence_units: u32,
}

impl LineType {
    /// True when this type derives its SKU from a fixed string.
    pub fn has_fixed_sku(&self) -> bool {
        !self.sku_fixed.is_empty()
    }

    /// Weight used by equivalence-unit accounting (never below 1).
    pub fn weight(&self) -> u32 {
        self.equivalence_units.max(1)
    }
}

// =============================================================================
// App Settings
// =============================================================================

/// The whole catalog. Threaded explicitly through every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub version: String,
    pub rules: Rules,
    pub billing: BillingInfo,
    pub statuses: Vec<Status>,
    pub models: Vec<Model>,
    pub colors: Vec<Color>,
    pub line_types: Vec<LineType>,
}

impl AppSettings {
    pub fn line_type(&self, code_type: &str) -> Option<&LineType> {
        self.line_types.iter().find(|lt| lt.code_type == code_type)
    }

    pub fn model(&self, code: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.code == code)
    }

    pub fn color(&self, code: &str) -> Option<&Color> {
        self.colors.iter().find(|c| c.code == code)
    }

    pub fn status(&self, name: &str) -> Option<&Status> {
        self.statuses.iter().find(|s| s.name == name)
    }

    /// Statuses ordered by rank (stable for equal ranks).
    pub fn sorted_statuses(&self) -> Vec<&Status> {
        let mut statuses: Vec<&Status> = self.statuses.iter().collect();
        statuses.sort_by_key(|s| s.order);
        statuses
    }

    /// Status assigned to new and cloned orders.
    ///
    /// The first configured status, or [`FALLBACK_STATUS`] when none exists.
    pub fn initial_status(&self) -> &str {
        self.statuses
            .first()
            .map(|s| s.name.as_str())
            .unwrap_or(FALLBACK_STATUS)
    }

    /// Display name for a model code, falling back to the code itself.
    pub fn model_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.model(code).map(|m| m.name.as_str()).unwrap_or(code)
    }

    /// Display name for a color code, falling back to the code itself.
    pub fn color_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.color(code).map(|c| c.name.as_str()).unwrap_or(code)
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        let status = |name: &str, order: i32, badge: &str| Status {
            name: name.to_string(),
            order,
            badge_color: badge.to_string(),
        };
        let model = |code: &str, name: &str| Model {
            code: code.to_string(),
            name: name.to_string(),
        };
        let color = |code: &str, name: &str| Color {
            code: code.to_string(),
            name: name.to_string(),
        };

        Self {
            version: DEFAULT_SCHEMA_VERSION.to_string(),
            rules: Rules::default(),
            billing: BillingInfo::default(),
            statuses: vec![
                status("Borrador", 1, "#9ca3af"),
                status("Confirmado", 2, "#3b82f6"),
                status("En Producción", 3, "#f59e0b"),
                status("Enviado", 4, "#10b981"),
                status("Entregado", 5, "#059669"),
            ],
            models: vec![
                model("B01", "DinoPop"),
                model("B02", "RocketPop"),
                model("B03", "UniPop"),
                model("B04", "MonsterPop"),
                model("B05", "WandPop"),
                model("B06", "CastlePop"),
                model("B07", "RainbowPop"),
                model("B08", "LionPop"),
            ],
            colors: vec![
                color("MINT", "Mint"),
                color("QUARTZ", "Quartz"),
                color("NEOGREEN", "Neo Green"),
                color("NEOPINK", "Neo Pink"),
                color("BLUEGLITTER", "Blue Glitter"),
                color("SILVERGLITTER", "Silver Glitter"),
            ],
            line_types: vec![
                LineType {
                    code_type: "GEN".to_string(),
                    label: "Genérico".to_string(),
                    sku_prefix: "BRIIK-GEN".to_string(),
                    sku_fixed: String::new(),
                    requires_model: true,
                    requires_color: true,
                    requires_name: false,
                    default_pvd_unit: Money::from_cents(640),
                    default_pvp_unit: Money::from_cents(1390),
                    equivalence_units: 1,
                },
                LineType {
                    code_type: "PER".to_string(),
                    label: "Personalizado".to_string(),
                    sku_prefix: "BRIIK-PER".to_string(),
                    sku_fixed: String::new(),
                    requires_model: true,
                    requires_color: true,
                    requires_name: true,
                    default_pvd_unit: Money::from_cents(790),
                    default_pvp_unit: Money::from_cents(1690),
                    equivalence_units: 1,
                },
                LineType {
                    code_type: "PACK3_GEN".to_string(),
                    label: "Pack 3 Genéricos".to_string(),
                    sku_prefix: String::new(),
                    sku_fixed: "BRIIK-PACK3-GEN".to_string(),
                    requires_model: false,
                    requires_color: false,
                    requires_name: false,
                    default_pvd_unit: Money::from_cents(1920),
                    default_pvp_unit: Money::from_cents(3990),
                    equivalence_units: 3,
                },
                LineType {
                    code_type: "PACK3_PER".to_string(),
                    label: "Pack 3 Personalizados".to_string(),
                    sku_prefix: String::new(),
                    sku_fixed: "BRIIK-PACK3-PER".to_string(),
                    requires_model: false,
                    requires_color: false,
                    requires_name: false,
                    default_pvd_unit: Money::from_cents(2370),
                    default_pvp_unit: Money::from_cents(4890),
                    equivalence_units: 3,
                },
            ],
        }
    }
}
