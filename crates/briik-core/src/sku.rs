//! # SKU Generator
//!
//! Derives the SKU of an order line from its line type and attributes.
//!
//! ## Derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line.line_type ──► LineType?                                           │
//! │                      │                                                  │
//! │          not found ──┼──► "UNKNOWN"                                     │
//! │                      │                                                  │
//! │     sku_fixed set ───┼──► sku_fixed (verbatim)                          │
//! │                      │                                                  │
//! │                      └──► sku_prefix                                    │
//! │                            + "-" model   (if requires_model)            │
//! │                            + "-" color   (if requires_color)            │
//! │                            + "-" name    (if requires_name)             │
//! │                            ──► UPPERCASE                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Missing values become the placeholders `MODEL`, `COLOR` and `NAME`.
//!
//! ## Example
//! ```rust
//! use briik_core::catalog::AppSettings;
//! use briik_core::sku::derive_sku;
//!
//! let settings = AppSettings::default();
//! let sku = derive_sku(&settings, "PER", "B01", "MINT", "joHN");
//! assert_eq!(sku, "BRIIK-PER-B01-MINT-JOHN");
//! ```

use crate::catalog::AppSettings;
use crate::types::OrderLine;

/// Returned for lines whose type is not in the catalog.
pub const UNKNOWN_SKU: &str = "UNKNOWN";

const MODEL_PLACEHOLDER: &str = "MODEL";
const COLOR_PLACEHOLDER: &str = "COLOR";
const NAME_PLACEHOLDER: &str = "NAME";

/// Computes the SKU for `line` against the current catalog.
///
/// Pure. The result is what `line.sku` must hold after any change to the
/// line's type, model, color or name.
pub fn generate_sku(line: &OrderLine, settings: &AppSettings) -> String {
    derive_sku(settings, &line.line_type, &line.model, &line.color, &line.name)
}

/// Computes a SKU from raw attributes.
pub fn derive_sku(
    settings: &AppSettings,
    line_type: &str,
    model: &str,
    color: &str,
    name: &str,
) -> String {
    let Some(lt) = settings.line_type(line_type) else {
        return UNKNOWN_SKU.to_string();
    };

    if lt.has_fixed_sku() {
        return lt.sku_fixed.clone();
    }

    let mut sku = lt.sku_prefix.clone();

    if lt.requires_model {
        sku.push('-');
        sku.push_str(non_empty_or(model, MODEL_PLACEHOLDER));
    }
    if lt.requires_color {
        sku.push('-');
        sku.push_str(non_empty_or(color, COLOR_PLACEHOLDER));
    }
    if lt.requires_name {
        let raw = non_empty_or(name, NAME_PLACEHOLDER);
        let clean = if settings.rules.name_normalize {
            capitalize(raw)
        } else {
            raw.to_string()
        };
        sku.push('-');
        sku.extend(clean.chars().filter(|c| !c.is_whitespace()));
    }

    sku.to_uppercase()
}

/// Upper-cases the first character and lower-cases the rest.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn non_empty_or<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() {
        placeholder
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn line(line_type: &str, model: &str, color: &str, name: &str) -> OrderLine {
        OrderLine {
            id: "l1".to_string(),
            line_type: line_type.to_string(),
            model: model.to_string(),
            color: color.to_string(),
            name: name.to_string(),
            qty: 1,
            sku: String::new(),
            pvd_unit: Money::zero(),
            pvp_unit: Money::zero(),
        }
    }

    #[test]
    fn test_generic_line() {
        let settings = AppSettings::default();
        let sku = generate_sku(&line("GEN", "B01", "MINT", "ignored"), &settings);
        assert_eq!(sku, "BRIIK-GEN-B01-MINT");
    }

    #[test]
    fn test_personalized_name_is_normalized() {
        let mut settings = AppSettings::default();
        // a name-bearing GEN variant, as in the documented example
        settings.line_types[0].requires_name = true;

        let sku = generate_sku(&line("GEN", "B01", "MINT", "joHN"), &settings);
        assert_eq!(sku, "BRIIK-GEN-B01-MINT-JOHN");
    }

    #[test]
    fn test_name_whitespace_stripped() {
        let settings = AppSettings::default();
        let sku = generate_sku(&line("PER", "B02", "NEOPINK", "ana  maría"), &settings);
        assert_eq!(sku, "BRIIK-PER-B02-NEOPINK-ANAMARÍA");
    }

    #[test]
    fn test_placeholders_for_missing_values() {
        let settings = AppSettings::default();
        let sku = generate_sku(&line("PER", "", "", ""), &settings);
        assert_eq!(sku, "BRIIK-PER-MODEL-COLOR-NAME");
    }

    #[test]
    fn test_fixed_sku_wins() {
        let settings = AppSettings::default();
        let sku = generate_sku(&line("PACK3_PER", "B01", "MINT", "Leo"), &settings);
        assert_eq!(sku, "BRIIK-PACK3-PER");
    }

    #[test]
    fn test_fixed_sku_is_verbatim() {
        let mut settings = AppSettings::default();
        settings.line_types[2].sku_fixed = "briik-Pack".to_string();
        let sku = generate_sku(&line("PACK3_GEN", "", "", ""), &settings);
        assert_eq!(sku, "briik-Pack");
    }

    #[test]
    fn test_unknown_type() {
        let settings = AppSettings::default();
        assert_eq!(generate_sku(&line("ZZZ", "B01", "MINT", ""), &settings), UNKNOWN_SKU);
    }

    #[test]
    fn test_without_normalization() {
        let mut settings = AppSettings::default();
        settings.rules.name_normalize = false;
        let sku = generate_sku(&line("PER", "b01", "mint", "mc Lean"), &settings);
        assert_eq!(sku, "BRIIK-PER-B01-MINT-MCLEAN");
    }

    #[test]
    fn test_generation_is_idempotent() {
        let settings = AppSettings::default();
        let mut l = line("PER", "B03", "QUARTZ", "lucía");
        l.sku = generate_sku(&l, &settings);
        let again = generate_sku(&l, &settings);
        assert_eq!(l.sku, again);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("joHN"), "John");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("élodie"), "Élodie");
    }
}
