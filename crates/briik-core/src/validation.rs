//! # Validation Module
//!
//! Hard validation (blocks a save) and advisories (shown, never blocking).
//!
//! ## Two Severities
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ValidationError  ── blocks the save                                    │
//! │  ├── store name empty                                                   │
//! │  ├── line qty < 1                                                       │
//! │  └── order.store_id points at no store                                  │
//! │                                                                         │
//! │  Advisory         ── displayed next to the order, save goes through     │
//! │  ├── MOQ not reached (real units)                                       │
//! │  ├── personalised lines (longer lead time)                              │
//! │  ├── name too long / emoji in name                                      │
//! │  ├── model / color / name missing for the line type                     │
//! │  └── dangling catalog references (type, model, color, status)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Catalog keys stay plain strings in storage. They are checked here, at the
//! boundary, instead of by foreign keys.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use ts_rs::TS;

use crate::catalog::AppSettings;
use crate::error::ValidationError;
use crate::pricing::real_units;
use crate::types::{Order, Store};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Hard Validators
// =============================================================================

/// A store needs a name. Everything else is optional.
pub fn validate_store(store: &Store) -> ValidationResult<()> {
    if store.name.trim().is_empty() {
        return Err(ValidationError::required("store name"));
    }
    Ok(())
}

/// Line quantities start at one.
///
/// ## Example
/// ```rust
/// use briik_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(0).is_err());
/// ```
pub fn validate_quantity(qty: u32) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::BelowMinimum {
            field: "qty".to_string(),
            min: 1,
        });
    }
    Ok(())
}

/// Checks an order before it is persisted.
pub fn validate_order(order: &Order, stores: &[Store]) -> ValidationResult<()> {
    if !stores.iter().any(|s| s.id == order.store_id) {
        return Err(ValidationError::unknown_reference("store", &order.store_id));
    }
    for line in &order.lines {
        validate_quantity(line.qty)?;
    }
    Ok(())
}

/// Reports catalog problems: duplicate keys and line types whose SKU source
/// is ambiguous.
///
/// Returns every problem found; an empty list means the settings are sound.
pub fn validate_settings(settings: &AppSettings) -> Vec<ValidationError> {
    let mut issues = Vec::new();

    find_duplicates("status", settings.statuses.iter().map(|s| s.name.as_str()), &mut issues);
    find_duplicates("model", settings.models.iter().map(|m| m.code.as_str()), &mut issues);
    find_duplicates("color", settings.colors.iter().map(|c| c.code.as_str()), &mut issues);
    find_duplicates(
        "line type",
        settings.line_types.iter().map(|t| t.code_type.as_str()),
        &mut issues,
    );

    for lt in &settings.line_types {
        let has_prefix = !lt.sku_prefix.is_empty();
        let has_fixed = !lt.sku_fixed.is_empty();
        if has_prefix == has_fixed {
            issues.push(ValidationError::InvalidFormat {
                field: format!("line type {}", lt.code_type),
                reason: "exactly one of SKU prefix or fixed SKU must be set".to_string(),
            });
        }
        if lt.equivalence_units < 1 {
            issues.push(ValidationError::BelowMinimum {
                field: format!("equivalence units of {}", lt.code_type),
                min: 1,
            });
        }
    }

    issues
}

fn find_duplicates<'a>(
    field: &str,
    keys: impl Iterator<Item = &'a str>,
    issues: &mut Vec<ValidationError>,
) {
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            issues.push(ValidationError::Duplicate {
                field: field.to_string(),
                value: key.to_string(),
            });
        }
    }
}

// =============================================================================
// Advisories
// =============================================================================

/// Non-blocking notice attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    MoqNotReached { real_units: u64, moq: u32 },
    PersonalizedLines { count: usize, lead_time: String },
    NameTooLong { line_id: String, length: usize, max: u32 },
    EmojiInName { line_id: String },
    MissingModel { line_id: String },
    MissingColor { line_id: String },
    MissingName { line_id: String },
    UnknownLineType { line_id: String, code: String },
    UnknownModel { line_id: String, code: String },
    UnknownColor { line_id: String, code: String },
    UnknownStatus { status: String },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::MoqNotReached { real_units, moq } => {
                write!(f, "order has {real_units} units, below the minimum of {moq}")
            }
            Advisory::PersonalizedLines { count, lead_time } => {
                write!(f, "{count} personalised line(s), lead time {lead_time}")
            }
            Advisory::NameTooLong { line_id, length, max } => {
                write!(f, "line {line_id}: name has {length} characters, suggested max {max}")
            }
            Advisory::EmojiInName { line_id } => write!(f, "line {line_id}: name contains emoji"),
            Advisory::MissingModel { line_id } => write!(f, "line {line_id}: model missing"),
            Advisory::MissingColor { line_id } => write!(f, "line {line_id}: color missing"),
            Advisory::MissingName { line_id } => write!(f, "line {line_id}: name missing"),
            Advisory::UnknownLineType { line_id, code } => {
                write!(f, "line {line_id}: unknown line type '{code}'")
            }
            Advisory::UnknownModel { line_id, code } => {
                write!(f, "line {line_id}: unknown model '{code}'")
            }
            Advisory::UnknownColor { line_id, code } => {
                write!(f, "line {line_id}: unknown color '{code}'")
            }
            Advisory::UnknownStatus { status } => write!(f, "unknown status '{status}'"),
        }
    }
}

/// Collects every advisory for `order` under the current catalog.
pub fn order_advisories(order: &Order, settings: &AppSettings) -> Vec<Advisory> {
    let rules = &settings.rules;
    let mut out = Vec::new();

    let units = real_units(order);
    if units < rules.moq as u64 {
        out.push(Advisory::MoqNotReached {
            real_units: units,
            moq: rules.moq,
        });
    }

    if settings.status(&order.status).is_none() {
        out.push(Advisory::UnknownStatus {
            status: order.status.clone(),
        });
    }

    let mut personalized = 0;
    for line in &order.lines {
        let Some(lt) = settings.line_type(&line.line_type) else {
            out.push(Advisory::UnknownLineType {
                line_id: line.id.clone(),
                code: line.line_type.clone(),
            });
            continue;
        };

        if lt.requires_model {
            if line.model.is_empty() {
                out.push(Advisory::MissingModel { line_id: line.id.clone() });
            } else if settings.model(&line.model).is_none() {
                out.push(Advisory::UnknownModel {
                    line_id: line.id.clone(),
                    code: line.model.clone(),
                });
            }
        }

        if lt.requires_color {
            if line.color.is_empty() {
                out.push(Advisory::MissingColor { line_id: line.id.clone() });
            } else if settings.color(&line.color).is_none() {
                out.push(Advisory::UnknownColor {
                    line_id: line.id.clone(),
                    code: line.color.clone(),
                });
            }
        }

        if lt.requires_name {
            personalized += 1;
            let name = line.name.trim();
            if name.is_empty() {
                out.push(Advisory::MissingName { line_id: line.id.clone() });
            } else {
                let length = name.chars().count();
                if length > rules.name_max_suggested as usize {
                    out.push(Advisory::NameTooLong {
                        line_id: line.id.clone(),
                        length,
                        max: rules.name_max_suggested,
                    });
                }
                if !rules.allow_emojis && contains_emoji(name) {
                    out.push(Advisory::EmojiInName { line_id: line.id.clone() });
                }
            }
        }
    }

    if personalized > 0 {
        out.push(Advisory::PersonalizedLines {
            count: personalized,
            lead_time: rules.lead_time_personalized.clone(),
        });
    }

    out
}

/// Pictographic code points (emoji blocks, dingbats, variation selector).
pub fn contains_emoji(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(
            c as u32,
            0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0x2B00..=0x2BFF | 0xFE0F | 0x200D
        )
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
