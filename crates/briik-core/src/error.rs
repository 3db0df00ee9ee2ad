//! # Domain Errors
//!
//! ```text
//! ValidationError ──#[from]──► CoreError ──► ApiError (backoffice)
//!   Required            StoreNotFound / OrderNotFound / LineNotFound
//!   BelowMinimum        EmptyCatalog          (no line type to seed from)
//!   InvalidFormat       BillingNotConfigured  (no issuer on documents)
//!   UnknownReference
//!   Duplicate           XmlError and DbError come from their own crates
//! ```
//!
//! Only hard failures live here. MOQ warnings, long personalised names and
//! the like are [`Advisory`](crate::validation::Advisory) values and never
//! stop a save.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

#[derive(Debug, Error)]
pub enum CoreError {
    /// Store cannot be found by id.
    #[error("Store not found: {0}")]
    StoreNotFound(String),

    /// Order cannot be found by id or number.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Order line cannot be found inside its order.
    #[error("Line {line_id} not found in order {order_id}")]
    LineNotFound { order_id: String, line_id: String },

    /// The catalog has no line types, so no line can be created.
    #[error("Catalog has no line types configured")]
    EmptyCatalog,

    /// Issuer data is missing, documents cannot be produced.
    ///
    /// ## When This Occurs
    /// - `billing.company_name` is empty when preparing an invoice or
    ///   delivery note
    #[error("Billing details are not configured: set the company name in settings first")]
    BillingNotConfigured,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These block a save. Everything softer is an advisory.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be at least one.
    #[error("{field} must be at least {min}")]
    BelowMinimum { field: String, min: i64 },

    /// Invalid format (e.g., malformed decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A reference points at nothing.
    #[error("{field} '{value}' does not exist")]
    UnknownReference { field: String, value: String },

    /// Duplicate key in a catalog list.
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn unknown_reference(field: impl Into<String>, value: impl Into<String>) -> Self {
        ValidationError::UnknownReference {
            field: field.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::LineNotFound {
            order_id: "o-1".to_string(),
            line_id: "l-9".to_string(),
        };
        assert_eq!(err.to_string(), "Line l-9 not found in order o-1");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("store name");
        assert_eq!(err.to_string(), "store name is required");

        let err = ValidationError::BelowMinimum {
            field: "qty".to_string(),
            min: 1,
        };
        assert_eq!(err.to_string(), "qty must be at least 1");

        let err = ValidationError::unknown_reference("store", "s-404");
        assert_eq!(err.to_string(), "store 's-404' does not exist");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("name").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
