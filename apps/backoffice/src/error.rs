//! # API Error Type
//!
//! Unified error type for back office operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Back Office                        │
//! │                                                                         │
//! │  CoreError (validation, missing billing) ──┐                           │
//! │  XmlError  (malformed document)  ──────────┤                           │
//! │  DbError   (storage failure)     ──────────┼──► ApiError {code, msg}   │
//! │  ConfigError                     ──────────┤         │                 │
//! │  std::io::Error (files)          ──────────┘         ▼                 │
//! │                                        CLI prints message, exit ≠ 0    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal failures are logged in full and surfaced with a generic message.

use serde::Serialize;

use briik_core::CoreError;
use briik_db::DbError;
use briik_xml::XmlError;

use crate::config::ConfigError;

/// Error returned by workspace and service operations.
///
/// ## Serialization
/// ```json
/// { "code": "NOT_FOUND", "message": "Order not found: PED-0042" }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Database operation failed
    DatabaseError,

    /// Business rule prevents the operation (e.g. billing not configured)
    BusinessLogic,

    /// Concurrent modification could not be resolved (invoice counter)
    Conflict,

    /// XML document could not be read
    ImportFailed,

    /// File system failure
    IoError,

    /// Configuration invalid
    ConfigError,

    /// Internal error
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{resource} not found: {id}"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } if value.is_empty() => {
                ApiError::conflict(format!("{field} already exists"))
            }
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("{field} '{value}' already exists"))
            }
            DbError::Locked => ApiError::conflict("Another session is writing, try again"),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::InvalidData { column, reason } => {
                tracing::error!(column = %column, "Invalid stored data: {}", reason);
                ApiError::new(ErrorCode::DatabaseError, "Stored data is corrupt")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::StoreNotFound(id) => ApiError::not_found("Store", &id),
            CoreError::OrderNotFound(id) => ApiError::not_found("Order", &id),
            CoreError::LineNotFound { order_id, line_id } => {
                ApiError::not_found("Line", &format!("{line_id} (order {order_id})"))
            }
            CoreError::EmptyCatalog | CoreError::BillingNotConfigured => {
                ApiError::new(ErrorCode::BusinessLogic, err.to_string())
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<briik_core::ValidationError> for ApiError {
    fn from(err: briik_core::ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// A document that cannot be read is rejected as a whole with a generic
/// message; the detail goes to the log.
impl From<XmlError> for ApiError {
    fn from(err: XmlError) -> Self {
        tracing::error!("XML import/export failed: {}", err);
        match err {
            XmlError::MissingRoot { .. } => ApiError::new(
                ErrorCode::ImportFailed,
                "The file is not a BRIIK data export",
            ),
            _ => ApiError::new(
                ErrorCode::ImportFailed,
                "The file could not be read as a BRIIK data export",
            ),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::new(ErrorCode::IoError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_conflict_maps_to_conflict() {
        let err: ApiError = DbError::UniqueViolation {
            field: "orders.invoice_number".into(),
            value: "INV-0001".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert!(err.message.contains("INV-0001"));
    }

    #[test]
    fn test_internal_details_hidden() {
        let err: ApiError = DbError::QueryFailed("near \"SELEC\": syntax error".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("SELEC"));
    }

    #[test]
    fn test_core_errors() {
        let err: ApiError = CoreError::BillingNotConfigured.into();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let err: ApiError = CoreError::OrderNotFound("PED-0009".into()).into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Order not found: PED-0009");
    }

    #[test]
    fn test_xml_errors_are_generic() {
        let err: ApiError = XmlError::MissingRoot {
            found: "Foo".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::ImportFailed);

        let err: ApiError = XmlError::EmptyDocument.into();
        assert_eq!(err.code, ErrorCode::ImportFailed);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_string(&ApiError::not_found("Store", "s1")).unwrap();
        assert_eq!(json, r#"{"code":"NOT_FOUND","message":"Store not found: s1"}"#);
    }
}
