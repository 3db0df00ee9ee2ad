//! # Storage Errors
//!
//! ```text
//! sqlx::Error ──► DbError ──► ApiError (backoffice)
//!
//! RowNotFound                        ► NotFound
//! Database(kind = UniqueViolation)   ► UniqueViolation { field }
//! Database(kind = ForeignKey...)     ► ForeignKeyViolation
//! Database("database is locked")     ► Locked
//! PoolTimedOut / PoolClosed / Io     ► ConnectionFailed
//! anything else                      ► QueryFailed
//! ```
//!
//! The workspace reacts to three of these: `NotFound` on deletes of records
//! that never reached storage, `UniqueViolation` while reserving invoice
//! numbers, and `Locked` when another session holds the write lock.

use std::borrow::Cow;

use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Deleting or updating an id that is not stored, or reading the
    /// invoice counter before settings exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// An invoice number held by another order, or a second stock row for
    /// the same model and color.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// An order pointing at a store that is not stored.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Another session kept the write lock past the busy timeout.
    #[error("Database is locked by another session")]
    Locked,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored value does not fit the domain type (negative quantity,
    /// unreadable JSON column).
    #[error("Invalid stored value in {column}: {reason}")]
    InvalidData { column: String, reason: String },
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn invalid_data(column: impl Into<String>, reason: impl Into<String>) -> Self {
        DbError::InvalidData {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// True for failures a caller may resolve by re-reading and retrying.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. } | DbError::Locked)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DbError::UniqueViolation {
                        // "UNIQUE constraint failed: orders.invoice_number"
                        field: message
                            .rsplit(": ")
                            .next()
                            .unwrap_or(message)
                            .to_string(),
                        value: String::new(),
                    },
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
                        message: message.to_string(),
                    },
                    _ if is_busy(db_err.code(), message) => DbError::Locked,
                    _ => DbError::QueryFailed(message.to_string()),
                }
            }

            sqlx::Error::PoolTimedOut => {
                DbError::ConnectionFailed("timed out waiting for a connection".to_string())
            }
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),

            other => DbError::QueryFailed(other.to_string()),
        }
    }
}

/// SQLITE_BUSY (5) and its extended codes, e.g. SQLITE_BUSY_SNAPSHOT (517).
fn is_busy(code: Option<Cow<'_, str>>, message: &str) -> bool {
    let by_code = code
        .and_then(|c| c.parse::<i32>().ok())
        .is_some_and(|c| c & 0xff == 5);
    by_code || message.contains("database is locked")
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::invalid_data("json", err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
