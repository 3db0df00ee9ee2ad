//! # Repository Module
//!
//! One repository per entity family, each a thin wrapper around a pool clone.
//!
//! ## Save Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save(record with client id)                                           │
//! │       │                                                                 │
//! │       ├── id is a UUID?  yes → keep it      no → assign a new UUID      │
//! │       │                                                                 │
//! │       ├── row exists?    yes → UPDATE       no → INSERT                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  returns the record as stored (confirmed id may differ from input)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`StoreRepository`](store::StoreRepository) - Stores
//! - [`OrderRepository`](order::OrderRepository) - Orders with their lines, invoice assignment
//! - [`SettingsRepository`](settings::SettingsRepository) - Settings row, invoice counter CAS
//! - [`InventoryRepository`](inventory::InventoryRepository) - Deposits, supplier invoices, stock

pub mod inventory;
pub mod order;
pub mod settings;
pub mod store;

use briik_core::types::{is_confirmed_id, new_id};

use crate::error::{DbError, DbResult};

/// The id a record is stored under.
pub(crate) fn confirm_id(client_id: &str) -> String {
    if is_confirmed_id(client_id) {
        client_id.to_string()
    } else {
        new_id()
    }
}

/// Narrows an INTEGER column to an unsigned domain quantity.
pub(crate) fn to_u32(column: &str, value: i64) -> DbResult<u32> {
    u32::try_from(value).map_err(|_| DbError::invalid_data(column, format!("{value} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_id() {
        let uuid = new_id();
        assert_eq!(confirm_id(&uuid), uuid);

        let local = confirm_id("tmp-1");
        assert_ne!(local, "tmp-1");
        assert!(is_confirmed_id(&local));
    }

    #[test]
    fn test_to_u32() {
        assert_eq!(to_u32("qty", 3).unwrap(), 3);
        assert!(matches!(
            to_u32("qty", -1),
            Err(DbError::InvalidData { column, .. }) if column == "qty"
        ));
    }
}
