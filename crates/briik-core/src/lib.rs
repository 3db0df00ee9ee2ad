//! # briik-core: Pure Business Logic for the BRIIK Back Office
//!
//! This crate is the **heart** of the back office. It contains all order
//! pricing and document logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      BRIIK Back Office Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              apps/backoffice (workspace + CLI)                  │   │
//! │  │   stores ──► orders ──► invoice ──► documents ──► XML transfer  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ briik-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  catalog  │  │    sku    │  │  pricing  │  │  invoice  │  │   │
//! │  │   │  Rules    │  │ generate  │  │  totals   │  │  counter  │  │   │
//! │  │   │  Billing  │  │           │  │  VAT + RE │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌──────────────────────┐  ┌───▼──────────────────────────────────┐   │
//! │  │ briik-xml (codec)    │  │ briik-db (SQLite repositories)       │   │
//! │  └──────────────────────┘  └──────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money (cents) and TaxRate (basis points)
//! - [`catalog`] - Rules, billing, statuses, models, colors, line types
//! - [`types`] - Store, Order, OrderLine, AppData
//! - [`sku`] - SKU derivation
//! - [`pricing`] - Line/order totals, shipping waiver, VAT + RE
//! - [`invoice`] - Invoice number issuance
//! - [`order`] - Creating, editing and cloning orders
//! - [`directory`] - Store search and per-store order lists
//! - [`validation`] - Hard validation and advisories
//! - [`document`] - Renderer input for invoices and delivery notes
//! - [`analytics`] - Dashboard aggregates
//! - [`inventory`] - Deposits, supplier invoices, stock
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: settings are passed in, never read from ambient state
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64)
//! 4. **Totals Are Derived**: never stored, always recomputed from lines
//!
//! ## Example Usage
//!
//! ```rust
//! use briik_core::catalog::AppSettings;
//! use briik_core::order::{add_line, new_order, update_line, LineEdit};
//! use briik_core::pricing::order_totals;
//!
//! let settings = AppSettings::default();
//! let date = chrono::NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
//! let mut order = new_order("store-1", &settings, 0, date);
//!
//! let line_id = add_line(&mut order, &settings).unwrap();
//! update_line(&mut order, &line_id, LineEdit::Qty(10), &settings).unwrap();
//!
//! // 10 × 6.40€ = 64.00€, above the 50€ threshold: shipping waived
//! let totals = order_totals(&order, &settings.line_types);
//! assert_eq!(totals.total.cents(), 6400);
//! assert!(totals.free_shipping);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod catalog;
pub mod directory;
pub mod document;
pub mod error;
pub mod inventory;
pub mod invoice;
pub mod money;
pub mod order;
pub mod pricing;
pub mod sku;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use briik_core::Money` instead of
// `use briik_core::money::Money`

pub use catalog::{AppSettings, BillingInfo, Color, LineType, Model, Rules, Status};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, TaxRate};
pub use pricing::DocumentKind;
pub use types::*;
