//! # briik-xml: BRIIKData Import/Export
//!
//! Converts the complete application state to and from the BRIIKData XML
//! document used for backups and for moving data between installations.
//!
//! ## Document Shape
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <BRIIKData version="1.1">
//!   <Settings>
//!     <Rules>…</Rules>  <Billing>…</Billing>
//!     <Statuses/> <Models/> <Colors/> <LineTypes/>
//!   </Settings>
//!   <Stores>
//!     <Store id="…"> Name City Address … Notes RequiresRE </Store>
//!   </Stores>
//!   <Orders>
//!     <Order id="…" storeId="…" number="PED-0001">
//!       InvoiceNumber Date Status <Shipping/> Notes ShippingOverride
//!       <Lines><Line id="…"> Type Model Color Name Qty SKU PVDUnit PVPUnit </Line></Lines>
//!     </Order>
//!   </Orders>
//! </BRIIKData>
//! ```
//!
//! ## Example
//! ```rust
//! use briik_core::types::AppData;
//! use briik_xml::{export_to_xml, import_from_xml};
//!
//! let data = AppData::default();
//! let xml = export_to_xml(&data).unwrap();
//!
//! let today = chrono::NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
//! let imported = import_from_xml(&xml, today).unwrap();
//! assert_eq!(imported.into_app_data(Default::default()), data);
//! ```

mod tree;

pub mod error;
pub mod export;
pub mod import;

/// Name of the document root element.
pub const ROOT_ELEMENT: &str = "BRIIKData";

pub use error::{XmlError, XmlResult};
pub use export::export_to_xml;
pub use import::{import_from_xml, ImportedData};
