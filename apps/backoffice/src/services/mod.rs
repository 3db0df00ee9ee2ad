//! Operations that combine the workspace with the file system.

pub mod transfer;

pub use transfer::{default_export_file_name, export_to_file, import_from_file, render_to_file};
