//! # State Module
//!
//! Session state of the back office.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                        Workspace                                │   │
//! │  │                                                                 │   │
//! │  │  Tracked<AppSettings>                                           │   │
//! │  │  Vec<Tracked<Store>>     Pending ──save──► Confirmed            │   │
//! │  │  Vec<Tracked<Order>>                                            │   │
//! │  │  Selection               ids, rewritten on remap                │   │
//! │  └──────────────────────────────┬──────────────────────────────────┘   │
//! │                                 │ Arc<dyn Persistence>                  │
//! │                                 ▼                                       │
//! │                      briik_db::Database (SQLite)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod tracked;
mod workspace;

pub use tracked::{RecordState, Selection, Tracked};
pub use workspace::{ImportSummary, SyncReport, Workspace};
