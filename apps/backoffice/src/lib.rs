//! # BRIIK Back Office
//!
//! Application layer over the BRIIK crates: configuration, logging, the
//! optimistic workspace, file transfer, document rendering and the `briik`
//! command line.
//!
//! ## Module Organization
//! ```text
//! briik_backoffice/
//! ├── lib.rs          ◄─── You are here (logging bootstrap)
//! ├── config.rs       ◄─── BackofficeConfig (env > config.toml > defaults)
//! ├── error.rs        ◄─── ApiError { code, message }
//! ├── persistence.rs  ◄─── Persistence trait, implemented by briik_db::Database
//! ├── state/
//! │   ├── tracked.rs  ◄─── Tracked<T>, RecordState, Selection
//! │   └── workspace.rs◄─── Workspace (two-phase commit, invoices, import/sync)
//! ├── services/
//! │   └── transfer.rs ◄─── XML files in/out, rendered documents
//! ├── render.rs       ◄─── DocumentRenderer, TextRenderer
//! └── cli.rs          ◄─── clap subcommands
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Parse arguments (clap)                                              │
//! │  2. Load configuration ──────► BRIIK_* env, config.toml, defaults       │
//! │  3. Initialize logging ──────► RUST_LOG or config.log_filter            │
//! │  4. Open database ───────────► SQLite (WAL), run migrations             │
//! │  5. Load workspace ──────────► settings (seeded on first run),          │
//! │                                stores, orders                           │
//! │  6. Run the command, print its output or a single error line            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod persistence;
pub mod render;
pub mod services;
pub mod state;

use tracing_subscriber::EnvFilter;

pub use config::BackofficeConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use persistence::Persistence;
pub use state::Workspace;

/// Initializes the tracing subscriber. Logs go to stderr so command output
/// on stdout stays clean.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=briik=trace` - Show trace for briik crates only
/// - Default: `filter` (from configuration)
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // a second initialization (tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
