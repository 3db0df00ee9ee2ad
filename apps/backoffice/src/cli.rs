//! # Command Line
//!
//! `briik` subcommands. Each command runs against a loaded [`Workspace`]
//! and returns the text to print; the binary decides where it goes.
//!
//! ```text
//! briik export [PATH]                      BRIIKData file (default name in export_dir)
//! briik import PATH                        replace local data, push to storage
//! briik totals ORDER_NUMBER                amounts, taxes and advisories
//! briik invoice ORDER_NUMBER               issue (or show) the invoice number
//! briik document ORDER_NUMBER KIND         render invoice | delivery-note
//! briik stats                              dashboard + inventory summary
//! briik config show | init                 runtime configuration
//! ```

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use briik_core::{DocumentKind, Order};
use briik_db::{Database, DbConfig};

use crate::config::{default_config_path, BackofficeConfig};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::render::TextRenderer;
use crate::services;
use crate::state::Workspace;

#[derive(Debug, Parser)]
#[command(name = "briik", version, about = "BRIIK B2B order back office")]
pub struct Cli {
    /// SQLite database file, overriding the configuration
    #[arg(long, global = true, value_name = "FILE")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Export everything as a BRIIKData XML file
    Export {
        /// Output file (default: <export_dir>/briik_pedidos_<date>.xml)
        path: Option<PathBuf>,
    },

    /// Replace local data with a BRIIKData XML file
    Import { path: PathBuf },

    /// Show the totals of an order
    Totals { order_number: String },

    /// Issue the invoice number of an order
    Invoice { order_number: String },

    /// Render an invoice or delivery note
    Document {
        order_number: String,

        #[arg(value_enum)]
        kind: DocumentArg,

        /// Output directory (default: export_dir)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Dashboard figures and inventory summary
    Stats,

    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocumentArg {
    Invoice,
    DeliveryNote,
}

impl From<DocumentArg> for DocumentKind {
    fn from(arg: DocumentArg) -> Self {
        match arg {
            DocumentArg::Invoice => DocumentKind::Invoice,
            DocumentArg::DeliveryNote => DocumentKind::DeliveryNote,
        }
    }
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Print the active configuration
    Show,
    /// Write the defaults to the configuration file
    Init,
}

// =============================================================================
// Entry Points
// =============================================================================

/// Opens the database named by `config` and runs `command`.
pub async fn run(cli: Cli, mut config: BackofficeConfig) -> ApiResult<String> {
    if let Some(path) = cli.database {
        config.database_path = path;
    }

    let db = Database::new(DbConfig::new(config.database_path.clone())).await?;
    let mut workspace = Workspace::load(Arc::new(db.clone()), config.invoice_retry_limit).await?;

    let today = chrono::Local::now().date_naive();
    let output = execute(cli.command, &mut workspace, &config, today).await;

    db.close().await;
    output
}

/// Runs a `config` subcommand. Works even when the configuration is broken.
pub fn run_config(action: ConfigAction) -> ApiResult<String> {
    match action {
        ConfigAction::Show => {
            let config = BackofficeConfig::load_or_default();
            toml::to_string_pretty(&config)
                .map_err(|e| ApiError::new(ErrorCode::ConfigError, e.to_string()))
        }
        ConfigAction::Init => {
            let path = default_config_path()?;
            if path.exists() {
                return Err(ApiError::new(
                    ErrorCode::ConfigError,
                    format!("{} already exists", path.display()),
                ));
            }
            BackofficeConfig::default().save(&path)?;
            Ok(format!("Wrote {}\n", path.display()))
        }
    }
}

/// Runs one data command against `workspace`.
pub async fn execute(
    command: Command,
    workspace: &mut Workspace,
    config: &BackofficeConfig,
    today: NaiveDate,
) -> ApiResult<String> {
    info!(?command, "Running command");

    match command {
        Command::Export { path } => {
            let written =
                services::export_to_file(workspace, path.as_deref(), &config.export_dir, today)
                    .await?;
            Ok(format!("Exported to {}\n", written.display()))
        }

        Command::Import { path } => {
            let (summary, report) = services::import_from_file(workspace, &path, today).await?;
            if !report.is_clean() {
                return Err(ApiError::new(
                    ErrorCode::DatabaseError,
                    format!(
                        "Imported, but {} change(s) could not be saved: {}",
                        report.failures.len(),
                        report.failures.join("; ")
                    ),
                ));
            }
            Ok(format!(
                "Imported {} store(s) and {} order(s){}; removed {} record(s)\n",
                summary.stores,
                summary.orders,
                if summary.settings_replaced { " with settings" } else { "" },
                report.deleted
            ))
        }

        Command::Totals { order_number } => {
            let order = find_order(workspace, &order_number)?.clone();
            totals_report(workspace, &order)
        }

        Command::Invoice { order_number } => {
            let order_id = find_order(workspace, &order_number)?.id.clone();
            let issue = workspace.issue_invoice(&order_id).await?;
            if issue.is_new() {
                Ok(format!("Issued invoice {} for {}\n", issue.number(), order_number))
            } else {
                Ok(format!("{} already has invoice {}\n", order_number, issue.number()))
            }
        }

        Command::Document {
            order_number,
            kind,
            out,
        } => {
            let order_id = find_order(workspace, &order_number)?.id.clone();
            let dir = out.unwrap_or_else(|| config.export_dir.clone());
            let written =
                services::render_to_file(workspace, &order_id, kind.into(), &TextRenderer, &dir)
                    .await?;
            Ok(format!("Wrote {}\n", written.display()))
        }

        Command::Stats => stats_report(workspace).await,

        Command::Config { action } => run_config(action),
    }
}

// =============================================================================
// Reports
// =============================================================================

fn find_order<'a>(workspace: &'a Workspace, number: &str) -> ApiResult<&'a Order> {
    workspace
        .order_by_number(number)
        .ok_or_else(|| ApiError::not_found("Order", number))
}

fn totals_report(workspace: &Workspace, order: &Order) -> ApiResult<String> {
    let totals = workspace.order_totals(&order.id)?;
    let taxes = workspace.tax_breakdown(&order.id)?;
    let store = workspace
        .store(&order.store_id)
        .map(|s| s.name.as_str())
        .unwrap_or("?");

    let mut out = String::new();
    let mut put = |line: String| {
        out.push_str(&line);
        out.push('\n');
    };

    put(format!("{} ({}) {}", order.number, store, order.date));
    put(format!(
        "Units:       {} ({} equivalent)",
        totals.real_units, totals.equivalence_units
    ));
    put(format!("Subtotal:    {}", totals.subtotal));
    put(format!(
        "Shipping:    {}{}",
        totals.shipping,
        if totals.free_shipping { " (waived)" } else { "" }
    ));
    put(format!("Total PVD:   {}", totals.total));
    if let Some(vat) = taxes.vat {
        put(format!("VAT {}:   {}", vat.rate, vat.amount));
    }
    if let Some(re) = taxes.re {
        put(format!("RE {}:   {}", re.rate, re.amount));
    }
    put(format!("Invoice:     {}", taxes.total));
    if let Some(number) = &order.invoice_number {
        put(format!("Invoice no.: {number}"));
    }

    let advisories = workspace.advisories(&order.id)?;
    if !advisories.is_empty() {
        put("Warnings:".to_string());
        for advisory in advisories {
            put(format!("  - {advisory}"));
        }
    }

    Ok(out)
}

async fn stats_report(workspace: &Workspace) -> ApiResult<String> {
    let stats = workspace.dashboard();
    let inventory = workspace.inventory().await?;

    let mut out = String::new();
    let write = |out: &mut String| -> std::fmt::Result {
        writeln!(out, "Revenue (PVD):     {}", stats.total_pvd)?;
        writeln!(out, "Orders:            {}", stats.total_orders)?;
        writeln!(out, "Equivalent units:  {}", stats.total_equivalence_units)?;
        writeln!(out, "Stores:            {}", stats.active_stores)?;

        writeln!(out, "Top stores:")?;
        for ranked in &stats.top_stores {
            writeln!(out, "  {:<30} {}", ranked.label, ranked.value)?;
        }
        writeln!(out, "Units by type:")?;
        for ranked in &stats.type_distribution {
            writeln!(out, "  {:<30} {}", ranked.label, ranked.value)?;
        }
        writeln!(out, "Top models:")?;
        for ranked in &stats.top_models {
            writeln!(out, "  {:<30} {}", ranked.label, ranked.value)?;
        }
        writeln!(out, "Top colors:")?;
        for ranked in &stats.top_colors {
            writeln!(out, "  {:<30} {}", ranked.label, ranked.value)?;
        }

        let stock_units: u64 = inventory.product_stock.iter().map(|p| u64::from(p.qty)).sum();
        writeln!(out, "Inventory:")?;
        writeln!(out, "  Deposits:          {}", inventory.deposits.len())?;
        writeln!(
            out,
            "  Supplier invoices: {} ({})",
            inventory.supplier_invoices.len(),
            inventory.supplier_spend()
        )?;
        writeln!(out, "  Raw stock items:   {}", inventory.raw_stock.len())?;
        writeln!(out, "  Product units:     {stock_units}")?;
        Ok(())
    };
    write(&mut out).map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use briik_core::order::LineEdit;
    use briik_core::Store;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn config(dir: &std::path::Path) -> BackofficeConfig {
        BackofficeConfig {
            database_path: PathBuf::from(":memory:"),
            export_dir: dir.to_path_buf(),
            ..BackofficeConfig::default()
        }
    }

    async fn workspace_with_order() -> Workspace {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut ws = Workspace::load(Arc::new(db), 5).await.unwrap();

        let mut store = Store::new("Luna", "Vigo");
        store.requires_re = true;
        let store_id = ws.create_store(store).await.unwrap();
        let order_id = ws.create_order(&store_id, day()).await.unwrap();
        let line_id = ws.add_line(&order_id).await.unwrap();
        ws.update_line(&order_id, &line_id, LineEdit::Qty(3)).await.unwrap();
        ws
    }

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["briik", "document", "PED-0001", "delivery-note"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Document {
                kind: DocumentArg::DeliveryNote,
                ..
            }
        ));

        let cli = Cli::try_parse_from(["briik", "--database", "x.db", "export"]).unwrap();
        assert_eq!(cli.database, Some(PathBuf::from("x.db")));
        assert!(matches!(cli.command, Command::Export { path: None }));

        assert!(Cli::try_parse_from(["briik", "document", "PED-0001", "receipt"]).is_err());
        assert!(Cli::try_parse_from(["briik", "import"]).is_err());
    }

    #[tokio::test]
    async fn test_totals_report() {
        let mut ws = workspace_with_order().await;
        let dir = std::env::temp_dir();
        let out = execute(
            Command::Totals {
                order_number: "PED-0001".into(),
            },
            &mut ws,
            &config(&dir),
            day(),
        )
        .await
        .unwrap();

        // 3 × 6.40 = 19.20, below 50.00 so 7.50 shipping
        assert!(out.contains("Subtotal:    19.20€"));
        assert!(out.contains("Shipping:    7.50€"));
        assert!(out.contains("Total PVD:   26.70€"));
        assert!(out.contains("RE 5.2%"));
        assert!(out.contains("Warnings:"));
    }

    #[tokio::test]
    async fn test_invoice_command_is_idempotent() {
        let mut ws = workspace_with_order().await;
        let config = config(&std::env::temp_dir());
        let invoice = || Command::Invoice {
            order_number: "PED-0001".into(),
        };

        let first = execute(invoice(), &mut ws, &config, day()).await.unwrap();
        assert_eq!(first, "Issued invoice INV-2026-0001 for PED-0001\n");

        let second = execute(invoice(), &mut ws, &config, day()).await.unwrap();
        assert_eq!(second, "PED-0001 already has invoice INV-2026-0001\n");
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let mut ws = workspace_with_order().await;
        let err = execute(
            Command::Totals {
                order_number: "PED-9999".into(),
            },
            &mut ws,
            &config(&std::env::temp_dir()),
            day(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Order not found: PED-9999");
    }

    #[tokio::test]
    async fn test_export_uses_default_name() {
        let dir = std::env::temp_dir().join(format!("briik-cli-{}", briik_core::new_id()));
        let mut ws = workspace_with_order().await;

        let out = execute(Command::Export { path: None }, &mut ws, &config(&dir), day())
            .await
            .unwrap();

        let expected = dir.join("briik_pedidos_2026-10-18.xml");
        assert_eq!(out, format!("Exported to {}\n", expected.display()));
        assert!(expected.exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_stats_report() {
        let mut ws = workspace_with_order().await;
        let out = execute(Command::Stats, &mut ws, &config(&std::env::temp_dir()), day())
            .await
            .unwrap();

        assert!(out.contains("Revenue (PVD):     26.70€"));
        assert!(out.contains("Orders:            1"));
        assert!(out.contains("Luna"));
        assert!(out.contains("Deposits:          0"));
    }
}
