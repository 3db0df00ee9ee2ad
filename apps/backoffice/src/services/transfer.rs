//! # File Transfer
//!
//! Moves BRIIKData documents and rendered documents between the workspace
//! and the file system.
//!
//! ```text
//! export:  Workspace ──export_xml──► String ──tokio::fs::write──► file
//! import:  file ──read_to_string──► import_xml ──► sync_pending ──► SQLite
//! render:  Workspace ──document──► PreparedDocument ──renderer──► file
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use briik_core::DocumentKind;

use crate::error::ApiResult;
use crate::render::DocumentRenderer;
use crate::state::{ImportSummary, SyncReport, Workspace};

/// `briik_pedidos_<YYYY-MM-DD>.xml`
pub fn default_export_file_name(date: NaiveDate) -> String {
    format!("briik_pedidos_{}.xml", date.format("%Y-%m-%d"))
}

/// Writes the workspace as a BRIIKData document.
///
/// Without an explicit `path` the file goes to `export_dir` under the
/// default name for `today`. Returns the path written.
pub async fn export_to_file(
    workspace: &Workspace,
    path: Option<&Path>,
    export_dir: &Path,
    today: NaiveDate,
) -> ApiResult<PathBuf> {
    let xml = workspace.export_xml()?;
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| export_dir.join(default_export_file_name(today)));

    write_file(&path, xml.as_bytes()).await?;
    info!(path = %path.display(), bytes = xml.len(), "Exported BRIIKData file");
    Ok(path)
}

/// Reads a BRIIKData file into the workspace and pushes it to storage.
///
/// A file that cannot be read or parsed leaves the workspace untouched.
pub async fn import_from_file(
    workspace: &mut Workspace,
    path: &Path,
    today: NaiveDate,
) -> ApiResult<(ImportSummary, SyncReport)> {
    let xml = tokio::fs::read_to_string(path).await?;
    let summary = workspace.import_xml(&xml, today)?;
    let report = workspace.sync_pending().await;

    info!(path = %path.display(), clean = report.is_clean(), "Imported BRIIKData file");
    Ok((summary, report))
}

/// Renders an invoice or delivery note into `dir`. The file name comes
/// from the prepared document with the renderer's extension.
pub async fn render_to_file(
    workspace: &Workspace,
    order_id: &str,
    kind: DocumentKind,
    renderer: &dyn DocumentRenderer,
    dir: &Path,
) -> ApiResult<PathBuf> {
    let document = workspace.document(order_id, kind)?;
    let bytes = renderer.render(&document)?;

    let path = dir
        .join(&document.file_name)
        .with_extension(renderer.extension());
    write_file(&path, &bytes).await?;

    info!(path = %path.display(), number = %document.number, "Rendered document");
    Ok(path)
}

async fn write_file(path: &Path, bytes: &[u8]) -> ApiResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}
