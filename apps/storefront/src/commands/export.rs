//! # Export Command
//!
//! Writes a JSON or CSV export of a data snapshot into a directory.
//!
//! ```text
//! --snapshot file.json ──► ExportSnapshot::from_json ──┐
//!                                                      ├──► Exporter ──► <out>/storefront-export-YYYY-MM-DD.<ext>
//! (no snapshot) ──► catalog.refresh() ──► products ────┘
//! ```
//!
//! Without `--snapshot` only the `products` table has rows, taken from the
//! live catalog. The catalog is not contacted unless `products` is requested.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use storefront_core::export::{
    ExportFormat, ExportRequest, ExportSnapshot, Exporter, RedactionPolicy, TableName,
};

use super::to_output;
use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// json or csv
    #[arg(long, default_value = "json")]
    pub format: String,

    /// Comma-separated tables: products, messages, users
    #[arg(long, value_delimiter = ',', default_value = "products")]
    pub tables: Vec<String>,

    /// JSON file holding `{ "<table>": [records...] }`
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Output directory (defaults to the current directory)
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub path: PathBuf,
    pub filename: String,
    pub format: ExportFormat,
    pub bytes: usize,
}

pub async fn run(state: &mut AppState, args: ExportArgs) -> AppResult<Value> {
    to_output(export_to(state, args, Local::now().date_naive()).await?)
}

/// Runs the export dated `date`.
pub async fn export_to(
    state: &AppState,
    args: ExportArgs,
    date: NaiveDate,
) -> AppResult<ExportSummary> {
    debug!(format = %args.format, tables = ?args.tables, "export command");

    let tables: Vec<&str> = args.tables.iter().map(String::as_str).collect();
    let request = ExportRequest::parse(&args.format, &tables)?;

    let snapshot = match &args.snapshot {
        Some(path) => read_snapshot(path)?,
        None if request.includes(TableName::Products) => catalog_snapshot(state).await?,
        None => ExportSnapshot::new(),
    };

    let output = Exporter::new(RedactionPolicy::default()).export(&snapshot, &request, date)?;

    std::fs::create_dir_all(&args.out)?;
    let path = args.out.join(&output.filename);
    std::fs::write(&path, &output.content)?;

    info!(path = %path.display(), bytes = output.content.len(), "Export written");
    Ok(ExportSummary {
        path,
        filename: output.filename,
        format: output.format,
        bytes: output.content.len(),
    })
}

fn read_snapshot(path: &Path) -> AppResult<ExportSnapshot> {
    let contents = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&contents)?;
    Ok(ExportSnapshot::from_json(value)?)
}

async fn catalog_snapshot(state: &AppState) -> AppResult<ExportSnapshot> {
    state.catalog.refresh().await?;

    let mut records = Vec::new();
    for product in state.catalog.products() {
        if let Value::Object(record) = serde_json::to_value(&product)? {
            records.push(record);
        }
    }
    Ok(ExportSnapshot::new().with_table(TableName::Products, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;
    use std::sync::Arc;
    use storefront_store::{MemorySlot, NoOpSink};
    use storefront_sync::{MemoryCatalogBackend, RetryPolicy};

    fn state(records: Vec<Value>) -> AppState {
        state_over(Arc::new(MemoryCatalogBackend::with_records(records)))
    }

    fn state_over(backend: Arc<MemoryCatalogBackend>) -> AppState {
        AppState::new(
            backend,
            RetryPolicy::default(),
            Arc::new(MemorySlot::new()),
            Arc::new(NoOpSink),
        )
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn args(format: &str, tables: &[&str], snapshot: Option<PathBuf>, out: &Path) -> ExportArgs {
        ExportArgs {
            format: format.to_string(),
            tables: tables.iter().map(|t| t.to_string()).collect(),
            snapshot,
            out: out.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn test_csv_from_snapshot_file_redacts_passwords() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot_path = dir.path().join("snapshot.json");
        std::fs::write(
            &snapshot_path,
            json!({
                "products": [{"id": 1, "name": "A,B", "price": 5}],
                "users": [{"id": 7, "email": "ana@example.com", "password": "hunter2"}]
            })
            .to_string(),
        )
        .unwrap();

        let summary = export_to(
            &state(vec![]),
            args("csv", &["products", "users"], Some(snapshot_path), dir.path()),
            date(),
        )
        .await
        .unwrap();

        assert_eq!(summary.filename, "storefront-export-2024-03-09.csv");
        let written = std::fs::read_to_string(&summary.path).unwrap();
        assert_eq!(written.len(), summary.bytes);
        assert!(written.contains("1,\"A,B\",5"));
        assert!(written.contains("[PROTECTED]"));
        assert!(!written.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_json_from_live_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(vec![
            json!({"id": "p1", "name": "Fan", "price": 35.25, "stock": 4, "category": "misc"}),
        ]);

        let summary = export_to(&state, args("json", &["products"], None, dir.path()), date())
            .await
            .unwrap();

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&summary.path).unwrap()).unwrap();
        assert_eq!(written["products"][0]["name"], "Fan");
        assert_eq!(written["products"][0]["price"], json!(35.25));
    }

    #[tokio::test]
    async fn test_nothing_to_export() {
        let dir = tempfile::tempdir().unwrap();

        let err = export_to(&state(vec![]), args("csv", &[], None, dir.path()), date())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ExportEmpty);

        let err = export_to(&state(vec![]), args("xml", &["products"], None, dir.path()), date())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = export_to(&state(vec![]), args("csv", &[""], None, dir.path()), date())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ExportEmpty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_catalog_untouched_without_products_table() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MemoryCatalogBackend::new());
        backend.fail_next(3);
        let state = state_over(Arc::clone(&backend));

        let err = export_to(&state, args("json", &["users"], None, dir.path()), date())
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ExportEmpty);
        assert_eq!(backend.calls(), 0);
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
