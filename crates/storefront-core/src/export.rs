//! # Database Export
//!
//! Turns an explicitly passed snapshot of the admin tables into a JSON or CSV
//! document for download.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Export Pipeline                                 │
//! │                                                                         │
//! │  ExportSnapshot ─┐                                                     │
//! │                  ├──► select tables ──► Empty? ──► redact ──► encode   │
//! │  ExportRequest ──┘        │                          │          │      │
//! │                           │                          │     ┌────┴────┐ │
//! │                           ▼                          ▼     │  JSON   │ │
//! │                     products, messages,     users.password │  CSV    │ │
//! │                     users (fixed order)     ──► [PROTECTED]└─────────┘ │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## CSV Layout
//! One block per non-empty table:
//! ```text
//! # products
//! id,name,price
//! 1,"A,B",5
//!
//! ```
//! The header comes from the first record; keys that only appear in later
//! records are not exported.
//!
//! ## Usage
//! ```rust
//! use chrono::NaiveDate;
//! use serde_json::json;
//! use storefront_core::export::{export, ExportRequest, ExportSnapshot};
//!
//! let snapshot = ExportSnapshot::from_json(json!({
//!     "products": [{"id": 1, "name": "A,B", "price": 5}]
//! })).unwrap();
//! let request = ExportRequest::parse("csv", &["products"]).unwrap();
//! let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
//!
//! let output = export(&snapshot, &request, date).unwrap();
//! assert_eq!(output.filename, "storefront-export-2024-03-09.csv");
//! assert!(output.content.contains("1,\"A,B\",5"));
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{ExportError, ExportResult};

/// Replacement written over sensitive fields.
pub const REDACTED_VALUE: &str = "[PROTECTED]";

/// Prefix of every export filename.
pub const FILENAME_PREFIX: &str = "storefront-export";

/// A flat record (field order preserved).
pub type Record = Map<String, Value>;

// =============================================================================
// Format & Table Names
// =============================================================================

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// File extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Exportable tables, in export order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TableName {
    Products,
    Messages,
    Users,
}

impl TableName {
    pub const ALL: [TableName; 3] = [TableName::Products, TableName::Messages, TableName::Users];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Products => "products",
            TableName::Messages => "messages",
            TableName::Users => "users",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableName {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "products" => Ok(TableName::Products),
            "messages" => Ok(TableName::Messages),
            "users" => Ok(TableName::Users),
            other => Err(ExportError::UnknownTable(other.to_string())),
        }
    }
}

// =============================================================================
// Snapshot & Request
// =============================================================================

/// The data to export, supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSnapshot {
    tables: BTreeMap<TableName, Vec<Record>>,
}

impl ExportSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ExportSnapshot::insert`].
    pub fn with_table(mut self, table: TableName, records: Vec<Record>) -> Self {
        self.insert(table, records);
        self
    }

    /// Sets the records of a table, replacing any previous ones.
    pub fn insert(&mut self, table: TableName, records: Vec<Record>) {
        self.tables.insert(table, records);
    }

    /// Records of a table (empty when the table was never inserted).
    pub fn table(&self, table: TableName) -> &[Record] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parses a snapshot document: `{"products": [{...}], "users": [...]}`.
    ///
    /// ## Errors
    /// - `UnknownTable` for a key outside the exportable set
    /// - `InvalidData` when the document, a table or a row has the wrong shape
    pub fn from_json(value: Value) -> ExportResult<Self> {
        let Value::Object(document) = value else {
            return Err(ExportError::InvalidData(
                "snapshot must be a JSON object".to_string(),
            ));
        };

        let mut snapshot = ExportSnapshot::new();
        for (name, rows) in document {
            let table: TableName = name.parse()?;
            let Value::Array(rows) = rows else {
                return Err(ExportError::InvalidData(format!(
                    "table '{}' must be an array",
                    table
                )));
            };

            let records = rows
                .into_iter()
                .map(|row| match row {
                    Value::Object(record) => Ok(record),
                    _ => Err(ExportError::InvalidData(format!(
                        "rows of '{}' must be objects",
                        table
                    ))),
                })
                .collect::<ExportResult<Vec<Record>>>()?;

            snapshot.insert(table, records);
        }

        Ok(snapshot)
    }
}

/// What to export and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub tables: Vec<TableName>,
}

impl ExportRequest {
    pub fn new(format: ExportFormat, tables: Vec<TableName>) -> Self {
        ExportRequest { format, tables }
    }

    /// Parses a request from user-supplied strings.
    ///
    /// Blank table names are skipped, so `--tables ""` selects nothing.
    pub fn parse(format: &str, tables: &[&str]) -> ExportResult<Self> {
        let format = format.parse()?;
        let tables = tables
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| t.parse())
            .collect::<ExportResult<Vec<TableName>>>()?;
        Ok(ExportRequest { format, tables })
    }

    /// Whether `table` was asked for.
    pub fn includes(&self, table: TableName) -> bool {
        self.tables.contains(&table)
    }

    /// Requested tables, deduplicated, in export order.
    fn selected(&self) -> BTreeSet<TableName> {
        self.tables.iter().copied().collect()
    }
}

// =============================================================================
// Redaction
// =============================================================================

/// Fields whose values never leave the exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionPolicy {
    fields: BTreeSet<(TableName, String)>,
}

impl Default for RedactionPolicy {
    /// Redacts `users.password`.
    fn default() -> Self {
        RedactionPolicy::none().with_field(TableName::Users, "password")
    }
}

impl RedactionPolicy {
    /// A policy that redacts nothing.
    pub fn none() -> Self {
        RedactionPolicy {
            fields: BTreeSet::new(),
        }
    }

    pub fn with_field(mut self, table: TableName, field: impl Into<String>) -> Self {
        self.fields.insert((table, field.into()));
        self
    }

    pub fn is_sensitive(&self, table: TableName, field: &str) -> bool {
        self.fields.iter().any(|(t, f)| *t == table && f == field)
    }

    /// Overwrites every sensitive field present in `record`, keeping its position.
    pub fn apply(&self, table: TableName, record: &mut Record) {
        for (key, value) in record.iter_mut() {
            if self.is_sensitive(table, key) {
                *value = Value::String(REDACTED_VALUE.to_string());
            }
        }
    }
}

// =============================================================================
// Exporter
// =============================================================================

/// Result of a successful export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ExportOutput {
    pub content: String,
    pub filename: String,
    pub format: ExportFormat,
}

/// Snapshot encoder with a redaction policy.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    redaction: RedactionPolicy,
}

impl Exporter {
    pub fn new(redaction: RedactionPolicy) -> Self {
        Exporter { redaction }
    }

    /// Exports the requested tables of `snapshot`.
    ///
    /// ## Errors
    /// - `Empty` when no table is requested or every requested table is empty
    /// - `InvalidData` when encoding fails (no partial output is returned)
    pub fn export(
        &self,
        snapshot: &ExportSnapshot,
        request: &ExportRequest,
        date: NaiveDate,
    ) -> ExportResult<ExportOutput> {
        let selected = self.redacted_tables(snapshot, request)?;

        let content = match request.format {
            ExportFormat::Json => encode_json(&selected)?,
            ExportFormat::Csv => encode_csv(&selected)?,
        };

        Ok(ExportOutput {
            content,
            filename: export_filename(date, request.format),
            format: request.format,
        })
    }

    fn redacted_tables(
        &self,
        snapshot: &ExportSnapshot,
        request: &ExportRequest,
    ) -> ExportResult<Vec<(TableName, Vec<Record>)>> {
        let selected: Vec<(TableName, Vec<Record>)> = request
            .selected()
            .into_iter()
            .map(|table| {
                let mut records = snapshot.table(table).to_vec();
                for record in &mut records {
                    self.redaction.apply(table, record);
                }
                (table, records)
            })
            .collect();

        if selected.iter().all(|(_, records)| records.is_empty()) {
            return Err(ExportError::Empty);
        }

        Ok(selected)
    }
}

/// Exports with the default redaction policy.
pub fn export(
    snapshot: &ExportSnapshot,
    request: &ExportRequest,
    date: NaiveDate,
) -> ExportResult<ExportOutput> {
    Exporter::default().export(snapshot, request, date)
}

/// `storefront-export-YYYY-MM-DD.<ext>`
pub fn export_filename(date: NaiveDate, format: ExportFormat) -> String {
    format!(
        "{}-{}.{}",
        FILENAME_PREFIX,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

// =============================================================================
// Encoders
// =============================================================================

fn encode_json(tables: &[(TableName, Vec<Record>)]) -> ExportResult<String> {
    let document: Map<String, Value> = tables
        .iter()
        .map(|(table, records)| {
            let rows = records.iter().cloned().map(Value::Object).collect();
            (table.as_str().to_string(), Value::Array(rows))
        })
        .collect();

    serde_json::to_string_pretty(&document).map_err(|e| ExportError::InvalidData(e.to_string()))
}

fn encode_csv(tables: &[(TableName, Vec<Record>)]) -> ExportResult<String> {
    let mut content = String::new();

    for (table, records) in tables {
        let Some(first) = records.first() else {
            continue;
        };

        content.push_str(&format!("# {}\n", table));
        content.push_str(&encode_csv_table(first, records)?);
        content.push('\n');
    }

    Ok(content)
}

fn encode_csv_table(first: &Record, records: &[Record]) -> ExportResult<String> {
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let mut table = csv_line(&headers)?;

    for record in records {
        let row = headers
            .iter()
            .map(|h| csv_field(record.get(*h)))
            .collect::<ExportResult<Vec<String>>>()?;
        table.push_str(&csv_line(&row)?);
    }

    Ok(table)
}

/// Encodes one line. A line made of a single empty cell stays empty
/// (the csv writer would emit `""` for it).
fn csv_line<T: AsRef<[u8]>>(fields: &[T]) -> ExportResult<String> {
    if let [only] = fields {
        let cell: &[u8] = only.as_ref();
        if cell.is_empty() {
            return Ok("\n".to_string());
        }
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record(fields)
        .map_err(|e| ExportError::InvalidData(e.to_string()))?;

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::InvalidData(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidData(e.to_string()))
}

/// Renders one cell; quoting is left to the CSV writer.
fn csv_field(value: Option<&Value>) -> ExportResult<String> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(Value::Number(n)) => match n.as_f64() {
            // Whole floats print without a fraction (`120`, not `120.0`).
            Some(f) if n.is_f64() && f.fract() == 0.0 => Ok(f.to_string()),
            _ => Ok(n.to_string()),
        },
        Some(nested @ (Value::Array(_) | Value::Object(_))) => {
            serde_json::to_string(nested).map_err(|e| ExportError::InvalidData(e.to_string()))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn snapshot() -> ExportSnapshot {
        ExportSnapshot::from_json(json!({
            "products": [
                {"id": 1, "name": "Lámpara Vintage", "price": 45.99},
                {"id": 2, "name": "Silla, de diseño", "price": 120}
            ],
            "messages": [
                {"id": 1, "productId": 1, "conversations": [{"sender": "user", "message": "¿Disponible?"}]}
            ],
            "users": [
                {"id": 1, "username": "admin", "password": "admin123_hash", "role": "admin"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_csv_quotes_only_when_needed() {
        let snapshot = ExportSnapshot::from_json(json!({
            "products": [{"id": 1, "name": "A,B", "price": 5}]
        }))
        .unwrap();
        let request = ExportRequest::new(ExportFormat::Csv, vec![TableName::Products]);

        let output = export(&snapshot, &request, date()).unwrap();
        assert_eq!(output.content, "# products\nid,name,price\n1,\"A,B\",5\n\n");
        assert_eq!(output.filename, "storefront-export-2024-05-01.csv");
    }

    #[test]
    fn test_csv_nested_values_and_nulls() {
        let snapshot = ExportSnapshot::from_json(json!({
            "messages": [
                {"id": 1, "body": "say \"hi\"", "meta": {"a": 1}, "note": null},
                {"id": 2, "body": "line\nbreak"}
            ]
        }))
        .unwrap();
        let request = ExportRequest::new(ExportFormat::Csv, vec![TableName::Messages]);

        let content = export(&snapshot, &request, date()).unwrap().content;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "# messages");
        assert_eq!(lines[1], "id,body,meta,note");
        assert_eq!(lines[2], "1,\"say \"\"hi\"\"\",\"{\"\"a\"\":1}\",");
        assert!(content.contains("2,\"line\nbreak\",,\n"));
    }

    #[test]
    fn test_csv_single_empty_cell_is_an_empty_line() {
        let snapshot = ExportSnapshot::from_json(json!({
            "users": [{"note": null}, {"note": "x"}, {}]
        }))
        .unwrap();
        let request = ExportRequest::new(ExportFormat::Csv, vec![TableName::Users]);

        let content = export(&snapshot, &request, date()).unwrap().content;
        assert_eq!(content, "# users\nnote\n\nx\n\n\n");
    }

    #[test]
    fn test_csv_whole_floats_print_as_integers() {
        let snapshot = ExportSnapshot::from_json(json!({
            "products": [{"id": 1, "price": 120.0, "rating": -3.0, "weight": 0.5}]
        }))
        .unwrap();
        let request = ExportRequest::new(ExportFormat::Csv, vec![TableName::Products]);

        let content = export(&snapshot, &request, date()).unwrap().content;
        assert_eq!(content, "# products\nid,price,rating,weight\n1,120,-3,0.5\n\n");
    }

    #[test]
    fn test_csv_skips_empty_tables_and_redacts() {
        let snapshot = snapshot().with_table(TableName::Messages, Vec::new());
        let request = ExportRequest::parse("csv", &["users", "messages", "products"]).unwrap();

        let content = export(&snapshot, &request, date()).unwrap().content;
        assert!(!content.contains("# messages"));
        assert!(content.find("# products").unwrap() < content.find("# users").unwrap());
        assert!(content.contains("1,admin,[PROTECTED],admin"));
        assert!(!content.contains("admin123_hash"));
    }

    #[test]
    fn test_json_round_trips_minus_redacted_fields() {
        let request = ExportRequest::parse("json", &["products", "users"]).unwrap();
        let output = export(&snapshot(), &request, date()).unwrap();
        assert_eq!(output.format, ExportFormat::Json);
        assert_eq!(output.filename, "storefront-export-2024-05-01.json");

        let parsed: Value = serde_json::from_str(&output.content).unwrap();
        assert_eq!(parsed["products"], json!([
            {"id": 1, "name": "Lámpara Vintage", "price": 45.99},
            {"id": 2, "name": "Silla, de diseño", "price": 120}
        ]));
        assert_eq!(parsed["users"][0]["password"], json!(REDACTED_VALUE));
        assert_eq!(parsed["users"][0]["username"], json!("admin"));
        assert!(parsed.get("messages").is_none());
    }

    #[test]
    fn test_custom_redaction_policy() {
        let exporter = Exporter::new(RedactionPolicy::none());
        let request = ExportRequest::parse("json", &["users"]).unwrap();
        let output = exporter.export(&snapshot(), &request, date()).unwrap();
        assert!(output.content.contains("admin123_hash"));

        let exporter = Exporter::new(RedactionPolicy::default().with_field(TableName::Users, "role"));
        let output = exporter.export(&snapshot(), &request, date()).unwrap();
        let parsed: Value = serde_json::from_str(&output.content).unwrap();
        assert_eq!(parsed["users"][0]["role"], json!(REDACTED_VALUE));
    }

    #[test]
    fn test_empty_requests_fail() {
        let request = ExportRequest::new(ExportFormat::Csv, Vec::new());
        assert_eq!(export(&snapshot(), &request, date()), Err(ExportError::Empty));

        let request = ExportRequest::new(ExportFormat::Json, vec![TableName::Products]);
        assert_eq!(
            export(&ExportSnapshot::new(), &request, date()),
            Err(ExportError::Empty)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            ExportRequest::parse("xml", &["products"]),
            Err(ExportError::UnsupportedFormat("xml".into()))
        );
        assert_eq!(
            ExportRequest::parse("csv", &["orders"]),
            Err(ExportError::UnknownTable("orders".into()))
        );
        assert_eq!(
            ExportRequest::parse("csv", &["", " "]),
            Ok(ExportRequest::new(ExportFormat::Csv, Vec::new()))
        );
        assert_eq!(
            export(&snapshot(), &ExportRequest::parse("json", &[""]).unwrap(), date()),
            Err(ExportError::Empty)
        );
        let request = ExportRequest::parse("csv", &["users", ""]).unwrap();
        assert!(request.includes(TableName::Users));
        assert!(!request.includes(TableName::Products));
        assert!(ExportSnapshot::from_json(json!({"products": {}})).is_err());
        assert!(ExportSnapshot::from_json(json!({"products": [1, 2]})).is_err());
    }
}
