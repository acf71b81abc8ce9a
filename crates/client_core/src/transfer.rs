//! Member import/export: CSV, JSON and XML renderings of a snapshot, full
//! backups, and parsing of CSV files and backups back into new members.

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use shared::domain::{Member, Timestamp};
use thiserror::Error;

use crate::registration::NewMember;

pub const BACKUP_VERSION: &str = "2.0";
pub const BACKUP_EXPORTED_BY: &str = "Association Management System";
const CSV_HEADER: &str = "Name,Surname,Email,Created Date,Updated Date";
const REQUIRED_COLUMNS: [&str; 3] = ["name", "surname", "email"];

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("No members to export")]
    NothingToExport,
    #[error("Please select a CSV file")]
    NotCsv,
    #[error("The import file is empty")]
    EmptyFile,
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Xml,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }
}

pub fn export_file_name(format: ExportFormat, date: NaiveDate) -> String {
    format!("members_export_{}.{}", date.format("%Y-%m-%d"), format.extension())
}

pub fn backup_file_name(date: NaiveDate) -> String {
    format!("association_backup_{}.json", date.format("%Y-%m-%d"))
}

pub fn export_members(members: &[Member], format: ExportFormat) -> Result<String, TransferError> {
    if members.is_empty() {
        return Err(TransferError::NothingToExport);
    }

    Ok(match format {
        ExportFormat::Csv => export_csv(members),
        ExportFormat::Json => serde_json::to_string_pretty(members)?,
        ExportFormat::Xml => export_xml(members),
    })
}

fn iso(timestamp: Timestamp) -> String {
    timestamp
        .to_datetime()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn export_csv(members: &[Member]) -> String {
    let mut out = String::from(CSV_HEADER);
    for member in members {
        out.push('\n');
        let cells = [
            csv_cell(&member.name),
            csv_cell(&member.surname),
            csv_cell(&member.email),
            iso(member.created_date),
            iso(member.updated_date),
        ];
        out.push_str(&cells.join(","));
    }
    out
}

fn csv_cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn export_xml(members: &[Member]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<members>\n");
    for member in members {
        out.push_str("  <member>\n");
        out.push_str(&format!("    <name>{}</name>\n", xml_escape(&member.name)));
        out.push_str(&format!(
            "    <surname>{}</surname>\n",
            xml_escape(&member.surname)
        ));
        out.push_str(&format!("    <email>{}</email>\n", xml_escape(&member.email)));
        out.push_str(&format!(
            "    <createdDate>{}</createdDate>\n",
            iso(member.created_date)
        ));
        out.push_str(&format!(
            "    <updatedDate>{}</updatedDate>\n",
            iso(member.updated_date)
        ));
        out.push_str("  </member>\n");
    }
    out.push_str("</members>");
    out
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    pub total_members: usize,
    pub exported_by: String,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupDocument {
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub members: Vec<Member>,
    pub metadata: BackupMetadata,
}

impl BackupDocument {
    pub fn new(members: &[Member], taken_at: DateTime<Utc>) -> Self {
        Self {
            timestamp: taken_at,
            version: BACKUP_VERSION.to_string(),
            members: members.to_vec(),
            metadata: BackupMetadata {
                total_members: members.len(),
                exported_by: BACKUP_EXPORTED_BY.to_string(),
                format: "backup".to_string(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String, TransferError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Reads a backup back as members to re-register. Timestamps are assigned
/// again by the member service.
pub fn parse_backup(text: &str) -> Result<Vec<NewMember>, TransferError> {
    let document: BackupDocument = serde_json::from_str(text)?;
    Ok(document
        .members
        .iter()
        .filter_map(|member| NewMember::new(&member.name, &member.surname, &member.email).ok())
        .collect())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvImport {
    pub members: Vec<NewMember>,
    /// `"line N: <reason>"` for each data row that was not usable.
    pub skipped: Vec<String>,
}

pub fn ensure_csv_file_name(path: &Path) -> Result<(), TransferError> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        Ok(())
    } else {
        Err(TransferError::NotCsv)
    }
}

/// Parses CSV text whose header names at least `name`, `surname` and
/// `email` (any order, any case). Blank lines are ignored. Quoted cells may
/// span lines.
pub fn parse_csv_import(text: &str) -> Result<CsvImport, TransferError> {
    let mut records = csv_records(text).into_iter();

    let header = records.next().ok_or(TransferError::EmptyFile)?;
    let headers: Vec<String> = header
        .cells
        .into_iter()
        .map(|header| header.trim().to_lowercase())
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .into_iter()
        .filter(|required| !headers.iter().any(|header| header == required))
        .map(|required| required.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(TransferError::MissingColumns(missing));
    }

    let column = |name: &str| headers.iter().position(|header| header == name);
    let (Some(name_col), Some(surname_col), Some(email_col)) =
        (column("name"), column("surname"), column("email"))
    else {
        return Err(TransferError::MissingColumns(
            REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        ));
    };

    let mut import = CsvImport::default();
    for record in records {
        let cell = |col: usize| record.cells.get(col).map(String::as_str).unwrap_or_default();
        match NewMember::new(cell(name_col), cell(surname_col), cell(email_col)) {
            Ok(member) => import.members.push(member),
            Err(err) => import.skipped.push(format!("line {}: {err}", record.line)),
        }
    }
    Ok(import)
}

#[derive(Debug, PartialEq, Eq)]
struct CsvRecord {
    /// 1-based line the record starts on.
    line: usize,
    cells: Vec<String>,
}

impl CsvRecord {
    fn is_blank(&self) -> bool {
        matches!(self.cells.as_slice(), [only] if only.trim().is_empty())
    }
}

/// Splits `text` into records. Only unquoted line breaks end a record; `""`
/// inside quotes is a literal quote.
fn csv_records(text: &str) -> Vec<CsvRecord> {
    let mut records = Vec::new();
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut current)),
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' | '\r' if !in_quotes => {
                cells.push(std::mem::take(&mut current));
                records.push(CsvRecord {
                    line: record_line,
                    cells: std::mem::take(&mut cells),
                });
                line += 1;
                record_line = line;
            }
            other => {
                if other == '\n' {
                    line += 1;
                }
                current.push(other);
            }
        }
    }
    if !current.is_empty() || !cells.is_empty() {
        cells.push(current);
        records.push(CsvRecord {
            line: record_line,
            cells,
        });
    }

    records.retain(|record| !record.is_blank());
    records
}

#[cfg(test)]
#[path = "tests/transfer_tests.rs"]
mod tests;
