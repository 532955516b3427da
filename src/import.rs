// Tabular import: CSV and XLSX uploads normalized into expense records

use crate::model::{parse_amount, Category, ExpenseRecord, ValidationError, ISO_DATE};
use crate::store::{ExpenseStore, StoreError};
use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Import failures. A failed parse aborts the whole batch before anything
/// is handed to the store.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unreadable csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("unreadable workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("workbook has no sheets")]
    EmptyWorkbook,

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: {cause}")]
    Row { row: usize, cause: ValidationError },

    #[error("unsupported import file type: '{0}'")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Declared format of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Xlsx,
}

impl ImportFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        match ext.as_str() {
            "csv" => Ok(ImportFormat::Csv),
            "xlsx" => Ok(ImportFormat::Xlsx),
            _ => Err(ImportError::UnsupportedFormat(
                path.display().to_string(),
            )),
        }
    }
}

/// What an import did, for display back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows successfully parsed from the file.
    pub rows_parsed: usize,
    /// Exact-duplicate rows dropped within the batch itself.
    pub batch_duplicates: usize,
    /// Rows newly persisted.
    pub inserted: usize,
    /// Rows skipped because an identical record was already persisted.
    pub already_present: usize,
}

/// Parse, deduplicate and persist an uploaded file.
///
/// The file is parsed completely before any insert happens, so a malformed
/// row never leaves a partial batch behind; the surviving rows then go
/// through the store in one transaction.
pub fn import_into(
    store: &ExpenseStore,
    format: ImportFormat,
    path: &Path,
) -> Result<ImportSummary, ImportError> {
    let parsed = match format {
        ImportFormat::Csv => parse_csv_file(path)?,
        ImportFormat::Xlsx => parse_xlsx(path)?,
    };

    let rows_parsed = parsed.len();
    let (unique, batch_duplicates) = dedup_batch(parsed);
    let outcome = store.add_batch(&unique)?;

    let summary = ImportSummary {
        rows_parsed,
        batch_duplicates,
        inserted: outcome.inserted,
        already_present: outcome.skipped,
    };
    info!(
        file = %path.display(),
        rows = summary.rows_parsed,
        inserted = summary.inserted,
        "import finished"
    );
    Ok(summary)
}

/// Parse a CSV file with a header row.
pub fn parse_csv_file(path: &Path) -> Result<Vec<ExpenseRecord>, ImportError> {
    let rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    parse_csv_rows(rdr)
}

/// Parse CSV from any reader; used directly by tests.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<ExpenseRecord>, ImportError> {
    let rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    parse_csv_rows(rdr)
}

fn parse_csv_rows<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<ExpenseRecord>, ImportError> {
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let columns = resolve_columns(&headers)?;

    let mut records = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = result?;
        // Header is row 1
        let row_no = i + 2;

        let date_raw = row.get(columns.date).unwrap_or_default();
        let amount_raw = row.get(columns.amount).unwrap_or_default();
        let category_raw = row.get(columns.category).unwrap_or_default();
        let note_raw = columns
            .note
            .and_then(|idx| row.get(idx))
            .unwrap_or_default();

        records.push(row_to_record(row_no, date_raw, amount_raw, category_raw, note_raw)?);
    }

    Ok(records)
}

/// Parse the first sheet of an XLSX workbook, first row as header.
pub fn parse_xlsx(path: &Path) -> Result<Vec<ExpenseRecord>, ImportError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ImportError::EmptyWorkbook)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows().enumerate();
    let headers: Vec<String> = match rows.next() {
        Some((_, header_row)) => header_row
            .iter()
            .map(|cell| cell_str(Some(cell)).unwrap_or_default())
            .collect(),
        None => return Err(ImportError::MissingColumn("date")),
    };
    let columns = resolve_columns(&headers)?;

    let mut records = Vec::new();
    for (r_idx, row) in rows {
        let row_no = r_idx + 1;

        let date_cell = row.get(columns.date);
        let amount_cell = row.get(columns.amount);
        let category_cell = row.get(columns.category);

        // Sheets often trail off into blank rows; skip those quietly.
        if is_blank(date_cell) && is_blank(amount_cell) && is_blank(category_cell) {
            continue;
        }

        let date = date_from_cell(date_cell)
            .map_err(|cause| ImportError::Row { row: row_no, cause })?;
        let amount = amount_from_cell(amount_cell)
            .map_err(|cause| ImportError::Row { row: row_no, cause })?;
        let category: Category = cell_str(category_cell)
            .unwrap_or_default()
            .parse()
            .map_err(|cause| ImportError::Row { row: row_no, cause })?;
        let note = columns
            .note
            .and_then(|idx| cell_str(row.get(idx)))
            .unwrap_or_default();

        let record = ExpenseRecord::new(date, amount, category, note.trim())
            .map_err(|cause| ImportError::Row { row: row_no, cause })?;
        records.push(record);
    }

    Ok(records)
}

/// Resolved positions of the logical columns after header normalization.
struct Columns {
    date: usize,
    amount: usize,
    category: usize,
    note: Option<usize>,
}

/// Map header names to logical fields: trim and lowercase, so "Date ",
/// "DATE" and "date" all resolve to the same column.
fn resolve_columns(headers: &[String]) -> Result<Columns, ImportError> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().to_lowercase() == name)
    };

    Ok(Columns {
        date: find("date").ok_or(ImportError::MissingColumn("date"))?,
        amount: find("amount").ok_or(ImportError::MissingColumn("amount"))?,
        category: find("category").ok_or(ImportError::MissingColumn("category"))?,
        note: find("note"),
    })
}

fn row_to_record(
    row_no: usize,
    date_raw: &str,
    amount_raw: &str,
    category_raw: &str,
    note_raw: &str,
) -> Result<ExpenseRecord, ImportError> {
    let map_err = |cause| ImportError::Row { row: row_no, cause };

    let date = parse_date_value(date_raw).map_err(map_err)?;
    let amount = parse_amount(amount_raw).map_err(map_err)?;
    let category: Category = category_raw.parse().map_err(map_err)?;

    ExpenseRecord::new(date, amount, category, note_raw).map_err(map_err)
}

/// Accepted date-like inputs: ISO date, ISO datetime, and the US slash form
/// that spreadsheet exports tend to produce.
fn parse_date_value(value: &str) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::UnparsableDate(value.to_string()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, ISO_DATE) {
        return Ok(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.date());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%m/%d/%Y") {
        return Ok(date);
    }
    Err(ValidationError::UnparsableDate(value.to_string()))
}

/// Drop exact-duplicate rows within the batch, keeping first occurrences.
/// Returns the surviving rows and the number dropped.
fn dedup_batch(records: Vec<ExpenseRecord>) -> (Vec<ExpenseRecord>, usize) {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(records.len());
    let mut dropped = 0;

    for record in records {
        if seen.insert(record.dedup_hash()) {
            unique.push(record);
        } else {
            dropped += 1;
        }
    }

    (unique, dropped)
}

fn is_blank(cell: Option<&Data>) -> bool {
    cell_str(cell)
        .map(|s| s.trim().is_empty())
        .unwrap_or(true)
}

fn cell_str(cell: Option<&Data>) -> Option<String> {
    let c = cell?;
    match c {
        Data::String(s) => Some(s.clone()),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::Empty => None,
        _ => Some(c.to_string()),
    }
}

/// Workbook dates arrive as Excel serial numbers, datetime cells, or text.
fn date_from_cell(cell: Option<&Data>) -> Result<NaiveDate, ValidationError> {
    let Some(c) = cell else {
        return Err(ValidationError::UnparsableDate(String::new()));
    };

    match c {
        Data::Float(f) => excel_serial_to_date(*f),
        Data::Int(i) => excel_serial_to_date(*i as f64),
        Data::String(s) => parse_date_value(s),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => parse_date_value(s),
        _ => parse_date_value(&c.to_string()),
    }
}

/// Excel serial date conversion using the 1899-12-30 base.
fn excel_serial_to_date(serial: f64) -> Result<NaiveDate, ValidationError> {
    if !serial.is_finite() || serial < 1.0 {
        return Err(ValidationError::UnparsableDate(serial.to_string()));
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)
        .ok_or_else(|| ValidationError::UnparsableDate(serial.to_string()))?;
    Ok(base + Duration::days(serial.floor() as i64))
}

fn amount_from_cell(cell: Option<&Data>) -> Result<f64, ValidationError> {
    let Some(c) = cell else {
        return Err(ValidationError::NonNumericAmount(String::new()));
    };

    match c {
        Data::Float(f) if *f >= 0.0 => Ok(*f),
        Data::Float(f) => Err(ValidationError::NegativeAmount(*f)),
        Data::Int(i) if *i >= 0 => Ok(*i as f64),
        Data::Int(i) => Err(ValidationError::NegativeAmount(*i as f64)),
        Data::String(s) => parse_amount(s),
        _ => parse_amount(&c.to_string()),
    }
}
