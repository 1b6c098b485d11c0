//! CSV ingest and normalization.
//!
//! This module is responsible for turning the raw price CSV into a clean
//! `PriceTable` that every view can read without further checks.
//!
//! Design goals:
//! - **Strict schema** for required columns (checked once, up front)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (rows keep their file order)
//! - **Separation of concerns**: no fetching and no aggregation here

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::{Field, PriceRecord, PriceTable};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// What happened while building the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadSummary {
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: Vec<RowError>,
}

/// Ingest output: the table plus its load summary.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedTable {
    pub table: PriceTable,
    pub summary: LoadSummary,
}

/// Parse CSV text into a `PriceTable`.
///
/// Fails with a load error if a required column is missing, the header row
/// cannot be read, or no row survives validation.
pub fn parse_price_table(text: &str) -> Result<IngestedTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::load(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let columns = resolve_columns(&headers)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &columns) {
            Ok(row) => records.push(row),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = records.len();
    if rows_used == 0 {
        return Err(AppError::load(format!(
            "No valid price rows in dataset ({rows_read} read, {} rejected).",
            row_errors.len()
        )));
    }

    if !row_errors.is_empty() {
        warn!(
            rejected = row_errors.len(),
            first_line = row_errors[0].line,
            first_error = %row_errors[0].message,
            "skipped invalid rows during ingest"
        );
    }
    info!(rows_read, rows_used, "parsed price table");

    Ok(IngestedTable {
        table: PriceTable::new(records),
        summary: LoadSummary {
            rows_read,
            rows_used,
            row_errors,
        },
    })
}

/// Column positions for every required field.
#[derive(Debug, Clone)]
struct ColumnMap {
    positions: HashMap<Field, usize>,
}

impl ColumnMap {
    fn get<'a>(&self, record: &'a StringRecord, field: Field) -> Option<&'a str> {
        let idx = self.positions.get(&field)?;
        record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
    }
}

fn resolve_columns(headers: &StringRecord) -> Result<ColumnMap, AppError> {
    let header_map = build_header_map(headers);
    let mut positions = HashMap::new();
    for field in Field::REQUIRED {
        let idx = header_map
            .get(&normalize_header_name(field.column_name()))
            .ok_or_else(|| {
                AppError::load(format!("Missing required column: `{}`", field.column_name()))
            })?;
        positions.insert(field, *idx);
    }
    Ok(ColumnMap { positions })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, columns: &ColumnMap) -> Result<PriceRecord, String> {
    let commodity = columns
        .get(record, Field::Commodity)
        .ok_or_else(|| "Missing `Commodity_Name` value.".to_string())?
        .to_string();

    let raw_period = columns
        .get(record, Field::Period)
        .ok_or_else(|| "Missing `Reference_Period_Start` value.".to_string())?;
    let period = parse_date(raw_period)?;

    let price = parse_opt_f64(columns.get(record, Field::Price));
    if let Some(p) = price {
        if p < 0.0 {
            return Err(format!("Negative `Standardized_Price` ({p})."));
        }
    }

    Ok(PriceRecord {
        period,
        commodity,
        category: text_or_empty(columns.get(record, Field::Category)),
        market: text_or_empty(columns.get(record, Field::Market)),
        latitude: parse_opt_f64(columns.get(record, Field::Latitude)),
        longitude: parse_opt_f64(columns.get(record, Field::Longitude)),
        price,
        price_mean: parse_opt_f64(columns.get(record, Field::PriceMean)),
        price_median: parse_opt_f64(columns.get(record, Field::PriceMedian)),
        price_std: parse_opt_f64(columns.get(record, Field::PriceStd)),
    })
}

fn text_or_empty(s: Option<&str>) -> String {
    s.map(str::to_string).unwrap_or_default()
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // ISO dates are the norm, but re-exported sheets often switch to
    // day-first or carry a midnight timestamp.
    const DATE_FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY/MM/DD, DD/MM/YYYY, DD-MM-YYYY."
    ))
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let v = s?.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
