//! Parser for the portal's irradiation CSV export.
//!
//! The export is not regular CSV: a banner line and a blank separator come
//! first, the header is stacked across two or more rows (station names,
//! then a units row, then optionally a long-term-average annotation row),
//! the date column header is left blank, cells use `--` for missing data,
//! and timestamps are Japanese-locale strings whose hourly variant labels
//! the END of each aggregation period. This module turns that into an
//! ordered, validated table or fails the whole response.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::stations::canonical_station_name;

/// Substring of the export-timestamp banner on line 0 ("time of download").
const DOWNLOAD_BANNER: &str = "ダウンロードした時刻";

/// Annotation-row marker for a long-term-average ("normal year") column.
const LONG_TERM_AVG_MARKER: &str = "平年値";

/// Suffix distinguishing a station's long-term-average column from its
/// current-measurement column.
const LT_SUFFIX: &str = "_LT";

/// Cell sentinel for "no measurement". Decodes to `None`, never zero.
const MISSING_SENTINEL: &str = "--";

/// Name given to the blank date-column header.
const DATE_HEADER: &str = "Date";

/// 3.6 MJ/m2 = 1 kWh/m2.
const MJ_PER_KWH: f64 = 3.6;

/// Aggregation period of a downloaded table.
///
/// Selects both the request's aggregation code and the timestamp decoder
/// used while parsing the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Daily,
    Hourly,
}

impl Resolution {
    /// `aggrgPeriod` code for the portal's download form.
    pub(crate) fn aggregation_code(self) -> u8 {
        match self {
            Resolution::Daily => 1,
            Resolution::Hourly => 9,
        }
    }

    fn decode_timestamp(self, token: &str) -> Result<String, BadCsvKind> {
        match self {
            Resolution::Daily => decode_daily_timestamp(token),
            Resolution::Hourly => decode_hourly_timestamp(token),
        }
    }
}

/// Reason a response failed structural validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BadCsvKind {
    #[error("first line does not carry the download banner")]
    MissingBanner,

    #[error("second line is not the blank separator")]
    MissingBlankSeparator,

    #[error("data row appeared before any header row")]
    DataBeforeHeaders,

    #[error("long-term-average marker at column {column} but only {columns} header columns")]
    MisalignedAnnotation { column: usize, columns: usize },

    #[error("data row has {values} values for {columns} station columns")]
    RowWidth { values: usize, columns: usize },

    #[error("cell '{0}' is not a number")]
    Number(String),

    #[error("timestamp '{0}' is not a valid date")]
    Timestamp(String),
}

/// Structural parse failure.
///
/// Fatal to the whole parse call; there is no partial table. Carries the
/// complete raw response text so a bad export can be inspected afterwards.
#[derive(Debug, Clone, Error)]
#[error("malformed irradiation CSV: {kind}")]
pub struct BadCsvError {
    pub kind: BadCsvKind,
    pub raw: String,
}

/// One decoded data row: the formatted timestamp plus one optional value
/// per station column, aligned with `IrradiationTable::headers[1..]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataRow {
    pub timestamp: String,
    pub values: Vec<Option<f64>>,
}

/// A validated irradiation table: resolved column headers plus data rows
/// in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrradiationTable {
    /// Column names. `headers[0]` is always `Date`; the rest are station
    /// names (canonical English where known, native script otherwise),
    /// with `_LT` marking long-term-average columns.
    pub headers: Vec<String>,
    pub rows: Vec<DataRow>,
}

/// Header-resolution state. One-way: once the first data row is accepted
/// the headers are latched and later non-data lines are ignored rather
/// than re-entering header handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderState {
    AwaitingFirstHeader,
    AwaitingAnnotationLines,
    Finalized,
}

impl IrradiationTable {
    /// Parse a raw export into a table.
    ///
    /// `convert_to_kwh` divides every present value by 3.6 (MJ/m² →
    /// kWh/m²); missing cells stay missing. Any structural violation
    /// fails the whole response.
    #[instrument(skip(raw), fields(raw_len = raw.len()))]
    pub fn parse(
        raw: &str,
        resolution: Resolution,
        convert_to_kwh: bool,
    ) -> Result<Self, BadCsvError> {
        parse_lines(raw, resolution, convert_to_kwh).map_err(|kind| BadCsvError {
            kind,
            raw: raw.to_string(),
        })
    }

    /// Position of a named column in `headers`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Value of a named station column in one row.
    ///
    /// `None` when the row or column does not exist, or when the cell held
    /// the missing-data sentinel. Timestamps are read from
    /// `rows[i].timestamp`, not through this accessor.
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let value_idx = self.column_index(column)?.checked_sub(1)?;
        self.rows.get(row)?.values.get(value_idx).copied().flatten()
    }
}

fn parse_lines(
    raw: &str,
    resolution: Resolution,
    convert_to_kwh: bool,
) -> Result<IrradiationTable, BadCsvKind> {
    let text = raw.replace('\r', "");

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<DataRow> = Vec::new();
    let mut state = HeaderState::AwaitingFirstHeader;

    for (i, line) in text.split('\n').enumerate() {
        if i == 0 {
            if !line.contains(DOWNLOAD_BANNER) {
                return Err(BadCsvKind::MissingBanner);
            }
        } else if i == 1 {
            if !line.is_empty() {
                return Err(BadCsvKind::MissingBlankSeparator);
            }
        } else if line.is_empty() {
            continue;
        } else if starts_with_digit(line) {
            if let Some(row) = decode_data_row(line, &headers, resolution, convert_to_kwh)? {
                state = HeaderState::Finalized;
                rows.push(row);
            }
        } else if state == HeaderState::AwaitingFirstHeader {
            resolve_station_headers(line, &mut headers);
            state = HeaderState::AwaitingAnnotationLines;
        } else if state == HeaderState::AwaitingAnnotationLines {
            apply_annotation_line(line, &mut headers)?;
        }
        // HeaderState::Finalized: trailing non-data lines carry nothing.
    }

    debug!(
        columns = headers.len(),
        rows = rows.len(),
        "parsed irradiation table"
    );

    Ok(IrradiationTable { headers, rows })
}

/// First header line: the blank date-column token is replaced by the fixed
/// `Date` name, every other token is a station name translated through the
/// station table. Duplicates (current + long-term-average pairs) and
/// left-to-right order are preserved; order is what aligns row values with
/// columns.
fn resolve_station_headers(line: &str, headers: &mut Vec<String>) {
    headers.push(DATE_HEADER.to_string());
    headers.extend(
        line.split(',')
            .skip(1)
            .map(|name| canonical_station_name(name).to_string()),
    );
}

/// Later header lines, split positionally against the resolved headers:
/// any token containing the normal-year marker tags its column `_LT`.
/// Lines without the marker (the units row) change nothing.
fn apply_annotation_line(line: &str, headers: &mut [String]) -> Result<(), BadCsvKind> {
    let columns = headers.len();
    for (column, token) in line.split(',').enumerate() {
        if token.contains(LONG_TERM_AVG_MARKER) {
            let header = headers
                .get_mut(column)
                .ok_or(BadCsvKind::MisalignedAnnotation { column, columns })?;
            header.push_str(LT_SUFFIX);
        }
    }
    Ok(())
}

/// Decode one data line into a row, or `None` for a line that turns out
/// not to be data after all (defensive; the caller already checked).
fn decode_data_row(
    line: &str,
    headers: &[String],
    resolution: Resolution,
    convert_to_kwh: bool,
) -> Result<Option<DataRow>, BadCsvKind> {
    if line.is_empty() || !starts_with_digit(line) {
        return Ok(None);
    }
    if headers.is_empty() {
        return Err(BadCsvKind::DataBeforeHeaders);
    }

    let mut tokens = line.split(',');
    let timestamp_token = tokens.next().unwrap_or(line);
    let timestamp = resolution.decode_timestamp(timestamp_token)?;

    let values = tokens
        .map(|cell| decode_cell(cell, convert_to_kwh))
        .collect::<Result<Vec<_>, _>>()?;

    // Every row must line up exactly with the headers; a short or long row
    // would silently shift values between stations.
    if values.len() != headers.len() - 1 {
        return Err(BadCsvKind::RowWidth {
            values: values.len(),
            columns: headers.len() - 1,
        });
    }

    Ok(Some(DataRow { timestamp, values }))
}

/// Decode one value cell. Empty cells and the `--` sentinel mean "no
/// measurement" and stay absent even in kWh mode; anything else must be a
/// number.
fn decode_cell(cell: &str, convert_to_kwh: bool) -> Result<Option<f64>, BadCsvKind> {
    if cell.is_empty() || cell == MISSING_SENTINEL {
        return Ok(None);
    }
    let value: f64 = cell
        .parse()
        .map_err(|_| BadCsvKind::Number(cell.to_string()))?;
    Ok(Some(if convert_to_kwh {
        value / MJ_PER_KWH
    } else {
        value
    }))
}

fn starts_with_digit(line: &str) -> bool {
    line.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// `2021年1月1日` → `2021-01-01`.
fn decode_daily_timestamp(token: &str) -> Result<String, BadCsvKind> {
    let date = NaiveDate::parse_from_str(token, "%Y年%m月%d日")
        .map_err(|_| BadCsvKind::Timestamp(token.to_string()))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// `2021年3月22日1時` → `2021-03-22 00:00`.
///
/// Hourly timestamps label the END of the aggregation period: hour 1
/// covers 00:00–01:00 and hour 24 ends the day at midnight. The stated
/// hour is shifted back by one (floored at zero) so a day's rows line up
/// in a single 24-hour window. Hour 24 intentionally stays on the same
/// date; no day rollover is performed. A missing hour component means
/// hour 0.
fn decode_hourly_timestamp(token: &str) -> Result<String, BadCsvKind> {
    let bad = || BadCsvKind::Timestamp(token.to_string());

    let (date_part, rest) = token.split_once('日').unwrap_or((token, ""));
    let date = NaiveDate::parse_from_str(date_part, "%Y年%m月%d").map_err(|_| bad())?;

    let hour = match rest.find('時') {
        Some(idx) => {
            let stated: i32 = rest[..idx].parse().map_err(|_| bad())?;
            stated.saturating_sub(1).max(0)
        }
        None => 0,
    };

    let timestamp = date.and_hms_opt(hour as u32, 0, 0).ok_or_else(bad)?;
    Ok(timestamp.format("%Y-%m-%d %H:%M").to_string())
}
