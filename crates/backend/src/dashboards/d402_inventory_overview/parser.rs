//! Parser for the inventory export.
//!
//! One CSV payload carries three datasets side by side: RFID movements (one per
//! row), the current stock snapshot (the line after the header) and monthly
//! consumption series (historical and forecast date/value column pairs).
//! Columns are resolved by header name. Fields are split on bare commas, there
//! is no quoted-field handling.
//!
//! Malformed movement rows are dropped from the output and reported through
//! [`ParsedExport::rejected`]. Unreadable numbers become `None`, unrecognised
//! dates pass through verbatim.

use contracts::dashboards::d402_inventory_overview::{
    ConsumptionPoint, ConsumptionSeries, MovementEvent, StockLevel,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;

use super::columns;

static EXPORT_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{1,2})/([0-9]{1,2})/([0-9]{4})").expect("valid date pattern"));

/// Which categories the export is expected to carry
#[derive(Debug, Clone)]
pub struct ExportLayout {
    pub tracked_category_count: u8,
    pub consumption_categories: Vec<u8>,
}

impl ExportLayout {
    pub fn new(tracked_category_count: u8, consumption_categories: &[u8]) -> Self {
        let mut consumption_categories = consumption_categories.to_vec();
        consumption_categories.sort_unstable();
        consumption_categories.dedup();
        Self {
            tracked_category_count,
            consumption_categories,
        }
    }
}

/// Why a movement row was dropped
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowRejection {
    #[error("timestamp is empty")]
    MissingTimestamp,

    #[error("tag id is empty")]
    MissingTagId,

    #[error("category is not an integer: {0:?}")]
    InvalidCategory(String),

    #[error("mode is not an integer: {0:?}")]
    InvalidMode(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// 1-based line in the payload
    pub line: usize,
    pub reason: RowRejection,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedExport {
    pub movements: Vec<MovementEvent>,
    pub stock_levels: Vec<StockLevel>,
    pub consumption: BTreeMap<u8, ConsumptionSeries>,
    pub rejected: Vec<RejectedRow>,
    pub missing_columns: Vec<String>,
}

/// Header plus non-blank data rows, values already cleaned
#[derive(Debug, Clone, Default)]
pub struct ExportTable {
    headers: Vec<String>,
    rows: Vec<ExportRow>,
    /// The line right after the header is empty or whitespace
    second_line_blank: bool,
}

#[derive(Debug, Clone)]
pub struct ExportRow {
    pub line: usize,
    cells: Vec<String>,
}

impl ExportTable {
    pub fn read(text: &str) -> Self {
        // Strip UTF-8 BOM if present
        let text = text.trim_start_matches('\u{FEFF}');
        let second_line_blank = text
            .lines()
            .nth(1)
            .map_or(false, |line| line.trim().is_empty());

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut headers: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for result in reader.records() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Skipping unreadable export line: {}", e);
                    continue;
                }
            };

            let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
            let cells: Vec<String> = record.iter().map(clean_value).collect();

            if headers.is_none() {
                headers = Some(cells);
                continue;
            }
            if cells.len() == 1 && cells[0].is_empty() {
                continue;
            }
            rows.push(ExportRow { line, cells });
        }

        Self {
            headers: headers.unwrap_or_default(),
            rows,
            second_line_blank,
        }
    }

    /// Index of the first header equal to `name`
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn rows(&self) -> &[ExportRow] {
        &self.rows
    }

    /// Row carrying the stock snapshot: the line right after the header.
    /// `None` when that line is blank, even if data rows follow.
    pub fn snapshot_row(&self) -> Option<&ExportRow> {
        if self.second_line_blank {
            return None;
        }
        self.rows.first()
    }

    pub fn missing_columns(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .filter(|name| self.column(name).is_none())
            .cloned()
            .collect()
    }
}

impl ExportRow {
    /// Cell value; `None` when the column is unknown or the row is short
    pub fn get(&self, column: Option<usize>) -> Option<&str> {
        column
            .and_then(|i| self.cells.get(i))
            .map(String::as_str)
    }

    pub fn non_empty(&self, column: Option<usize>) -> Option<&str> {
        self.get(column).filter(|v| !v.is_empty())
    }
}

/// Parse all three datasets out of one payload.
pub fn parse_export(text: &str, layout: &ExportLayout) -> ParsedExport {
    let table = ExportTable::read(text);

    let missing_columns = table.missing_columns(&columns::required(
        layout.tracked_category_count,
        &layout.consumption_categories,
    ));
    if !missing_columns.is_empty() {
        tracing::warn!("Export is missing columns: {}", missing_columns.join(", "));
    }

    let (movements, rejected) = parse_movements(&table);
    if !rejected.is_empty() {
        tracing::info!(
            "Dropped {} malformed movement rows out of {}",
            rejected.len(),
            table.rows().len()
        );
    }

    let stock_levels = parse_stock_levels(&table, layout.tracked_category_count);
    let consumption = parse_consumption(&table, &layout.consumption_categories);

    ParsedExport {
        movements,
        stock_levels,
        consumption,
        rejected,
        missing_columns,
    }
}

/// One movement per data row. Rows with an empty timestamp or tag id, or a
/// non-integer category or mode, are returned as rejections instead.
pub fn parse_movements(table: &ExportTable) -> (Vec<MovementEvent>, Vec<RejectedRow>) {
    let cols = MovementColumns {
        timestamp: table.column(columns::RFID_DATESTAMP),
        uid: table.column(columns::UID),
        category: table.column(columns::CATEGORY),
        mode: table.column(columns::MODE),
    };

    let mut movements = Vec::new();
    let mut rejected = Vec::new();

    for row in table.rows() {
        match movement_from_row(row, &cols) {
            Ok(event) => movements.push(event),
            Err(reason) => {
                tracing::debug!("Dropping movement row at line {}: {}", row.line, reason);
                rejected.push(RejectedRow {
                    line: row.line,
                    reason,
                });
            }
        }
    }

    (movements, rejected)
}

struct MovementColumns {
    timestamp: Option<usize>,
    uid: Option<usize>,
    category: Option<usize>,
    mode: Option<usize>,
}

fn movement_from_row(row: &ExportRow, cols: &MovementColumns) -> Result<MovementEvent, RowRejection> {
    let timestamp = row
        .non_empty(cols.timestamp)
        .ok_or(RowRejection::MissingTimestamp)?;
    let tag_id = row.non_empty(cols.uid).ok_or(RowRejection::MissingTagId)?;

    let raw_category = row.get(cols.category).unwrap_or_default();
    let category = parse_leading_int(raw_category)
        .ok_or_else(|| RowRejection::InvalidCategory(raw_category.to_string()))?;

    let raw_mode = row.get(cols.mode).unwrap_or_default();
    let mode = parse_leading_int(raw_mode)
        .ok_or_else(|| RowRejection::InvalidMode(raw_mode.to_string()))?;

    Ok(MovementEvent {
        timestamp: timestamp.to_string(),
        tag_id: tag_id.to_string(),
        category,
        mode,
    })
}

/// Stock levels from the line after the header, one entry per tracked
/// category whether or not its column exists.
pub fn parse_stock_levels(table: &ExportTable, tracked_category_count: u8) -> Vec<StockLevel> {
    let snapshot = table.snapshot_row();

    (1..=tracked_category_count)
        .map(|category| {
            let column = table.column(&columns::stock_level(category));
            let level = snapshot
                .and_then(|row| row.get(column))
                .and_then(parse_leading_int);
            StockLevel { category, level }
        })
        .collect()
}

/// Historical and forecast series for every consumption category, taken from
/// every data row. A point needs both its date and its value cell.
pub fn parse_consumption(
    table: &ExportTable,
    categories: &[u8],
) -> BTreeMap<u8, ConsumptionSeries> {
    let hist_dates_col = table.column(columns::HISTORICAL_DATES);
    let fc_dates_col = table.column(columns::FORECAST_DATES);

    let value_columns: Vec<(u8, Option<usize>, Option<usize>)> = categories
        .iter()
        .map(|&c| {
            (
                c,
                table.column(&columns::historical_data(c)),
                table.column(&columns::forecast_data(c)),
            )
        })
        .collect();

    let mut series: BTreeMap<u8, ConsumptionSeries> = categories
        .iter()
        .map(|&c| (c, ConsumptionSeries::default()))
        .collect();

    for row in table.rows() {
        let hist_date = row.non_empty(hist_dates_col).map(reformat_date);
        let fc_date = row.non_empty(fc_dates_col).map(reformat_date);

        for (category, hist_col, fc_col) in &value_columns {
            let entry = series.entry(*category).or_default();

            if let (Some(date), Some(raw)) = (&hist_date, row.non_empty(*hist_col)) {
                entry.historical.push(ConsumptionPoint {
                    date: date.clone(),
                    value: parse_leading_float(raw),
                });
            }
            if let (Some(date), Some(raw)) = (&fc_date, row.non_empty(*fc_col)) {
                entry.forecast.push(ConsumptionPoint {
                    date: date.clone(),
                    value: parse_leading_float(raw),
                });
            }
        }
    }

    series
}

/// Rewrites the first `D/M/YYYY` found in `raw` as `YYYY-MM-DD`.
/// Anything without such a date is returned unchanged.
pub fn reformat_date(raw: &str) -> String {
    match EXPORT_DATE.captures(raw) {
        Some(caps) => format!("{}-{:0>2}-{:0>2}", &caps[3], &caps[2], &caps[1]),
        None => raw.to_string(),
    }
}

/// Trims whitespace and a leading and/or trailing double quote.
pub fn clean_value(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let unquoted = unquoted.strip_suffix('"').unwrap_or(unquoted);
    unquoted.trim().to_string()
}

/// Integer from the leading digits of `raw` (optional sign); trailing text is
/// ignored, `"12kg"` reads as 12. No digits means no value.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    s[..end].parse::<i64>().ok()
}

/// Float from the longest numeric prefix of `raw` (sign, digits, fraction,
/// exponent). `"Infinity"` is accepted; no digits means no value.
pub fn parse_leading_float(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        let sign = if bytes.first() == Some(&b'-') { -1.0 } else { 1.0 };
        return Some(sign * f64::INFINITY);
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        let frac_digits = frac_end - end - 1;
        if frac_digits > 0 {
            digits += frac_digits;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> String {
        let mut cols: Vec<String> = vec![
            "RFIDDatestamp".into(),
            "UID".into(),
            "category".into(),
            "Mode".into(),
        ];
        cols.extend((1..=10).map(|c| format!("StockLevel_Cat{}", c)));
        cols.extend(
            [
                "HistorialDates",
                "ForecastDates",
                "HistoricalDataCat1",
                "HistoricalDataCat2",
                "ForecastDataCat1",
                "ForecastDataCat2",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        cols.join(",")
    }

    fn layout() -> ExportLayout {
        ExportLayout::new(10, &[1, 2])
    }

    const STOCK: &str = "60,70,80,90,55,45,35,25,15,5";

    #[test]
    fn end_to_end_single_row() {
        let csv = format!(
            "{}\n01/03/2024 10:15:00,TAG-1,1,1,{},1/1/2024,1/2/2024,500,300,400,250\n",
            header(),
            STOCK
        );
        let parsed = parse_export(&csv, &layout());

        assert_eq!(parsed.movements.len(), 1);
        assert_eq!(parsed.movements[0].tag_id, "TAG-1");
        assert_eq!(parsed.stock_levels.len(), 10);
        assert_eq!(parsed.stock_levels[0], StockLevel { category: 1, level: Some(60) });
        assert_eq!(parsed.stock_levels[1].level, Some(70));
        assert_eq!(parsed.stock_levels[9].level, Some(5));

        let cat1 = &parsed.consumption[&1];
        assert_eq!(cat1.historical, vec![ConsumptionPoint::new("2024-01-01", 500.0)]);
        assert_eq!(cat1.forecast, vec![ConsumptionPoint::new("2024-02-01", 400.0)]);
        let cat2 = &parsed.consumption[&2];
        assert_eq!(cat2.historical, vec![ConsumptionPoint::new("2024-01-01", 300.0)]);
        assert_eq!(cat2.forecast, vec![ConsumptionPoint::new("2024-02-01", 250.0)]);

        assert!(parsed.rejected.is_empty());
        assert!(parsed.missing_columns.is_empty());
    }

    #[test]
    fn malformed_movement_rows_are_dropped_with_reasons() {
        let csv = format!(
            "{h}\n\
             01/03/2024 10:15:00,TAG-1,3,1,{s},,,,,,\n\
             ,TAG-2,3,1,{s},,,,,,\n\
             01/03/2024 10:16:00,,3,1,{s},,,,,,\n\
             01/03/2024 10:17:00,TAG-4,x,1,{s},,,,,,\n\
             01/03/2024 10:18:00,TAG-5,3,out,{s},,,,,,\n\
             01/03/2024 10:19:00,TAG-6,4,2,{s},,,,,,\n",
            h = header(),
            s = STOCK
        );
        let parsed = parse_export(&csv, &layout());

        let tags: Vec<&str> = parsed.movements.iter().map(|m| m.tag_id.as_str()).collect();
        assert_eq!(tags, vec!["TAG-1", "TAG-6"]);

        let reasons: Vec<(usize, RowRejection)> = parsed
            .rejected
            .iter()
            .map(|r| (r.line, r.reason.clone()))
            .collect();
        assert_eq!(
            reasons,
            vec![
                (3, RowRejection::MissingTimestamp),
                (4, RowRejection::MissingTagId),
                (5, RowRejection::InvalidCategory("x".into())),
                (6, RowRejection::InvalidMode("out".into())),
            ]
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        let csv = format!(
            "{h}\n01/03/2024 10:15:00,TAG-1,1,1,{s},,,,,,\n\n   \n01/03/2024 10:16:00,TAG-2,2,0,{s},,,,,,\n",
            h = header(),
            s = STOCK
        );
        let parsed = parse_export(&csv, &layout());
        assert_eq!(parsed.movements.len(), 2);
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn quotes_and_whitespace_are_stripped() {
        let csv = "\"RFIDDatestamp\",\"UID\",\"category\",\"Mode\"\n\"01/03/2024 10:15:00\", \"A7\" ,\"3\",\"1\"\n";
        let parsed = parse_export(csv, &ExportLayout::new(0, &[]));
        assert_eq!(
            parsed.movements,
            vec![MovementEvent {
                timestamp: "01/03/2024 10:15:00".into(),
                tag_id: "A7".into(),
                category: 3,
                mode: 1,
            }]
        );
    }

    #[test]
    fn stock_levels_come_from_first_row_only() {
        let csv = format!(
            "{h}\n01/03/2024 10:15:00,TAG-1,1,1,{s},,,,,,\n01/03/2024 10:16:00,TAG-2,1,1,1,1,1,1,1,1,1,1,1,1,,,,,,\n",
            h = header(),
            s = STOCK
        );
        let parsed = parse_export(&csv, &layout());
        let levels: Vec<Option<i64>> = parsed.stock_levels.iter().map(|l| l.level).collect();
        assert_eq!(levels[0], Some(60));
        assert_eq!(levels[4], Some(55));
    }

    #[test]
    fn blank_second_line_leaves_stock_levels_absent() {
        for blank in ["", "   "] {
            let csv = format!(
                "RFIDDatestamp,UID,category,Mode,StockLevel_Cat1\n{}\n01/03/2024 10:15:00,TAG-1,1,1,60\n",
                blank
            );
            let parsed = parse_export(&csv, &ExportLayout::new(1, &[]));
            assert_eq!(
                parsed.stock_levels,
                vec![StockLevel { category: 1, level: None }],
                "second line {:?}",
                blank
            );
            assert_eq!(parsed.movements.len(), 1);
        }
    }

    #[test]
    fn missing_mode_column_rejects_every_row() {
        let csv = "RFIDDatestamp,UID,category\n\
                   01/03/2024 10:15:00,TAG-1,1\n\
                   01/03/2024 10:16:00,TAG-2,2\n";
        let parsed = parse_export(csv, &ExportLayout::new(0, &[]));

        assert!(parsed.movements.is_empty());
        assert_eq!(
            parsed.rejected,
            vec![
                RejectedRow { line: 2, reason: RowRejection::InvalidMode(String::new()) },
                RejectedRow { line: 3, reason: RowRejection::InvalidMode(String::new()) },
            ]
        );
        assert!(parsed.missing_columns.contains(&"Mode".to_string()));
    }

    #[test]
    fn missing_stock_column_yields_absent_level() {
        let csv = "RFIDDatestamp,UID,category,Mode,StockLevel_Cat1,StockLevel_Cat3\n\
                   01/03/2024 10:15:00,TAG-1,1,1,60,n/a\n";
        let parsed = parse_export(csv, &ExportLayout::new(3, &[]));
        assert_eq!(
            parsed.stock_levels,
            vec![
                StockLevel { category: 1, level: Some(60) },
                StockLevel { category: 2, level: None },
                StockLevel { category: 3, level: None },
            ]
        );
        assert!(parsed.missing_columns.contains(&"StockLevel_Cat2".to_string()));
        assert!(parsed.missing_columns.contains(&"HistorialDates".to_string()));
    }

    #[test]
    fn header_only_export_keeps_fixed_category_set() {
        let parsed = parse_export(&header(), &layout());
        assert!(parsed.movements.is_empty());
        assert_eq!(parsed.stock_levels.len(), 10);
        assert!(parsed.stock_levels.iter().all(|l| l.level.is_none()));
        assert_eq!(parsed.consumption.len(), 2);
        assert!(parsed.consumption[&1].historical.is_empty());
    }

    #[test]
    fn historical_and_forecast_fill_independently() {
        let csv = format!(
            "{h}\n\
             01/03/2024 10:15:00,T1,1,1,{s},1/1/2024,,500,,,\n\
             01/03/2024 10:16:00,T2,1,1,{s},,1/4/2024,,,400,\n\
             01/03/2024 10:17:00,T3,1,1,{s},1/2/2024,1/5/2024,,310,abc,260\n",
            h = header(),
            s = STOCK
        );
        let parsed = parse_export(&csv, &layout());

        let cat1 = &parsed.consumption[&1];
        assert_eq!(cat1.historical, vec![ConsumptionPoint::new("2024-01-01", 500.0)]);
        assert_eq!(
            cat1.forecast,
            vec![
                ConsumptionPoint::new("2024-04-01", 400.0),
                ConsumptionPoint { date: "2024-05-01".into(), value: None },
            ]
        );

        let cat2 = &parsed.consumption[&2];
        assert_eq!(cat2.historical, vec![ConsumptionPoint::new("2024-02-01", 310.0)]);
        assert_eq!(cat2.forecast, vec![ConsumptionPoint::new("2024-05-01", 260.0)]);
    }

    #[test]
    fn unrecognised_dates_pass_through() {
        let csv = format!(
            "{h}\n01/03/2024 10:15:00,T1,1,1,{s},March 2024,2024-04-01,12.5,,7.25,\n",
            h = header(),
            s = STOCK
        );
        let parsed = parse_export(&csv, &layout());
        let cat1 = &parsed.consumption[&1];
        assert_eq!(cat1.historical[0].date, "March 2024");
        assert_eq!(cat1.historical[0].value, Some(12.5));
        assert_eq!(cat1.forecast[0].date, "2024-04-01");
        assert_eq!(cat1.forecast[0].value, Some(7.25));
    }

    #[test]
    fn reformat_date_cases() {
        assert_eq!(reformat_date("5/3/2024"), "2024-03-05");
        assert_eq!(reformat_date("15/03/2024"), "2024-03-15");
        assert_eq!(reformat_date("1/02/2024 00:00:00"), "2024-02-01");
        assert_eq!(reformat_date("2024-03-05"), "2024-03-05");
        assert_eq!(reformat_date(&reformat_date("5/3/2024")), "2024-03-05");
        assert_eq!(reformat_date("soon"), "soon");
    }

    #[test]
    fn leading_int_semantics() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int(" -7"), Some(-7));
        assert_eq!(parse_leading_int("+3"), Some(3));
        assert_eq!(parse_leading_int("12kg"), Some(12));
        assert_eq!(parse_leading_int("3.9"), Some(3));
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_int("abc"), None);
    }

    #[test]
    fn leading_float_semantics() {
        assert_eq!(parse_leading_float("12.5"), Some(12.5));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("5."), Some(5.0));
        assert_eq!(parse_leading_float("-1.25e2x"), Some(-125.0));
        assert_eq!(parse_leading_float("3e"), Some(3.0));
        assert_eq!(parse_leading_float("400 units"), Some(400.0));
        assert_eq!(parse_leading_float("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_leading_float("."), None);
        assert_eq!(parse_leading_float("n/a"), None);
    }

    #[test]
    fn clean_value_strips_one_quote_each_side() {
        assert_eq!(clean_value("  \"UID\"  "), "UID");
        assert_eq!(clean_value("\"\"x\"\""), "\"x\"");
        assert_eq!(clean_value("\"open"), "open");
        assert_eq!(clean_value("\" padded \""), "padded");
    }

    #[test]
    fn layout_deduplicates_consumption_categories() {
        let layout = ExportLayout::new(10, &[2, 1, 2]);
        assert_eq!(layout.consumption_categories, vec![1, 2]);
    }
}
