use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{MovementDirection, StockPriority};

/// Label shown when the projected stock never goes negative within the forecast horizon
pub const NO_STOCK_BREAK_LABEL: &str = "No estimado";
/// Label shown for a movement timestamp that is not `DD/MM/YYYY HH:MM:SS`
pub const INVALID_DATE_LABEL: &str = "Invalid Date";

// ---------------------------------------------------------------------------
// Parsed records
// ---------------------------------------------------------------------------

/// A single RFID read from the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementEvent {
    /// Raw `DD/MM/YYYY HH:MM:SS` string, kept as exported
    pub timestamp: String,
    pub tag_id: String,
    pub category: i64,
    pub mode: i64,
}

impl MovementEvent {
    pub fn direction(&self) -> MovementDirection {
        MovementDirection::from_mode(self.mode)
    }
}

/// Current stock of one tracked category.
///
/// `level` is `None` when the column is missing or the cell is not an integer.
/// The same number feeds the percentage bar and the unit arithmetic of the
/// planning metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub category: u8,
    pub level: Option<i64>,
}

impl StockLevel {
    /// Stock in units for planning arithmetic; an absent level counts as zero.
    pub fn units(&self) -> f64 {
        self.level.unwrap_or(0) as f64
    }
}

/// One month of consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionPoint {
    /// `YYYY-MM-DD` when the export date was recognised, otherwise verbatim
    pub date: String,
    /// Thousands of units; `None` when the cell is not a number
    pub value: Option<f64>,
}

impl ConsumptionPoint {
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        Self {
            date: date.into(),
            value: Some(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionSeries {
    pub historical: Vec<ConsumptionPoint>,
    pub forecast: Vec<ConsumptionPoint>,
}

// ---------------------------------------------------------------------------
// Derived metrics
// ---------------------------------------------------------------------------

/// Planning metrics of one category, recomputed on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryMetrics {
    /// Unrounded months of coverage
    pub coverage_months: f64,
    /// 1-based month offset of the first projected shortage
    pub stock_break_month: Option<u32>,
    pub reorder_point: f64,
    pub next_month_demand: f64,
    pub priority: StockPriority,
}

impl InventoryMetrics {
    pub fn coverage_label(&self) -> String {
        format!("{:.2}", self.coverage_months)
    }

    pub fn reorder_point_label(&self) -> String {
        format!("{:.0}", self.reorder_point)
    }

    pub fn stock_break_label(&self) -> String {
        match self.stock_break_month {
            Some(month) => month.to_string(),
            None => NO_STOCK_BREAK_LABEL.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Presentation payload
// ---------------------------------------------------------------------------

/// Line chart data: historical and forecast datasets over a shared label axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionChart {
    pub labels: Vec<String>,
    pub historical: Vec<Option<f64>>,
    pub forecast: Vec<Option<f64>>,
}

impl ConsumptionChart {
    /// Historical points come first, forecast points after; each dataset is
    /// padded with gaps over the other one's span.
    pub fn from_series(series: &ConsumptionSeries) -> Self {
        let hist_len = series.historical.len();
        let fc_len = series.forecast.len();

        let labels = series
            .historical
            .iter()
            .chain(series.forecast.iter())
            .map(|p| p.date.clone())
            .collect();

        let historical = series
            .historical
            .iter()
            .map(|p| p.value)
            .chain(std::iter::repeat(None).take(fc_len))
            .collect();

        let forecast = std::iter::repeat(None)
            .take(hist_len)
            .chain(series.forecast.iter().map(|p| p.value))
            .collect();

        Self {
            labels,
            historical,
            forecast,
        }
    }
}

/// Row of the movements table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRow {
    pub timestamp: String,
    /// `YYYY-MM-DD HH:MM:SS`, `None` when the raw timestamp is unreadable
    pub display_time: Option<String>,
    /// `display_time` or "Invalid Date"
    pub display_time_label: String,
    pub tag_id: String,
    pub category: i64,
    pub mode: i64,
    pub direction: MovementDirection,
    /// "Ingreso" / "Salida"
    pub direction_label: String,
}

impl MovementRow {
    pub fn new(event: &MovementEvent, display_time: Option<String>) -> Self {
        let direction = event.direction();
        Self {
            timestamp: event.timestamp.clone(),
            display_time_label: display_time
                .clone()
                .unwrap_or_else(|| INVALID_DATE_LABEL.to_string()),
            display_time,
            tag_id: event.tag_id.clone(),
            category: event.category,
            mode: event.mode,
            direction,
            direction_label: direction.display_name().to_string(),
        }
    }
}

/// Planning card of a category that has consumption data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPlanning {
    pub category: u8,
    pub stock_level: Option<i64>,
    pub series: ConsumptionSeries,
    pub chart: ConsumptionChart,
    pub metrics: InventoryMetrics,
    pub coverage_label: String,
    pub reorder_point_label: String,
    pub stock_break_label: String,
    pub priority_label: String,
    pub priority_color: String,
}

impl CategoryPlanning {
    pub fn new(
        category: u8,
        stock_level: Option<i64>,
        series: ConsumptionSeries,
        metrics: InventoryMetrics,
    ) -> Self {
        let chart = ConsumptionChart::from_series(&series);
        Self {
            category,
            stock_level,
            chart,
            coverage_label: metrics.coverage_label(),
            reorder_point_label: metrics.reorder_point_label(),
            stock_break_label: metrics.stock_break_label(),
            priority_label: metrics.priority.display_name().to_string(),
            priority_color: metrics.priority.color().to_string(),
            series,
            metrics,
        }
    }
}

/// A movement row dropped by the parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRowDto {
    /// 1-based line number in the export (header is line 1)
    pub line: usize,
    pub reason: String,
}

/// Snapshot served to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryOverviewResponse {
    pub generated_at: DateTime<Utc>,
    /// Period in format "YYYY-MM"
    pub reference_month: String,
    /// Newest first, capped at the table row limit
    pub movements: Vec<MovementRow>,
    pub stock_levels: Vec<StockLevel>,
    pub planning: Vec<CategoryPlanning>,
    pub rejected_rows: usize,
}

/// Query for the movements table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementsQuery {
    pub category: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    Completed,
    Skipped,
    Failed,
}

/// Result of a manual refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub status: RefreshStatus,
    pub message: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
}
