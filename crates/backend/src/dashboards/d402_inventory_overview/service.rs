use chrono::{DateTime, Local, NaiveDate, Utc};
use contracts::dashboards::d402_inventory_overview::{
    CategoryPlanning, InventoryOverviewResponse, MovementEvent, MovementRow, RejectedRowDto,
    StockLevel,
};
use std::sync::Arc;

use super::metrics::compute_metrics;
use super::parser::{parse_export, ExportLayout, ParsedExport};
use super::state::DashboardState;
use crate::shared::config::{Config, PlanningConfig};
use crate::shared::export_source::ExportSource;
use crate::shared::format::format_movement_time;

/// How a refresh cycle ended
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Completed { generated_at: DateTime<Utc> },
    /// Another cycle was still running
    Skipped,
    /// Fetch failed; the previous snapshot is kept
    Failed { message: String },
}

/// Fetch → parse → compute → publish
pub struct InventoryOverviewService {
    source: Arc<dyn ExportSource>,
    state: Arc<DashboardState>,
    layout: ExportLayout,
    planning: PlanningConfig,
    table_row_limit: usize,
}

impl InventoryOverviewService {
    pub fn new(source: Arc<dyn ExportSource>, state: Arc<DashboardState>, config: &Config) -> Self {
        Self {
            source,
            state,
            layout: ExportLayout::new(
                config.dashboard.tracked_category_count,
                &config.dashboard.consumption_categories,
            ),
            planning: config.planning,
            table_row_limit: config.dashboard.table_row_limit,
        }
    }

    pub fn state(&self) -> &Arc<DashboardState> {
        &self.state
    }

    /// Run one cycle with today's local date as the reference month.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.refresh_at(Local::now().date_naive()).await
    }

    pub async fn refresh_at(&self, reference: NaiveDate) -> RefreshOutcome {
        let Some(_guard) = self.state.try_begin_refresh() else {
            tracing::info!("Inventory refresh skipped: previous cycle still running");
            return RefreshOutcome::Skipped;
        };

        let started = std::time::Instant::now();

        let text = match self.source.fetch().await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(
                    "Inventory refresh failed fetching {}: {}",
                    self.source.describe(),
                    e
                );
                return RefreshOutcome::Failed {
                    message: e.to_string(),
                };
            }
        };

        let parsed = parse_export(&text, &self.layout);
        let generated_at = Utc::now();
        let (snapshot, rejected) = build_overview(
            parsed,
            reference,
            &self.planning,
            self.table_row_limit,
            generated_at,
        );

        tracing::info!(
            "Inventory refresh completed in {}ms: {} movements shown, {} planning categories, {} rejected rows",
            started.elapsed().as_millis(),
            snapshot.movements.len(),
            snapshot.planning.len(),
            snapshot.rejected_rows
        );

        self.state.publish(snapshot, rejected);
        RefreshOutcome::Completed { generated_at }
    }
}

/// Assemble the presentation snapshot from one parse.
pub fn build_overview(
    parsed: ParsedExport,
    reference: NaiveDate,
    planning: &PlanningConfig,
    table_row_limit: usize,
    generated_at: DateTime<Utc>,
) -> (InventoryOverviewResponse, Vec<RejectedRowDto>) {
    let ParsedExport {
        movements,
        stock_levels,
        consumption,
        rejected,
        ..
    } = parsed;

    let movement_rows: Vec<MovementRow> = movements
        .iter()
        .rev()
        .take(table_row_limit)
        .map(movement_row)
        .collect();

    let planning_cards: Vec<CategoryPlanning> = consumption
        .into_iter()
        .map(|(category, series)| {
            let stock_level = stock_levels
                .iter()
                .find(|l| l.category == category)
                .cloned()
                .unwrap_or_else(|| StockLevel { category, level: None });
            let metrics = compute_metrics(&stock_level, &series.forecast, reference, planning);
            CategoryPlanning::new(category, stock_level.level, series, metrics)
        })
        .collect();

    let rejected: Vec<RejectedRowDto> = rejected
        .into_iter()
        .map(|r| RejectedRowDto {
            line: r.line,
            reason: r.reason.to_string(),
        })
        .collect();

    let response = InventoryOverviewResponse {
        generated_at,
        reference_month: reference.format("%Y-%m").to_string(),
        movements: movement_rows,
        stock_levels,
        planning: planning_cards,
        rejected_rows: rejected.len(),
    };

    (response, rejected)
}

pub fn movement_row(event: &MovementEvent) -> MovementRow {
    MovementRow::new(event, format_movement_time(&event.timestamp))
}

/// Rows of one category, or all rows when no category is given
pub fn filter_movements(rows: &[MovementRow], category: Option<i64>) -> Vec<MovementRow> {
    rows.iter()
        .filter(|row| category.map_or(true, |c| row.category == c))
        .cloned()
        .collect()
}
