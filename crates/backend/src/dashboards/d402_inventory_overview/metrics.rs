//! Inventory planning metrics for one category.
//!
//! - Coverage: months the current stock lasts against the forecast from the
//!   reference month on; months with no positive demand count as covered.
//! - Reorder point: next month's demand x lead time + safety stock.
//! - Priority: Critical below the reorder point, Medium under three months of
//!   next-month demand, Low otherwise.
//! - Stock break: first forecast month where projected stock goes negative.
//!
//! Stock levels are used as raw units here even though the same number is
//! shown as a percentage bar; the export does not say which one it is.

use chrono::{Datelike, Months, NaiveDate};
use contracts::dashboards::d402_inventory_overview::{
    ConsumptionPoint, InventoryMetrics, StockLevel,
};
use contracts::enums::StockPriority;

use crate::shared::config::PlanningConfig;

/// Stock-to-demand ratio under which a category is flagged Medium
const MEDIUM_PRIORITY_MONTHS: f64 = 3.0;

/// Compute all metrics of one category against `reference` ("today").
/// An absent stock level counts as zero.
pub fn compute_metrics(
    stock_level: &StockLevel,
    forecast: &[ConsumptionPoint],
    reference: NaiveDate,
    planning: &PlanningConfig,
) -> InventoryMetrics {
    let stock = stock_level.units();
    let upcoming = upcoming_demand(forecast, reference);

    let coverage_months = coverage_months(stock, &upcoming);
    let next_month_demand = next_month_demand(forecast, reference);
    let reorder_point = reorder_point(next_month_demand, planning);
    let priority = classify_priority(stock, reorder_point, next_month_demand);
    let stock_break_month = stock_break_month(stock, &upcoming);

    InventoryMetrics {
        coverage_months,
        stock_break_month,
        reorder_point,
        next_month_demand,
        priority,
    }
}

/// Forecast values from the reference month onwards, in forecast order.
/// Points whose date has no readable `YYYY-MM` prefix are left out; absent
/// values count as zero demand.
pub fn upcoming_demand(forecast: &[ConsumptionPoint], reference: NaiveDate) -> Vec<f64> {
    let current_year = reference.year();
    let current_month = reference.month();

    forecast
        .iter()
        .filter(|point| match year_month(&point.date) {
            Some((year, month)) => {
                year > current_year || (year == current_year && month >= current_month)
            }
            None => false,
        })
        .map(|point| point.value.unwrap_or(0.0))
        .collect()
}

pub fn coverage_months(stock: f64, demand: &[f64]) -> f64 {
    let mut remaining = stock;
    let mut coverage = 0.0;

    for &monthly in demand {
        if monthly <= 0.0 {
            coverage += 1.0;
            continue;
        }
        if remaining <= 0.0 {
            break;
        }
        if remaining >= monthly {
            coverage += 1.0;
            remaining -= monthly;
        } else {
            coverage += remaining / monthly;
            break;
        }
    }

    coverage
}

/// `YYYY-MM` of the month after `reference`
pub fn next_month_prefix(reference: NaiveDate) -> Option<String> {
    NaiveDate::from_ymd_opt(reference.year(), reference.month(), 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .map(|next| next.format("%Y-%m").to_string())
}

/// Demand of the first forecast point dated in the month after `reference`,
/// zero if there is none.
pub fn next_month_demand(forecast: &[ConsumptionPoint], reference: NaiveDate) -> f64 {
    let Some(prefix) = next_month_prefix(reference) else {
        return 0.0;
    };

    forecast
        .iter()
        .find(|point| point.date.starts_with(&prefix))
        .and_then(|point| point.value)
        .unwrap_or(0.0)
}

pub fn reorder_point(next_month_demand: f64, planning: &PlanningConfig) -> f64 {
    next_month_demand * planning.lead_time_months + planning.safety_stock
}

pub fn classify_priority(stock: f64, reorder_point: f64, next_month_demand: f64) -> StockPriority {
    if stock < reorder_point {
        StockPriority::Critical
    } else if next_month_demand > 0.0 && stock / next_month_demand < MEDIUM_PRIORITY_MONTHS {
        StockPriority::Medium
    } else {
        StockPriority::Low
    }
}

/// 1-based month in which the running balance first drops below zero.
pub fn stock_break_month(stock: f64, demand: &[f64]) -> Option<u32> {
    let mut balance = stock;
    for (i, monthly) in demand.iter().enumerate() {
        balance -= monthly;
        if balance < 0.0 {
            return Some(i as u32 + 1);
        }
    }
    None
}

fn year_month(date: &str) -> Option<(i32, u32)> {
    let mut parts = date.split('-');
    let year = parts.next()?.trim().parse::<i32>().ok()?;
    let month = parts.next()?.trim().parse::<u32>().ok()?;
    Some((year, month))
}
