use serde::{Deserialize, Serialize};

/// Replenishment priority of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StockPriority {
    Low,
    Medium,
    Critical,
}

impl StockPriority {
    /// Человекочитаемое название (как на дашборде)
    pub fn display_name(&self) -> &'static str {
        match self {
            StockPriority::Low => "Baja",
            StockPriority::Medium => "Media",
            StockPriority::Critical => "Crítica",
        }
    }

    /// Hex colour used for the priority label.
    pub fn color(&self) -> &'static str {
        match self {
            StockPriority::Low => "#2ecc71",
            StockPriority::Medium => "#f39c12",
            StockPriority::Critical => "#e74c3c",
        }
    }
}
