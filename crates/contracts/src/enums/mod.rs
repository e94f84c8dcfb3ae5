pub mod movement_direction;
pub mod stock_priority;

pub use movement_direction::MovementDirection;
pub use stock_priority::StockPriority;
