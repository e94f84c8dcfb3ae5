pub mod columns;
pub mod metrics;
pub mod parser;
pub mod service;
pub mod state;
