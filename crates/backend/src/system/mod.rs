pub mod middleware;
pub mod tasks;
pub mod tracing;
