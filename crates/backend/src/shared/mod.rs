pub mod config;
pub mod export_source;
pub mod format;
