use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub planning: PlanningConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where the CSV export comes from. `path` wins over `url` when both are set.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub url: Option<String>,
    pub path: Option<String>,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    #[serde(default = "default_refresh_interval_seconds")]
    pub interval_seconds: u64,
}

/// Reorder point parameters
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct PlanningConfig {
    #[serde(default = "default_lead_time_months")]
    pub lead_time_months: f64,
    #[serde(default = "default_safety_stock")]
    pub safety_stock: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_table_row_limit")]
    pub table_row_limit: usize,
    /// Number of `StockLevel_Cat<N>` columns read from the export
    #[serde(default = "default_tracked_category_count")]
    pub tracked_category_count: u8,
    /// Categories that have `HistoricalDataCat<N>`/`ForecastDataCat<N>` columns
    #[serde(default = "default_consumption_categories")]
    pub consumption_categories: Vec<u8>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_refresh_interval_seconds() -> u64 {
    20
}

fn default_lead_time_months() -> f64 {
    0.5
}

fn default_safety_stock() -> f64 {
    1000.0
}

fn default_table_row_limit() -> usize {
    50
}

fn default_tracked_category_count() -> u8 {
    10
}

fn default_consumption_categories() -> Vec<u8> {
    vec![1, 2]
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "dist".to_string()
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_refresh_interval_seconds(),
        }
    }
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            lead_time_months: default_lead_time_months(),
            safety_stock: default_safety_stock(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            table_row_limit: default_table_row_limit(),
            tracked_category_count: default_tracked_category_count(),
            consumption_categories: default_consumption_categories(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[source]
url = "https://docs.google.com/spreadsheets/d/16NSBCGMg1gi6_p-EjCflaELG8y2LtouKenWINRaXQuY/gviz/tq?tqx=out:csv&sheet=DataForWebPage"
request_timeout_seconds = 30

[refresh]
interval_seconds = 20

[planning]
lead_time_months = 0.5
safety_stock = 1000.0

[dashboard]
table_row_limit = 50
tracked_category_count = 10
consumption_categories = [1, 2]

[server]
port = 3000
static_dir = "dist"
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                return parse_config(&contents);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> anyhow::Result<()> {
    if config.source.url.is_none() && config.source.path.is_none() {
        anyhow::bail!("[source] needs either `url` or `path`");
    }
    if config.refresh.interval_seconds == 0 {
        anyhow::bail!("[refresh] interval_seconds must be positive");
    }
    let tracked = config.dashboard.tracked_category_count;
    if let Some(bad) = config
        .dashboard
        .consumption_categories
        .iter()
        .find(|c| **c == 0 || **c > tracked)
    {
        anyhow::bail!(
            "consumption category {} is outside the tracked range 1..={}",
            bad,
            tracked
        );
    }
    Ok(())
}

/// Resolves a relative export path against the executable directory
pub fn resolve_source_path(path: &str) -> PathBuf {
    let source_path = Path::new(path);

    if source_path.is_absolute() {
        return source_path.to_path_buf();
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let resolved_path = exe_dir.join(source_path);
            if resolved_path.exists() {
                return resolved_path;
            }
        }
    }

    PathBuf::from(path)
}
