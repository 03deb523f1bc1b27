use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub data_csv: PathBuf,
    #[serde(default = "default_date_column")]
    pub date_column: String,
    #[serde(default = "default_region_column")]
    pub region_column: String,
    /// Optional display-name column (e.g. CountryName)
    pub name_column: Option<String>,
    #[serde(default = "default_value_column")]
    pub value_column: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    /// Outbreak threshold: the window starts at the first value above this
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Number of days to forecast past the last observation
    #[serde(default = "default_window")]
    pub window: usize,
    /// Minimum observations required before attempting a fit
    #[serde(default = "default_min_points")]
    pub min_points: usize,
    /// Evaluation budget for the curve fitter
    #[serde(default = "default_max_evaluations")]
    pub max_evaluations: usize,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            threshold: default_threshold(),
            window: default_window(),
            min_points: default_min_points(),
            max_evaluations: default_max_evaluations(),
            parallel: default_parallel(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub root: PathBuf,
    /// Base name of the combined datasets (<name>.csv / <name>.json)
    pub name: String,
    #[serde(default)]
    pub chart_format: ChartFormat,
    /// Namespaces chart filenames when region keys collide across datasets
    pub dataset_tag: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    #[default]
    Svg,
    Png,
}

impl ChartFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Svg => "svg",
            ChartFormat::Png => "png",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
        }
    }
}

fn default_date_column() -> String {
    "Date".to_string()
}

fn default_region_column() -> String {
    "CountryCode".to_string()
}

fn default_value_column() -> String {
    "Confirmed".to_string()
}

fn default_threshold() -> f64 {
    10.0
}

fn default_window() -> usize {
    3
}

fn default_min_points() -> usize {
    10
}

fn default_max_evaluations() -> usize {
    1_000_000
}

fn default_parallel() -> bool {
    true
}

fn default_port() -> u16 {
    8080
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
