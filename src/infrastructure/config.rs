use crate::application::fetch_orchestrator::Timings;
use crate::domain::settings::{AggregationOperator, ChartSettings, DEFAULT_QUANTILE};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:9044";

#[derive(Debug, Deserialize, Clone)]
pub struct VisualizerConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default)]
    pub aggregation_operator: Option<AggregationOperator>,
    #[serde(default = "default_quantile")]
    pub quantile: f64,
    #[serde(default = "default_true")]
    pub show_scrollbar_x_preview: bool,
    #[serde(default = "default_info_debounce_ms")]
    pub info_debounce_ms: u64,
    #[serde(default = "default_quantile_debounce_ms")]
    pub quantile_debounce_ms: u64,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_quantile() -> f64 {
    DEFAULT_QUANTILE
}

fn default_true() -> bool {
    true
}

fn default_info_debounce_ms() -> u64 {
    1000
}

fn default_quantile_debounce_ms() -> u64 {
    300
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl VisualizerConfig {
    /// Settings a fresh session starts from
    pub fn initial_settings(&self) -> ChartSettings {
        ChartSettings {
            server_url: self.server_url.trim_end_matches('/').to_string(),
            aggregation_operator: self.aggregation_operator,
            quantile: self.quantile,
            show_scrollbar_x_preview: self.show_scrollbar_x_preview,
            ..Default::default()
        }
    }

    pub fn timings(&self) -> Timings {
        Timings {
            info_debounce: Duration::from_millis(self.info_debounce_ms),
            quantile_debounce: Duration::from_millis(self.quantile_debounce_ms),
        }
    }
}

/// `config/visualizer.*` if present, overridden by `VISUALIZER__*` environment variables
pub fn load_visualizer_config() -> anyhow::Result<VisualizerConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/visualizer").required(false))
        .add_source(config::Environment::with_prefix("VISUALIZER").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
