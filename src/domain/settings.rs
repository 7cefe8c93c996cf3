// Chart settings domain model
use crate::domain::model::MachineId;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_AGGREGATION_OPERATOR: AggregationOperator = AggregationOperator::Median;
pub const DEFAULT_QUANTILE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationOperator {
    Median,
    Min,
    Max,
    Quantile,
}

impl AggregationOperator {
    pub const ALL: [AggregationOperator; 4] = [
        AggregationOperator::Median,
        AggregationOperator::Min,
        AggregationOperator::Max,
        AggregationOperator::Quantile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationOperator::Median => "median",
            AggregationOperator::Min => "min",
            AggregationOperator::Max => "max",
            AggregationOperator::Quantile => "quantile",
        }
    }

    /// Only `quantile` is parameterised
    pub fn takes_argument(&self) -> bool {
        matches!(self, AggregationOperator::Quantile)
    }
}

impl fmt::Display for AggregationOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("unknown aggregation operator: {}", s))
    }
}

/// User-facing chart settings, persisted through a `SettingsStore`.
///
/// The aggregation operator stays `None` until the user picks one; the default is
/// applied when a query is built, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    pub server_url: String,
    pub selected_product: Option<String>,
    pub selected_machine: Option<MachineId>,
    pub aggregation_operator: Option<AggregationOperator>,
    pub quantile: f64,
    pub show_scrollbar_x_preview: bool,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            selected_product: None,
            selected_machine: None,
            aggregation_operator: None,
            quantile: DEFAULT_QUANTILE,
            show_scrollbar_x_preview: true,
        }
    }
}

impl ChartSettings {
    /// Selected product, treating an empty string as no selection
    pub fn product(&self) -> Option<&str> {
        self.selected_product.as_deref().filter(|p| !p.is_empty())
    }
}
