// Line chart data - descriptor-tagged metrics handed to line chart renderers
use crate::domain::model::{InfoResponse, Metrics};

/// Duration metrics that start hidden in the legend
const HIDDEN_METRICS_BY_DEFAULT: [&str; 2] = ["moduleLoading", "pluginDescriptorLoading"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub key: String,
    pub name: String,
    pub hidden_by_default: bool,
}

impl MetricDescriptor {
    pub fn new(key: &str, hidden_by_default: bool) -> Self {
        Self {
            key: key.to_string(),
            name: key.to_string(),
            hidden_by_default,
        }
    }
}

pub fn duration_descriptors(names: &[String]) -> Vec<MetricDescriptor> {
    names
        .iter()
        .map(|key| MetricDescriptor::new(key, HIDDEN_METRICS_BY_DEFAULT.contains(&key.as_str())))
        .collect()
}

pub fn instant_descriptors(names: &[String]) -> Vec<MetricDescriptor> {
    names
        .iter()
        .map(|key| MetricDescriptor::new(key, false))
        .collect()
}

/// Everything a line chart needs for one render pass. Rebuilt from scratch
/// whenever the metrics or the info response change.
#[derive(Debug, Clone)]
pub struct LineChartDataManager {
    pub metrics: Vec<Metrics>,
    pub duration_metric_descriptors: Vec<MetricDescriptor>,
    pub instant_metric_descriptors: Vec<MetricDescriptor>,
}

impl LineChartDataManager {
    pub fn new(metrics: Vec<Metrics>, info: &InfoResponse) -> Self {
        Self {
            metrics,
            duration_metric_descriptors: duration_descriptors(&info.duration_metrics_names),
            instant_metric_descriptors: instant_descriptors(&info.instant_metrics_names),
        }
    }

    pub fn descriptors(&self, is_instant: bool) -> &[MetricDescriptor] {
        if is_instant {
            &self.instant_metric_descriptors
        } else {
            &self.duration_metric_descriptors
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_duration_descriptors_hide_module_loading() {
        let info = InfoResponse {
            duration_metrics_names: names(&["moduleLoading", "bootstrap", "pluginDescriptorLoading"]),
            ..Default::default()
        };

        let manager = LineChartDataManager::new(Vec::new(), &info);
        let descriptors = manager.descriptors(false);

        assert_eq!(descriptors.len(), 3);
        assert_eq!(descriptors[0], MetricDescriptor::new("moduleLoading", true));
        assert_eq!(descriptors[1], MetricDescriptor::new("bootstrap", false));
        assert!(descriptors[2].hidden_by_default);
    }

    #[test]
    fn test_instant_descriptors_are_always_visible() {
        let info = InfoResponse {
            instant_metrics_names: names(&["splash", "moduleLoading"]),
            ..Default::default()
        };

        let manager = LineChartDataManager::new(vec![Metrics::default()], &info);
        let keys: Vec<&str> = manager.descriptors(true).iter().map(|d| d.key.as_str()).collect();

        assert_eq!(keys, vec!["splash", "moduleLoading"]);
        assert!(manager.descriptors(true).iter().all(|d| !d.hidden_by_default));
        assert_eq!(manager.metrics.len(), 1);
        assert!(manager.descriptors(false).is_empty());
    }
}
