// Terminal chart renderers - print a per-metric summary instead of drawing
use crate::application::chart_renderer::{
    ClusteredChartRenderer, LineChartRenderer, PaneId, RendererFactory,
};
use crate::domain::chart_data::LineChartDataManager;
use crate::domain::settings::ChartSettings;
use chrono::DateTime;
use serde_json::Value;

const SPARK_BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const PREVIEW_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq)]
struct Summary {
    min: f64,
    median: f64,
    max: f64,
}

fn summarize(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    Some(Summary {
        min: sorted[0],
        median,
        max: sorted[sorted.len() - 1],
    })
}

/// One block per value, scaled between the series min and max. Long series keep the tail.
fn sparkline(values: &[f64]) -> String {
    let tail = &values[values.len().saturating_sub(PREVIEW_WIDTH)..];
    let Some(summary) = summarize(tail) else {
        return String::new();
    };
    let range = summary.max - summary.min;
    tail.iter()
        .map(|v| {
            if range <= f64::EPSILON {
                return SPARK_BLOCKS[0];
            }
            let idx = ((v - summary.min) / range * (SPARK_BLOCKS.len() - 1) as f64).round() as usize;
            SPARK_BLOCKS[idx.min(SPARK_BLOCKS.len() - 1)]
        })
        .collect()
}

fn format_time(t: i64) -> String {
    DateTime::from_timestamp_millis(t)
        .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| t.to_string())
}

pub struct TextLineChartRenderer {
    pane: PaneId,
    show_preview: bool,
    disposed: bool,
}

impl TextLineChartRenderer {
    pub fn new(pane: PaneId, settings: &ChartSettings) -> Self {
        Self {
            pane,
            show_preview: settings.show_scrollbar_x_preview,
            disposed: false,
        }
    }

    fn lines(&self, data: &LineChartDataManager) -> Vec<String> {
        let is_instant = self.pane.is_instant();
        let mut lines = vec![match (data.metrics.first(), data.metrics.last()) {
            (Some(first), Some(last)) => format!(
                "[{}] {} runs, {} .. {}",
                self.pane,
                data.metrics.len(),
                format_time(first.t),
                format_time(last.t)
            ),
            _ => format!("[{}] no runs", self.pane),
        }];

        for descriptor in data.descriptors(is_instant) {
            if descriptor.hidden_by_default {
                continue;
            }
            let values: Vec<f64> = data
                .metrics
                .iter()
                .filter_map(|m| {
                    let values = if is_instant {
                        &m.instant_metrics
                    } else {
                        &m.duration_metrics
                    };
                    values.get(&descriptor.key).copied()
                })
                .collect();
            let Some(summary) = summarize(&values) else {
                continue;
            };

            let mut line = format!(
                "  {:<32} min {:>8.1}  median {:>8.1}  max {:>8.1} ms",
                descriptor.name, summary.min, summary.median, summary.max
            );
            if self.show_preview {
                line.push_str("  ");
                line.push_str(&sparkline(&values));
            }
            lines.push(line);
        }
        lines
    }
}

impl LineChartRenderer for TextLineChartRenderer {
    fn render(&mut self, data: &LineChartDataManager) -> anyhow::Result<()> {
        if self.disposed {
            anyhow::bail!("{} chart is disposed", self.pane);
        }
        for line in self.lines(data) {
            println!("{}", line);
        }
        Ok(())
    }

    fn scrollbar_x_preview_option_changed(&mut self, show: bool) {
        self.show_preview = show;
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}

pub struct TextClusteredChartRenderer {
    pane: PaneId,
    disposed: bool,
}

impl TextClusteredChartRenderer {
    pub fn new(pane: PaneId) -> Self {
        Self {
            pane,
            disposed: false,
        }
    }

    fn lines(&self, data: &Value) -> Vec<String> {
        match data {
            Value::Array(groups) => {
                let mut lines = vec![format!("[{}] {} groups", self.pane, groups.len())];
                lines.extend(groups.iter().map(|group| format!("  {}", group)));
                lines
            }
            Value::Object(series) => {
                let mut lines = vec![format!("[{}] {} series", self.pane, series.len())];
                lines.extend(series.iter().map(|(name, points)| format!("  {:<32} {}", name, points)));
                lines
            }
            other => vec![format!("[{}] {}", self.pane, other)],
        }
    }
}

impl ClusteredChartRenderer for TextClusteredChartRenderer {
    fn set_data(&mut self, data: Value) -> anyhow::Result<()> {
        if self.disposed {
            anyhow::bail!("{} chart is disposed", self.pane);
        }
        for line in self.lines(&data) {
            println!("{}", line);
        }
        Ok(())
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TextRendererFactory;

impl RendererFactory for TextRendererFactory {
    fn line_chart(&self, pane: PaneId, settings: &ChartSettings) -> Box<dyn LineChartRenderer> {
        Box::new(TextLineChartRenderer::new(pane, settings))
    }

    fn clustered_chart(&self, pane: PaneId) -> Box<dyn ClusteredChartRenderer> {
        Box::new(TextClusteredChartRenderer::new(pane))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{InfoResponse, Metrics};
    use serde_json::json;
    use std::collections::HashMap;

    fn run(t: i64, duration: &[(&str, f64)]) -> Metrics {
        Metrics {
            t,
            duration_metrics: duration.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            instant_metrics: HashMap::new(),
        }
    }

    fn data() -> LineChartDataManager {
        let info = InfoResponse {
            duration_metrics_names: vec!["bootstrap".to_string(), "moduleLoading".to_string()],
            ..Default::default()
        };
        let metrics = vec![
            run(0, &[("bootstrap", 10.0), ("moduleLoading", 5.0)]),
            run(60_000, &[("bootstrap", 30.0)]),
            run(120_000, &[("bootstrap", 20.0)]),
        ];
        LineChartDataManager::new(metrics, &info)
    }

    #[test]
    fn test_summarize() {
        assert_eq!(summarize(&[]), None);
        assert_eq!(
            summarize(&[3.0, 1.0, 2.0, 10.0]),
            Some(Summary {
                min: 1.0,
                median: 2.5,
                max: 10.0
            })
        );
    }

    #[test]
    fn test_sparkline_scales_to_range() {
        assert_eq!(sparkline(&[0.0, 7.0, 14.0]), "▁▅█");
        assert_eq!(sparkline(&[5.0, 5.0]), "▁▁");
        assert_eq!(sparkline(&[1.0; 100]).chars().count(), PREVIEW_WIDTH);
    }

    #[test]
    fn test_line_chart_skips_hidden_metrics() {
        let settings = ChartSettings {
            show_scrollbar_x_preview: false,
            ..Default::default()
        };
        let renderer = TextLineChartRenderer::new(PaneId::LineDuration, &settings);

        let lines = renderer.lines(&data());

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "[line-duration] 3 runs, 1970-01-01 00:00 .. 1970-01-01 00:02");
        assert!(lines[1].contains("bootstrap"));
        assert!(lines[1].contains("median     20.0"));
        assert!(!lines.iter().any(|l| l.contains("moduleLoading")));
    }

    #[test]
    fn test_preview_toggle() {
        let mut renderer = TextLineChartRenderer::new(PaneId::LineDuration, &ChartSettings::default());
        assert!(renderer.lines(&data())[1].ends_with("▁█▅"));

        renderer.scrollbar_x_preview_option_changed(false);
        assert!(!renderer.lines(&data())[1].contains('▁'));
    }

    #[test]
    fn test_disposed_renderer_refuses_data() {
        let mut renderer = TextClusteredChartRenderer::new(PaneId::ClusteredInstant);
        assert!(renderer.set_data(json!([])).is_ok());
        renderer.dispose();
        assert!(renderer.set_data(json!([])).is_err());
    }

    #[test]
    fn test_clustered_lines() {
        let renderer = TextClusteredChartRenderer::new(PaneId::ClusteredDuration);
        let lines = renderer.lines(&json!({"bootstrap": [1, 2]}));
        assert_eq!(lines[0], "[clustered-duration] 1 series");
        assert!(lines[1].starts_with("  bootstrap"));
        assert!(lines[1].ends_with("[1,2]"));
    }
}
