// Chart renderer capability and the lazily populated per-pane renderer cache
use crate::domain::chart_data::LineChartDataManager;
use crate::domain::settings::ChartSettings;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PaneId {
    LineDuration,
    LineInstant,
    ClusteredDuration,
    ClusteredInstant,
}

impl PaneId {
    pub const LINE: [PaneId; 2] = [PaneId::LineDuration, PaneId::LineInstant];
    pub const CLUSTERED: [PaneId; 2] = [PaneId::ClusteredDuration, PaneId::ClusteredInstant];

    pub fn is_instant(&self) -> bool {
        matches!(self, PaneId::LineInstant | PaneId::ClusteredInstant)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaneId::LineDuration => "line-duration",
            PaneId::LineInstant => "line-instant",
            PaneId::ClusteredDuration => "clustered-duration",
            PaneId::ClusteredInstant => "clustered-instant",
        }
    }
}

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run line chart
pub trait LineChartRenderer: Send {
    fn render(&mut self, data: &LineChartDataManager) -> anyhow::Result<()>;

    fn scrollbar_x_preview_option_changed(&mut self, show: bool);

    fn dispose(&mut self);
}

/// Chart of server-side aggregates. `data` is the grouped metrics payload as sent by the server.
pub trait ClusteredChartRenderer: Send {
    fn set_data(&mut self, data: Value) -> anyhow::Result<()>;

    fn dispose(&mut self);
}

pub trait RendererFactory: Send + Sync {
    fn line_chart(&self, pane: PaneId, settings: &ChartSettings) -> Box<dyn LineChartRenderer>;

    fn clustered_chart(&self, pane: PaneId) -> Box<dyn ClusteredChartRenderer>;
}

/// Renderers are created on first use and live until `dispose_all`.
pub struct RendererRegistry {
    factory: Arc<dyn RendererFactory>,
    line: BTreeMap<PaneId, Box<dyn LineChartRenderer>>,
    clustered: BTreeMap<PaneId, Box<dyn ClusteredChartRenderer>>,
}

impl RendererRegistry {
    pub fn new(factory: Arc<dyn RendererFactory>) -> Self {
        Self {
            factory,
            line: BTreeMap::new(),
            clustered: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.line.len() + self.clustered.len()
    }

    /// Renders the same data into every line pane. A failing pane is logged and skipped.
    pub fn render_line_charts(&mut self, data: &LineChartDataManager, settings: &ChartSettings) {
        for pane in PaneId::LINE {
            let factory = &self.factory;
            let renderer = self
                .line
                .entry(pane)
                .or_insert_with(|| factory.line_chart(pane, settings));

            if let Err(e) = renderer.render(data) {
                tracing::error!("Cannot render {} chart: {:#}", pane, e);
            }
        }
    }

    pub fn set_clustered_data(&mut self, pane: PaneId, data: Value) {
        let factory = &self.factory;
        let renderer = self
            .clustered
            .entry(pane)
            .or_insert_with(|| factory.clustered_chart(pane));

        if let Err(e) = renderer.set_data(data) {
            tracing::error!("Cannot render {} chart: {:#}", pane, e);
        }
    }

    /// Only already created line charts are notified
    pub fn scrollbar_x_preview_option_changed(&mut self, show: bool) {
        for renderer in self.line.values_mut() {
            renderer.scrollbar_x_preview_option_changed(show);
        }
    }

    pub fn dispose_all(&mut self) {
        for (pane, mut renderer) in std::mem::take(&mut self.clustered) {
            tracing::debug!("Disposing {} chart", pane);
            renderer.dispose();
        }
        for (pane, mut renderer) in std::mem::take(&mut self.line) {
            tracing::debug!("Disposing {} chart", pane);
            renderer.dispose();
        }
    }
}
