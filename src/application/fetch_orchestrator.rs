// Fetch orchestrator - session actor that owns settings, selection and chart renderers
//
// Every input (user change, timer, fetch result) arrives as a message and is handled to
// completion before the next one, so selection repair always runs in the same step as
// the mutation that caused it. Fetches run as spawned tasks and report back through the
// same channel; each carries a per-target sequence number and only the latest one is
// applied.
use crate::application::chart_renderer::{PaneId, RendererFactory, RendererRegistry};
use crate::application::debounce::Debouncer;
use crate::application::json_loader::{load_typed, JsonLoader, LoadError, Notification, Notifier};
use crate::application::selection::{FetchRound, SelectionEvent, SelectionStateMachine};
use crate::application::settings_store::SettingsStore;
use crate::domain::chart_data::LineChartDataManager;
use crate::domain::model::{InfoResponse, Machine, MachineId, Metrics};
use crate::domain::query::{grouped_metrics_url, info_url, line_metrics_url};
use crate::domain::settings::{AggregationOperator, ChartSettings};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

pub const INFO_DEBOUNCE: Duration = Duration::from_millis(1000);
pub const QUANTILE_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy)]
pub struct Timings {
    /// Quiet period after the last server URL edit before `/info` is requested
    pub info_debounce: Duration,
    /// Quiet period after the last quantile edit before clustered data is reloaded
    pub quantile_debounce: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            info_debounce: INFO_DEBOUNCE,
            quantile_debounce: QUANTILE_DEBOUNCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsChange {
    ServerUrl(String),
    Product(Option<String>),
    Machine(Option<MachineId>),
    AggregationOperator(Option<AggregationOperator>),
    Quantile(f64),
    ShowScrollbarXPreview(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub settings: ChartSettings,
    pub products: Vec<String>,
    pub machines: Vec<Machine>,
    pub is_fetching: bool,
    /// A server URL edit is waiting out its quiet period
    pub info_reload_pending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum DebounceKey {
    LoadInfo,
    ReloadClustered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FetchTarget {
    Info,
    LineMetrics,
    Clustered(PaneId),
}

enum Message {
    Mount,
    Reload,
    Change(SettingsChange),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Teardown(oneshot::Sender<()>),
    DebounceFired {
        key: DebounceKey,
        generation: u64,
    },
    InfoLoaded {
        seq: u64,
        result: Result<Option<InfoResponse>, LoadError>,
    },
    LineMetricsLoaded {
        seq: u64,
        info: InfoResponse,
        result: Result<Option<Vec<Metrics>>, LoadError>,
    },
    ClusteredLoaded {
        pane: PaneId,
        seq: u64,
        result: Result<Option<Value>, LoadError>,
    },
}

/// Latest issued sequence number per fetch target
#[derive(Debug, Default)]
struct FetchSequences {
    latest: HashMap<FetchTarget, u64>,
}

impl FetchSequences {
    fn issue(&mut self, target: FetchTarget) -> u64 {
        let seq = self.latest.entry(target).or_insert(0);
        *seq += 1;
        *seq
    }

    fn is_latest(&self, target: FetchTarget, seq: u64) -> bool {
        self.latest.get(&target) == Some(&seq)
    }
}

/// Cloneable handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Message>,
}

impl SessionHandle {
    async fn send(&self, message: Message) -> anyhow::Result<()> {
        self.tx
            .send(message)
            .await
            .map_err(|_| anyhow::anyhow!("chart session is closed"))
    }

    /// Initial load: requests `/info` right away if a server URL is configured
    pub async fn mount(&self) -> anyhow::Result<()> {
        self.send(Message::Mount).await
    }

    pub async fn reload(&self) -> anyhow::Result<()> {
        self.send(Message::Reload).await
    }

    pub async fn change(&self, change: SettingsChange) -> anyhow::Result<()> {
        self.send(Message::Change(change)).await
    }

    pub async fn snapshot(&self) -> anyhow::Result<SessionSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Message::Snapshot(reply)).await?;
        Ok(rx.await?)
    }

    /// Disposes every renderer and stops the session
    pub async fn teardown(&self) -> anyhow::Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Message::Teardown(reply)).await?;
        Ok(rx.await?)
    }
}

pub struct FetchOrchestrator {
    settings: ChartSettings,
    store: Arc<dyn SettingsStore>,
    selection: SelectionStateMachine,
    renderers: RendererRegistry,
    loader: Arc<dyn JsonLoader>,
    notifier: Arc<dyn Notifier>,
    debouncer: Debouncer<DebounceKey>,
    sequences: FetchSequences,
    timings: Timings,
    is_fetching: bool,
    tx: mpsc::WeakSender<Message>,
}

impl FetchOrchestrator {
    /// Starts the session task and returns its handle
    pub fn spawn(
        store: Arc<dyn SettingsStore>,
        loader: Arc<dyn JsonLoader>,
        notifier: Arc<dyn Notifier>,
        renderer_factory: Arc<dyn RendererFactory>,
        timings: Timings,
    ) -> SessionHandle {
        let (tx, rx) = mpsc::channel(100);
        let orchestrator = Self {
            settings: store.load(),
            store,
            selection: SelectionStateMachine::new(),
            renderers: RendererRegistry::new(renderer_factory),
            loader,
            notifier,
            debouncer: Debouncer::new(),
            sequences: FetchSequences::default(),
            timings,
            is_fetching: false,
            tx: tx.downgrade(),
        };
        tokio::spawn(orchestrator.run(rx));
        SessionHandle { tx }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Message>) {
        while let Some(message) = rx.recv().await {
            let stop = matches!(message, Message::Teardown(_));
            self.handle(message);
            if stop {
                break;
            }
        }
        tracing::debug!("Chart session stopped");
    }

    fn handle(&mut self, message: Message) {
        match message {
            Message::Mount | Message::Reload => {
                if !self.settings.server_url.is_empty() {
                    self.load_info();
                }
            }
            Message::Change(change) => {
                self.apply_change(change);
                self.store.save(&self.settings);
            }
            Message::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Message::Teardown(reply) => {
                self.teardown();
                let _ = reply.send(());
            }
            Message::DebounceFired { key, generation } => {
                if !self.debouncer.complete(&key, generation) {
                    return;
                }
                match key {
                    DebounceKey::LoadInfo => self.load_info(),
                    DebounceKey::ReloadClustered => self.reload_clustered_if_possible(),
                }
            }
            Message::InfoLoaded { seq, result } => {
                if !self.is_current(FetchTarget::Info, seq) {
                    return;
                }
                self.is_fetching = false;
                match result {
                    Ok(Some(info)) => {
                        let round = self
                            .selection
                            .dispatch(&mut self.settings, SelectionEvent::InfoArrived(info));
                        self.store.save(&self.settings);
                        self.load_round(round);
                    }
                    Ok(None) => tracing::debug!("No info yet"),
                    Err(e) => self.report(e),
                }
            }
            Message::LineMetricsLoaded { seq, info, result } => {
                if !self.is_current(FetchTarget::LineMetrics, seq) {
                    return;
                }
                match result {
                    Ok(Some(metrics)) => {
                        tracing::debug!("Rendering {} runs", metrics.len());
                        let data = LineChartDataManager::new(metrics, &info);
                        self.renderers.render_line_charts(&data, &self.settings);
                    }
                    Ok(None) => {}
                    Err(e) => self.report(e),
                }
            }
            Message::ClusteredLoaded { pane, seq, result } => {
                if !self.is_current(FetchTarget::Clustered(pane), seq) {
                    return;
                }
                match result {
                    Ok(Some(data)) => self.renderers.set_clustered_data(pane, data),
                    Ok(None) => {}
                    Err(e) => self.report(e),
                }
            }
        }
    }

    fn apply_change(&mut self, change: SettingsChange) {
        match change {
            SettingsChange::ServerUrl(url) => {
                if self.settings.server_url == url {
                    return;
                }
                let schedule = !url.is_empty();
                self.settings.server_url = url;
                if schedule {
                    self.schedule(DebounceKey::LoadInfo, self.timings.info_debounce);
                }
            }
            SettingsChange::Product(product) => {
                let round = self.selection.select_product(&mut self.settings, product);
                self.load_round(round);
            }
            SettingsChange::Machine(machine) => {
                let round = self.selection.select_machine(&mut self.settings, machine);
                self.load_round(round);
            }
            SettingsChange::AggregationOperator(operator) => {
                if self.settings.aggregation_operator == operator {
                    return;
                }
                self.settings.aggregation_operator = operator;
                if operator.is_some() {
                    self.reload_clustered_if_possible();
                }
            }
            SettingsChange::Quantile(quantile) => {
                if self.settings.quantile == quantile {
                    return;
                }
                self.settings.quantile = quantile;
                self.schedule(DebounceKey::ReloadClustered, self.timings.quantile_debounce);
            }
            SettingsChange::ShowScrollbarXPreview(show) => {
                if self.settings.show_scrollbar_x_preview == show {
                    return;
                }
                self.settings.show_scrollbar_x_preview = show;
                self.renderers.scrollbar_x_preview_option_changed(show);
            }
        }
    }

    fn schedule(&mut self, key: DebounceKey, delay: Duration) {
        let Some(tx) = self.tx.upgrade() else {
            return;
        };
        self.debouncer.schedule(key, delay, move |generation| async move {
            let _ = tx.send(Message::DebounceFired { key, generation }).await;
        });
    }

    fn is_current(&self, target: FetchTarget, seq: u64) -> bool {
        let current = self.sequences.is_latest(target, seq);
        if !current {
            tracing::warn!("Dropping stale response for {:?} (#{})", target, seq);
        }
        current
    }

    fn load_info(&mut self) {
        let seq = self.sequences.issue(FetchTarget::Info);
        self.is_fetching = true;
        let url = info_url(&self.settings.server_url);
        self.spawn_load::<InfoResponse, _>(url, move |result| Message::InfoLoaded { seq, result });
    }

    fn load_round(&mut self, round: Option<FetchRound>) {
        if let Some(FetchRound { product, machine }) = round {
            self.load_clustered(&product, machine);
            self.load_line_metrics(&product, machine);
        }
    }

    fn reload_clustered_if_possible(&mut self) {
        let (Some(product), Some(machine)) = (self.settings.product(), self.settings.selected_machine)
        else {
            return;
        };
        let product = product.to_string();
        self.load_clustered(&product, machine);
    }

    fn load_clustered(&mut self, product: &str, machine: MachineId) {
        for pane in PaneId::CLUSTERED {
            let seq = self.sequences.issue(FetchTarget::Clustered(pane));
            let url = grouped_metrics_url(
                &self.settings.server_url,
                product,
                machine,
                self.settings.aggregation_operator,
                self.settings.quantile,
                pane.is_instant(),
            );
            self.spawn_load::<Value, _>(url, move |result| Message::ClusteredLoaded { pane, seq, result });
        }
    }

    fn load_line_metrics(&mut self, product: &str, machine: MachineId) {
        let Some(info) = self.selection.info().cloned() else {
            tracing::debug!("Info is not loaded yet, skipping line metrics");
            return;
        };
        let seq = self.sequences.issue(FetchTarget::LineMetrics);
        let url = line_metrics_url(&self.settings.server_url, product, machine);
        self.spawn_load::<Vec<Metrics>, _>(url, move |result| Message::LineMetricsLoaded { seq, info, result });
    }

    fn spawn_load<T, F>(&self, url: String, into_message: F)
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(Result<Option<T>, LoadError>) -> Message + Send + 'static,
    {
        let Some(tx) = self.tx.upgrade() else {
            return;
        };
        tracing::debug!("Loading {}", url);
        let loader = self.loader.clone();
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            let result = load_typed::<T>(loader.as_ref(), &url, notifier.as_ref()).await;
            let _ = tx.send(into_message(result)).await;
        });
    }

    fn report(&self, error: LoadError) {
        tracing::error!("{}", error);
        self.notifier
            .notify(Notification::error("Cannot load data", error.to_string()));
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            settings: self.settings.clone(),
            products: self.selection.products().to_vec(),
            machines: self.selection.machines().to_vec(),
            is_fetching: self.is_fetching,
            info_reload_pending: self.debouncer.is_pending(&DebounceKey::LoadInfo),
        }
    }

    fn teardown(&mut self) {
        tracing::debug!("Tearing down chart session with {} renderers", self.renderers.len());
        self.debouncer.cancel_all();
        self.renderers.dispose_all();
    }
}
