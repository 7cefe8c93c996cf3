// Application layer - selection, fetch orchestration and the capabilities it consumes
pub mod chart_renderer;
pub mod debounce;
pub mod fetch_orchestrator;
pub mod json_loader;
pub mod selection;
pub mod settings_store;
