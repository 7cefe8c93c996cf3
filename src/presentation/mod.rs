// Presentation layer - terminal renderers, notifications and console commands
pub mod console;
pub mod notifier;
pub mod text_renderer;
