// Notification channel for the terminal: notifications go to the log and to stderr
use crate::application::json_loader::{Notification, Notifier};

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        tracing::error!(title = %notification.title, "{}", notification.text);
        eprintln!("❌ {}: {}", notification.title, notification.text);
    }
}
