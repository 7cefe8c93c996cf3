// Persisted chart settings
use crate::domain::settings::ChartSettings;
use std::sync::Mutex;

pub trait SettingsStore: Send + Sync {
    fn load(&self) -> ChartSettings;

    fn save(&self, settings: &ChartSettings);
}

/// Keeps settings for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<ChartSettings>,
}

impl MemorySettingsStore {
    pub fn new(settings: ChartSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> ChartSettings {
        match self.settings.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn save(&self, settings: &ChartSettings) {
        match self.settings.lock() {
            Ok(mut guard) => *guard = settings.clone(),
            Err(poisoned) => *poisoned.into_inner() = settings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let store = MemorySettingsStore::default();
        let mut settings = store.load();
        assert_eq!(settings, ChartSettings::default());

        settings.selected_machine = Some(7);
        store.save(&settings);
        assert_eq!(store.load().selected_machine, Some(7));
    }
}
