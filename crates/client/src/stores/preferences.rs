//! Notification preferences, kept on this device only.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, instrument};

use crate::storage::{self, Storage, keys};

/// Notification toggles.
///
/// Unknown keys written by other versions are kept in `extra` and written
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub likes: bool,
    pub promos: bool,
    pub reminders: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, bool>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            likes: false,
            promos: true,
            reminders: false,
            extra: BTreeMap::new(),
        }
    }
}

impl NotificationSettings {
    /// Value of a toggle by key, `None` when unknown.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<bool> {
        match key {
            "likes" => Some(self.likes),
            "promos" => Some(self.promos),
            "reminders" => Some(self.reminders),
            other => self.extra.get(other).copied(),
        }
    }

    fn set(&mut self, key: &str, value: bool) {
        match key {
            "likes" => self.likes = value,
            "promos" => self.promos = value,
            "reminders" => self.reminders = value,
            other => {
                self.extra.insert(other.to_string(), value);
            }
        }
    }
}

/// Owns the notification preferences.
#[derive(Clone)]
pub struct PreferencesStore {
    inner: Arc<PreferencesInner>,
}

struct PreferencesInner {
    storage: Arc<dyn Storage>,
    state: watch::Sender<NotificationSettings>,
}

impl PreferencesStore {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            inner: Arc::new(PreferencesInner {
                storage,
                state: watch::Sender::new(NotificationSettings::default()),
            }),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NotificationSettings> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn settings(&self) -> NotificationSettings {
        self.inner.state.borrow().clone()
    }

    /// Load the persisted settings; missing or corrupt settings give the
    /// defaults.
    pub fn load(&self) {
        let settings: NotificationSettings =
            storage::load_json(self.inner.storage.as_ref(), keys::NOTIFICATIONS)
                .unwrap_or_default();
        self.inner.state.send_replace(settings);
    }

    /// Change one toggle. The new value is published immediately and
    /// persisted best-effort.
    #[instrument(skip(self))]
    pub fn set(&self, key: &str, value: bool) {
        let mut snapshot = None;
        self.inner.state.send_modify(|settings| {
            settings.set(key, value);
            snapshot = Some(settings.clone());
        });
        if let Some(settings) = snapshot {
            let saved = storage::save_json(self.inner.storage.as_ref(), keys::NOTIFICATIONS, &settings);
            debug!(saved, "Notification setting changed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::testing::FailingStorage;

    #[test]
    fn test_defaults() {
        let prefs = PreferencesStore::new(Arc::new(MemoryStorage::new()));
        prefs.load();
        let settings = prefs.settings();
        assert!(!settings.likes);
        assert!(settings.promos);
        assert!(!settings.reminders);
    }

    #[test]
    fn test_set_persists_and_keeps_unknown_keys() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(keys::NOTIFICATIONS, r#"{"likes":true,"weekly":true}"#)
            .unwrap();

        let prefs = PreferencesStore::new(storage.clone());
        prefs.load();
        assert!(prefs.settings().likes);
        assert!(prefs.settings().promos);
        assert_eq!(prefs.settings().get("weekly"), Some(true));

        prefs.set("promos", false);
        prefs.set("digest", true);

        let reloaded = PreferencesStore::new(storage);
        reloaded.load();
        let settings = reloaded.settings();
        assert!(!settings.promos);
        assert_eq!(settings.get("weekly"), Some(true));
        assert_eq!(settings.get("digest"), Some(true));
        assert_eq!(settings.get("missing"), None);
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_defaults() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::NOTIFICATIONS, "not json").unwrap();
        let prefs = PreferencesStore::new(storage);
        prefs.load();
        assert_eq!(prefs.settings(), NotificationSettings::default());
    }

    #[test]
    fn test_set_survives_storage_failure() {
        let prefs = PreferencesStore::new(Arc::new(FailingStorage));
        prefs.load();
        prefs.set("reminders", true);
        assert!(prefs.settings().reminders);
    }
}
