use crate::{ExtensionError, ExtensionResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};
use tracing::warn;

/// The two user settings. Keys match the host's sync storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(rename = "geminiApiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(rename = "defaultShortMode", default)]
    pub default_short_mode: bool,
}

impl Settings {
    /// The API key, treating an empty string as unset.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }
}

/// A change applied to the stored settings as one step.
pub type SettingsUpdate = Box<dyn FnOnce(&mut Settings) + Send>;

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> ExtensionResult<Settings>;
    async fn save(&self, settings: Settings) -> ExtensionResult<()>;
    /// Read, modify and write back without letting another writer in
    /// between.
    async fn update(&self, apply: SettingsUpdate) -> ExtensionResult<()>;

    async fn api_key(&self) -> ExtensionResult<Option<String>> {
        Ok(self.load().await?.api_key().map(str::to_string))
    }

    async fn set_api_key(&self, api_key: String) -> ExtensionResult<()> {
        self.update(Box::new(move |settings: &mut Settings| {
            settings.api_key = Some(api_key);
        }))
        .await
    }

    async fn default_short_mode(&self) -> ExtensionResult<bool> {
        Ok(self.load().await?.default_short_mode)
    }

    async fn set_default_short_mode(&self, enabled: bool) -> ExtensionResult<()> {
        self.update(Box::new(move |settings: &mut Settings| {
            settings.default_short_mode = enabled;
        }))
        .await
    }
}

#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    data: RwLock<Settings>,
}

impl MemorySettingsStore {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            data: RwLock::new(settings),
        }
    }

    #[must_use]
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::new(Settings {
            api_key: Some(api_key.into()),
            ..Settings::default()
        })
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> ExtensionResult<Settings> {
        Ok(self.data.read().expect("settings poisoned").clone())
    }

    async fn save(&self, settings: Settings) -> ExtensionResult<()> {
        *self.data.write().expect("settings poisoned") = settings;
        Ok(())
    }

    async fn update(&self, apply: SettingsUpdate) -> ExtensionResult<()> {
        let mut guard = self.data.write().expect("settings poisoned");
        apply(&mut *guard);
        Ok(())
    }
}

/// Settings persisted as a JSON file. A missing or unreadable file loads as
/// defaults.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl FileSettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> ExtensionResult<Self> {
        let path = path.into();
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents).unwrap_or_else(|error| {
                warn!(path = %path.display(), %error, "ignoring unreadable settings file");
                Settings::default()
            })
        } else {
            Settings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn persist(&self, data: &Settings) -> ExtensionResult<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized).map_err(ExtensionError::from)
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> ExtensionResult<Settings> {
        Ok(self.data.read().expect("settings poisoned").clone())
    }

    async fn save(&self, settings: Settings) -> ExtensionResult<()> {
        let mut guard = self.data.write().expect("settings poisoned");
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    async fn update(&self, apply: SettingsUpdate) -> ExtensionResult<()> {
        let mut guard = self.data.write().expect("settings poisoned");
        let mut settings = guard.clone();
        apply(&mut settings);
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }
}
