use anyhow::{Context, Result};
use std::{
    fs,
    path::PathBuf,
    sync::{Arc, RwLock},
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerSettings {
    pub base_url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserSettings {
    server: ServerSettings,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
        }
    }
}

struct SettingsInner {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

/// Cloneable handle to the persisted settings file; the API client
/// reads the server address through it on every request.
#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<SettingsInner>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            inner: Arc::new(SettingsInner {
                path,
                data: RwLock::new(data),
            }),
        })
    }

    pub fn server(&self) -> ServerSettings {
        self.inner.data.read().unwrap().server.clone()
    }

    pub fn update_server(&self, settings: ServerSettings) -> Result<()> {
        let mut guard = self.inner.data.write().unwrap();
        guard.server = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.inner.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.inner.path.display()))
    }
}
