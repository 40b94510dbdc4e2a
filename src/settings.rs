use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    /// Base URL of the detection backend.
    pub backend_url: String,
    /// Camera the backend should open when a session starts.
    pub camera_index: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:5000".into(),
            camera_index: 0,
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<ClientSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            ClientSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> ClientSettings {
        self.data.read().expect("settings lock poisoned").clone()
    }

    pub fn update(&self, settings: ClientSettings) -> Result<()> {
        {
            let mut guard = self.data.write().expect("settings lock poisoned");
            *guard = settings;
        }
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let data = self.get();
        let contents =
            serde_json::to_string_pretty(&data).context("Failed to serialize settings")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
