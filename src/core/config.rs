use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum number of player slots a session may open.
pub const MAX_SLOTS: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ordered bootstrap list of video identifiers, one slot each.
    pub video_ids: Vec<String>,
    /// Search collaborator endpoint, handed to whatever SearchProvider the
    /// embedder wires up. The core never talks HTTP itself.
    pub search_endpoint: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            video_ids: vec!["jfKfPfyJRdk".to_string(), "dQw4w9WgXcQ".to_string()],
            search_endpoint: "/search".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).map_err(|e| {
                anyhow::anyhow!("Failed to read config file at {}: {}", config_path.display(), e)
            })?;

            // Try to parse the config, but if it fails, create a new one
            match serde_json::from_str::<Self>(&content) {
                Ok(config) => {
                    log::info!("Loaded existing config from {}", config_path.display());
                    Ok(config.clamped())
                }
                Err(e) => {
                    log::warn!("Config file exists but has issues ({}), creating new one with defaults", e);
                    let new_config = Self::default();
                    new_config
                        .save()
                        .map_err(|save_err| anyhow::anyhow!("Failed to save new config: {}", save_err))?;
                    log::info!("Created new config file at {}", config_path.display());
                    Ok(new_config)
                }
            }
        } else {
            log::info!("No config file found, creating default config");
            let config = Self::default();
            config
                .save()
                .map_err(|e| anyhow::anyhow!("Failed to save default config: {}", e))?;
            log::info!("Created new config file at {}", config_path.display());
            Ok(config)
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("loopwall")
            .join("config.json")
    }

    /// Keep the bootstrap list within the 1..=MAX_SLOTS window a session
    /// supports. An empty list falls back to the defaults.
    pub fn clamped(mut self) -> Self {
        if self.video_ids.is_empty() {
            log::warn!("Config has no video ids, falling back to defaults");
            self.video_ids = Self::default().video_ids;
        }
        if self.video_ids.len() > MAX_SLOTS {
            log::warn!(
                "Config lists {} videos, truncating to {}",
                self.video_ids.len(),
                MAX_SLOTS
            );
            self.video_ids.truncate(MAX_SLOTS);
        }
        self
    }
}
