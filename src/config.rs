//! Editor configuration file
//!
//! JSON under the user's config dir. Every field has a default so a partial
//! file (or an older one) still loads; a missing file is written out with
//! defaults for the user to edit.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::constants::{config, http, pages, timing};
use crate::editor::SessionTimings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Base URL of the editor server
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Character shown on pages 0 and 1
    #[serde(default = "default_anchor_character")]
    pub anchor_character: String,

    #[serde(default = "default_render_throttle_ms")]
    pub render_throttle_ms: u64,
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,
    #[serde(default = "default_saved_flash_ms")]
    pub saved_flash_ms: u64,

    /// HTTP timeout per request (0 = none)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_server_url() -> String {
    http::DEFAULT_SERVER_URL.to_string()
}

fn default_anchor_character() -> String {
    pages::DEFAULT_ANCHOR.to_string()
}

fn default_render_throttle_ms() -> u64 {
    timing::RENDER_THROTTLE_MS
}

fn default_autosave_delay_ms() -> u64 {
    timing::AUTOSAVE_DELAY_MS
}

fn default_saved_flash_ms() -> u64 {
    timing::SAVED_FLASH_MS
}

fn default_request_timeout_secs() -> u64 {
    http::DEFAULT_TIMEOUT_SECS
}

fn default_window_width() -> u32 {
    config::DEFAULT_WINDOW_WIDTH
}

fn default_window_height() -> u32 {
    config::DEFAULT_WINDOW_HEIGHT
}

fn default_log_level() -> String {
    config::DEFAULT_LOG_LEVEL.to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            anchor_character: default_anchor_character(),
            render_throttle_ms: default_render_throttle_ms(),
            autosave_delay_ms: default_autosave_delay_ms(),
            saved_flash_ms: default_saved_flash_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            log_level: default_log_level(),
        }
    }
}

impl EditorConfig {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Load from `path`, writing defaults there first if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, creating default");
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let mut config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON from {:?}", path))?;
        config.validate();

        info!(path = %path.display(), server = %config.server_url, "Loaded config");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let mut json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        json.push('\n');
        fs::write(path, json).with_context(|| format!("Failed to write config to {:?}", path))?;

        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Apply command-line overrides; these never reach the file
    pub fn apply_overrides(&mut self, server_url: Option<String>, anchor: Option<String>) {
        if let Some(url) = server_url {
            self.server_url = url;
        }
        if let Some(anchor) = anchor {
            self.anchor_character = anchor;
        }
    }

    pub fn timings(&self) -> SessionTimings {
        SessionTimings {
            render_throttle: Duration::from_millis(self.render_throttle_ms),
            autosave_delay: Duration::from_millis(self.autosave_delay_ms),
            saved_flash: Duration::from_millis(self.saved_flash_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&mut self) {
        if self.anchor_character.trim().is_empty() {
            warn!(using = pages::DEFAULT_ANCHOR, "anchor_character is empty, using default");
            self.anchor_character = default_anchor_character();
        }
        if self.render_throttle_ms == 0 {
            warn!(using = timing::RENDER_THROTTLE_MS, "render_throttle_ms is 0, using default");
            self.render_throttle_ms = default_render_throttle_ms();
        }
        if self.window_width == 0 || self.window_height == 0 {
            warn!(width = self.window_width, height = self.window_height, "Window size is empty, using defaults");
            self.window_width = default_window_width();
            self.window_height = default_window_height();
        }
    }
}
