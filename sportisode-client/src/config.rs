use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "sportisode.toml";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:8000/ws";

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: String,
    pub ws_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feed {
    pub page_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Replies {
    pub page_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Views {
    pub cooldown_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: Api,
    pub feed: Feed,
    pub replies: Replies,
    pub views: Views,
}

impl Settings {
    /// Load settings from `sportisode.toml` (if present) and the
    /// `SPORTISODE_API_URL` / `SPORTISODE_WS_URL` environment variables.
    pub fn new() -> Result<Self, ConfigError> {
        let path = PathBuf::from(CONFIG_FILE);
        let file = if path.exists() { Some(path.as_path()) } else { None };
        Self::build(file, &env_overrides())
    }

    /// Layer defaults, an optional TOML file, then explicit overrides
    /// (highest priority).
    pub fn build(config_file: Option<&Path>, overrides: &[(&str, String)]) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("api.base_url", DEFAULT_API_URL)?
            .set_default("api.ws_url", DEFAULT_WS_URL)?
            .set_default("api.timeout_secs", 30)?
            .set_default("feed.page_size", 10)?
            .set_default("replies.page_size", 5)?
            .set_default("views.cooldown_secs", 300)?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        for (key, value) in overrides {
            builder = builder.set_override(*key, value.as_str())?;
        }

        builder.build()?.try_deserialize()
    }

    /// Apply a `--api-url` flag. Wins over every other source.
    pub fn with_api_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.api.base_url = url;
        }
        self
    }

    pub fn view_cooldown(&self) -> Duration {
        Duration::from_secs(self.views.cooldown_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: Api {
                base_url: DEFAULT_API_URL.to_string(),
                ws_url: DEFAULT_WS_URL.to_string(),
                timeout_secs: 30,
            },
            feed: Feed { page_size: 10 },
            replies: Replies { page_size: 5 },
            views: Views { cooldown_secs: 300 },
        }
    }
}

fn env_overrides() -> Vec<(&'static str, String)> {
    let mut overrides = Vec::new();
    if let Ok(url) = std::env::var("SPORTISODE_API_URL") {
        overrides.push(("api.base_url", url));
    }
    if let Ok(url) = std::env::var("SPORTISODE_WS_URL") {
        overrides.push(("api.ws_url", url));
    }
    overrides
}
