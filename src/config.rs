use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

const APP_DIR: &str = "newsguard";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_minutes: u32,

    #[serde(default = "default_items_per_feed")]
    pub items_per_feed: usize,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_analyses: usize,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedSource>,
}

/// Connection settings for the LLM gateway service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub enabled: bool,

    pub gateway_url: Option<String>,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    data_dir.join("analyses.db").to_string_lossy().to_string()
}

fn default_fetch_timeout() -> u64 {
    20
}

fn default_refresh_interval() -> u32 {
    30
}

fn default_items_per_feed() -> usize {
    3
}

fn default_max_concurrent() -> usize {
    4
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_feeds() -> Vec<FeedSource> {
    [
        ("tagesschau", "https://www.tagesschau.de/xml/rss2/"),
        ("spiegel", "https://www.spiegel.de/schlagzeilen/index.rss"),
        ("zeit", "https://newsfeed.zeit.de/index"),
    ]
    .into_iter()
    .map(|(name, url)| FeedSource {
        name: name.to_string(),
        url: url.to_string(),
    })
    .collect()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            gateway_url: None,
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            fetch_timeout_secs: default_fetch_timeout(),
            refresh_interval_minutes: default_refresh_interval(),
            items_per_feed: default_items_per_feed(),
            max_concurrent_analyses: default_max_concurrent(),
            llm: LlmConfig::default(),
            feeds: default_feeds(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            let config = Config::default();
            config.save()?;
            config
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Environment wins over the file: `LLM_ENABLED`, `LLM_GATEWAY_URL`,
    /// `NEWSGUARD_DB_PATH`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(enabled) = lookup("LLM_ENABLED") {
            self.llm.enabled = enabled.trim().eq_ignore_ascii_case("true");
        }
        if let Some(url) = lookup("LLM_GATEWAY_URL") {
            let url = url.trim().trim_end_matches('/').to_string();
            self.llm.gateway_url = (!url.is_empty()).then_some(url);
        }
        if let Some(path) = lookup("NEWSGUARD_DB_PATH") {
            if !path.trim().is_empty() {
                self.db_path = path;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            db_path = "/tmp/x.db"

            [llm]
            enabled = true
            gateway_url = "http://127.0.0.1:8001"
            "#,
        )
        .unwrap();

        assert_eq!(config.db_path, "/tmp/x.db");
        assert_eq!(config.fetch_timeout_secs, 20);
        assert_eq!(config.items_per_feed, 3);
        assert!(config.llm.enabled);
        assert_eq!(config.llm.timeout_secs, 60);
        assert!(!config.feeds.is_empty());
    }

    #[test]
    fn env_overrides_llm_settings() {
        let env: HashMap<&str, &str> = [
            ("LLM_ENABLED", "TRUE"),
            ("LLM_GATEWAY_URL", "http://gateway:8001/"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert!(config.llm.enabled);
        assert_eq!(config.llm.gateway_url.as_deref(), Some("http://gateway:8001"));
    }

    #[test]
    fn blank_gateway_url_unsets_it() {
        let mut config = Config::default();
        config.llm.gateway_url = Some("http://old".to_string());
        config.apply_env_overrides(|key| (key == "LLM_GATEWAY_URL").then(|| "  ".to_string()));
        assert!(config.llm.gateway_url.is_none());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.feeds, config.feeds);
        assert_eq!(back.refresh_interval_minutes, 30);
    }

    #[test]
    fn default_db_path_lives_in_app_data_dir() {
        let path = PathBuf::from(default_db_path());
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("analyses.db"));
        assert_eq!(
            path.parent().and_then(|p| p.file_name()).and_then(|n| n.to_str()),
            Some(APP_DIR)
        );
    }
}
