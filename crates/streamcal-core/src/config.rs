//! Application configuration management.
//!
//! This module handles loading and saving the configuration: where the
//! remote store and media providers live, the admin allow-list, the
//! calendar's time zone and the cache freshness windows.
//!
//! Configuration is stored at `~/.config/streamcal/config.json`. Endpoint
//! settings can be overridden from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::{Duration, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Application name used for config directory paths
const APP_NAME: &str = "streamcal";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_STORE_URL: &str = "STREAMCAL_STORE_URL";
pub const ENV_STORE_KEY: &str = "STREAMCAL_STORE_KEY";
pub const ENV_MEDIA_URL: &str = "STREAMCAL_MEDIA_URL";

/// Korea Standard Time; schedule dates are local to the group.
const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// How long each data source may be served from cache, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessPolicy {
    pub members_fresh_secs: i64,
    pub ddays_fresh_secs: i64,
    pub notices_fresh_secs: i64,
    pub clips_fresh_secs: i64,
    pub vods_fresh_secs: i64,
    pub youtube_fresh_secs: i64,
    /// Past this age a YouTube entry is no longer served while revalidating;
    /// callers wait for the network instead.
    pub youtube_stale_secs: i64,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            members_fresh_secs: 5 * 60,
            ddays_fresh_secs: 5 * 60,
            notices_fresh_secs: 5 * 60,
            clips_fresh_secs: 5 * 60,
            vods_fresh_secs: 5 * 60,
            youtube_fresh_secs: 10 * 60,
            youtube_stale_secs: 60 * 60,
        }
    }
}

impl FreshnessPolicy {
    pub fn members_fresh(&self) -> Duration {
        Duration::seconds(self.members_fresh_secs)
    }

    pub fn ddays_fresh(&self) -> Duration {
        Duration::seconds(self.ddays_fresh_secs)
    }

    pub fn notices_fresh(&self) -> Duration {
        Duration::seconds(self.notices_fresh_secs)
    }

    pub fn clips_fresh(&self) -> Duration {
        Duration::seconds(self.clips_fresh_secs)
    }

    pub fn vods_fresh(&self) -> Duration {
        Duration::seconds(self.vods_fresh_secs)
    }

    pub fn youtube_fresh(&self) -> Duration {
        Duration::seconds(self.youtube_fresh_secs)
    }

    pub fn youtube_stale(&self) -> Duration {
        Duration::seconds(self.youtube_stale_secs.max(self.youtube_fresh_secs))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store_url: Option<String>,
    pub store_api_key: Option<String>,
    pub media_url: Option<String>,
    /// Identity-provider user ids allowed into the admin console.
    pub admin_ids: Vec<String>,
    pub utc_offset_hours: i32,
    pub request_timeout_secs: u64,
    pub cache: FreshnessPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_url: None,
            store_api_key: None,
            media_url: None,
            admin_ids: Vec::new(),
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cache: FreshnessPolicy::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply endpoint overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_STORE_URL) {
            self.store_url = Some(url);
        }
        if let Some(key) = non_empty(ENV_STORE_KEY) {
            self.store_api_key = Some(key);
        }
        if let Some(url) = non_empty(ENV_MEDIA_URL) {
            self.media_url = Some(url);
        }
    }

    /// Store URL and API key, or an error naming what is missing.
    pub fn store_endpoint(&self) -> Result<(&str, &str)> {
        let url = self
            .store_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No store URL configured (set {})", ENV_STORE_URL))?;
        let key = self
            .store_api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No store API key configured (set {})", ENV_STORE_KEY))?;
        Ok((url, key))
    }

    pub fn media_endpoint(&self) -> Result<&str> {
        self.media_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No media URL configured (set {})", ENV_MEDIA_URL))
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_ids.iter().any(|id| id == user_id)
    }

    /// The calendar's time zone. Out-of-range offsets fall back to KST.
    pub fn timezone(&self) -> FixedOffset {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .or_else(|| FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * 3600))
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn request_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.timezone().local_minus_utc(), 9 * 3600);
        assert_eq!(config.request_timeout(), StdDuration::from_secs(30));
        assert_eq!(config.cache.youtube_fresh(), Duration::minutes(10));
        assert!(!config.is_admin("anyone"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"store_url": "https://db.example.com", "cache": {"clips_fresh_secs": 60}}"#,
        )
        .unwrap();
        assert_eq!(config.store_url.as_deref(), Some("https://db.example.com"));
        assert_eq!(config.cache.clips_fresh_secs, 60);
        assert_eq!(config.cache.vods_fresh_secs, 300);
        assert_eq!(config.utc_offset_hours, 9);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.store_url = Some("https://old".into());
        config.apply_overrides(|name| match name {
            ENV_STORE_URL => Some("https://new".into()),
            ENV_STORE_KEY => Some("  ".into()),
            _ => None,
        });
        assert_eq!(config.store_url.as_deref(), Some("https://new"));
        assert!(config.store_api_key.is_none());
        assert!(config.store_endpoint().is_err());
    }

    #[test]
    fn test_invalid_offset_falls_back() {
        let config = Config { utc_offset_hours: 99, ..Config::default() };
        assert_eq!(config.timezone().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_stale_window_never_shorter_than_fresh() {
        let policy = FreshnessPolicy {
            youtube_fresh_secs: 600,
            youtube_stale_secs: 60,
            ..FreshnessPolicy::default()
        };
        assert_eq!(policy.youtube_stale(), Duration::seconds(600));
    }

    #[test]
    fn test_admin_allow_list() {
        let config = Config {
            admin_ids: vec!["user_123".into()],
            ..Config::default()
        };
        assert!(config.is_admin("user_123"));
        assert!(!config.is_admin("user_456"));
    }
}
