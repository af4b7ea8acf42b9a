//! Application-level configuration loading: penalty values and change-feed sizing.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::models::PenaltyDuration;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "HOCKEY_STATS_CONFIG_PATH";
const DEFAULT_MINOR_MINUTES: i32 = 2;
const DEFAULT_MAJOR_MINUTES: i32 = 5;
const DEFAULT_CHANGE_FEED_CAPACITY: usize = 64;

/// Value written to the `penalties` stat for each penalty duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenaltyMinutes {
    pub minor: i32,
    pub major: i32,
}

impl PenaltyMinutes {
    /// Minutes recorded for a penalty of the given duration.
    pub fn for_duration(&self, duration: PenaltyDuration) -> i32 {
        match duration {
            PenaltyDuration::Minor => self.minor,
            PenaltyDuration::Major => self.major,
        }
    }
}

impl Default for PenaltyMinutes {
    fn default() -> Self {
        Self {
            minor: DEFAULT_MINOR_MINUTES,
            major: DEFAULT_MAJOR_MINUTES,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub penalties: PenaltyMinutes,
    pub change_feed_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        minor = app_config.penalties.minor,
                        major = app_config.penalties.major,
                        capacity = app_config.change_feed_capacity,
                        "loaded application config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            penalties: PenaltyMinutes::default(),
            change_feed_capacity: DEFAULT_CHANGE_FEED_CAPACITY,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    penalties: RawPenalties,
    change_feed_capacity: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPenalties {
    minor: Option<i32>,
    major: Option<i32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = PenaltyMinutes::default();
        let capacity = match value.change_feed_capacity {
            Some(0) => {
                warn!("change_feed_capacity must be positive; using default");
                DEFAULT_CHANGE_FEED_CAPACITY
            }
            Some(capacity) => capacity,
            None => DEFAULT_CHANGE_FEED_CAPACITY,
        };

        Self {
            penalties: PenaltyMinutes {
                minor: value.penalties.minor.unwrap_or(defaults.minor),
                major: value.penalties.major.unwrap_or(defaults.major),
            },
            change_feed_capacity: capacity,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let raw: RawConfig = serde_json::from_str(r#"{"penalties": {"major": 10}}"#).unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.penalties.minor, 2);
        assert_eq!(config.penalties.major, 10);
        assert_eq!(config.change_feed_capacity, DEFAULT_CHANGE_FEED_CAPACITY);
    }

    #[test]
    fn zero_capacity_falls_back_to_default() {
        let raw: RawConfig = serde_json::from_str(r#"{"change_feed_capacity": 0}"#).unwrap();
        assert_eq!(
            AppConfig::from(raw).change_feed_capacity,
            DEFAULT_CHANGE_FEED_CAPACITY
        );
    }

    #[test]
    fn penalty_minutes_follow_duration() {
        let penalties = PenaltyMinutes::default();
        assert_eq!(penalties.for_duration(PenaltyDuration::Minor), 2);
        assert_eq!(penalties.for_duration(PenaltyDuration::Major), 5);
    }
}
