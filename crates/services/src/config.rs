use std::env;
use std::time::Duration;

use backend::HttpBackendConfig;

use crate::count_estimator::DEFAULT_TICK;
use crate::error::ConfigError;

pub const BASE_URL_VAR: &str = "QUIZ_API_BASE_URL";
pub const TIMEOUT_VAR: &str = "QUIZ_API_TIMEOUT_SECS";
pub const TICK_VAR: &str = "QUIZ_COUNT_TICK_MS";
pub const HYDRATE_VAR: &str = "QUIZ_HYDRATE_BOOKMARKS";

/// Runtime settings for the quiz services.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api: HttpBackendConfig,
    pub count_tick: Duration,
    pub hydrate_bookmarks: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: HttpBackendConfig::default(),
            count_tick: DEFAULT_TICK,
            hydrate_bookmarks: true,
        }
    }
}

impl AppConfig {
    /// Read settings from `QUIZ_*` environment variables, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base_url) = var(BASE_URL_VAR) {
            config.api.base_url = base_url.trim().to_string();
        }
        if let Some(raw) = var(TIMEOUT_VAR) {
            let secs = parse_positive(TIMEOUT_VAR, &raw)?;
            config.api.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = var(TICK_VAR) {
            let millis = parse_positive(TICK_VAR, &raw)?;
            config.count_tick = Duration::from_millis(millis);
        }
        if let Some(raw) = var(HYDRATE_VAR) {
            config.hydrate_bookmarks = parse_flag(HYDRATE_VAR, &raw)?;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api.base_url = base_url.into();
        self
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        }),
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout, Duration::from_secs(30));
        assert_eq!(config.count_tick, Duration::from_millis(30));
        assert!(config.hydrate_bookmarks);
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (BASE_URL_VAR, " http://quiz.test:9000 "),
            (TIMEOUT_VAR, "5"),
            (TICK_VAR, "10"),
            (HYDRATE_VAR, "off"),
        ]))
        .unwrap();
        assert_eq!(config.api.base_url, "http://quiz.test:9000");
        assert_eq!(config.api.timeout, Duration::from_secs(5));
        assert_eq!(config.count_tick, Duration::from_millis(10));
        assert!(!config.hydrate_bookmarks);
    }

    #[test]
    fn blank_values_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[(TIMEOUT_VAR, "  ")])).unwrap();
        assert_eq!(config.api.timeout, Duration::from_secs(30));
    }

    #[test]
    fn rejects_bad_numbers_and_flags() {
        let err = AppConfig::from_lookup(lookup(&[(TICK_VAR, "0")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: TICK_VAR,
                value: "0".into()
            }
        );
        assert!(AppConfig::from_lookup(lookup(&[(HYDRATE_VAR, "maybe")])).is_err());
    }
}
