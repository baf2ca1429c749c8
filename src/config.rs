//! `NavigatorConfig`: env > file > defaults layering, mirroring the
//! precedence `aspy::config` documents for its own `Config::from_env`.

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::NavigatorError;

/// Application configuration for the demo binary (and any embedder that
/// wants file/env-driven defaults instead of constructing
/// `NavigatorCoreOptions` by hand).
#[derive(Debug, Clone, PartialEq)]
pub struct NavigatorConfig {
    pub debug_mode: bool,
    pub auto_start: bool,
    pub history_max_size: usize,
    pub critical_priority_threshold: i32,

    /// `CognitiveModel` analysis cadence, milliseconds.
    pub cognitive_interval_ms: u64,
    /// Consecutive votes required before a cognitive state transition fires.
    pub cognitive_vote_threshold: u32,

    /// `IntentPredictor` minimum sample cadence, milliseconds.
    pub intent_sample_interval_ms: u64,
    /// Trajectory buffer capacity (samples).
    pub intent_buffer_size: usize,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            debug_mode: false,
            auto_start: false,
            history_max_size: 500,
            critical_priority_threshold: crate::plugin::DEFAULT_CRITICAL_PRIORITY_THRESHOLD,
            cognitive_interval_ms: 500,
            cognitive_vote_threshold: 3,
            intent_sample_interval_ms: 50,
            intent_buffer_size: 20,
        }
    }
}

/// Config file structure (subset of `NavigatorConfig` worth persisting).
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    debug_mode: Option<bool>,
    auto_start: Option<bool>,
    history_max_size: Option<usize>,
    critical_priority_threshold: Option<i32>,
    cognitive_interval_ms: Option<u64>,
    cognitive_vote_threshold: Option<u32>,
    intent_sample_interval_ms: Option<u64>,
    intent_buffer_size: Option<usize>,
}

impl NavigatorConfig {
    /// `~/.config/navigator/config.toml`
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("navigator").join("config.toml"))
    }

    fn load_file_config(path: Option<&PathBuf>) -> FileConfig {
        let Some(path) = path else {
            return FileConfig::default();
        };
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "failed to parse config file, using defaults");
                FileConfig::default()
            }),
            Err(_) => FileConfig::default(),
        }
    }

    /// Load configuration: env vars > config file > built-in defaults.
    pub fn from_env() -> Self {
        Self::load(Self::config_path().as_ref())
    }

    /// Like `from_env`, but reads the config file from an explicit path
    /// (e.g. `navigator-demo --config`) instead of the default location.
    pub fn load_from(path: Option<&PathBuf>) -> Self {
        Self::load(path)
    }

    fn load(path: Option<&PathBuf>) -> Self {
        let file = Self::load_file_config(path);
        let defaults = Self::default();

        let debug_mode = env_bool("NAVIGATOR_DEBUG")
            .or(file.debug_mode)
            .unwrap_or(defaults.debug_mode);

        let auto_start = env_bool("NAVIGATOR_AUTO_START")
            .or(file.auto_start)
            .unwrap_or(defaults.auto_start);

        let history_max_size = env_parse("NAVIGATOR_HISTORY_MAX_SIZE")
            .or(file.history_max_size)
            .unwrap_or(defaults.history_max_size);

        let critical_priority_threshold = env_parse("NAVIGATOR_CRITICAL_PRIORITY_THRESHOLD")
            .or(file.critical_priority_threshold)
            .unwrap_or(defaults.critical_priority_threshold);

        let cognitive_interval_ms = env_parse("NAVIGATOR_COGNITIVE_INTERVAL_MS")
            .or(file.cognitive_interval_ms)
            .unwrap_or(defaults.cognitive_interval_ms);

        let cognitive_vote_threshold = env_parse("NAVIGATOR_COGNITIVE_VOTE_THRESHOLD")
            .or(file.cognitive_vote_threshold)
            .unwrap_or(defaults.cognitive_vote_threshold);

        let intent_sample_interval_ms = env_parse("NAVIGATOR_INTENT_SAMPLE_INTERVAL_MS")
            .or(file.intent_sample_interval_ms)
            .unwrap_or(defaults.intent_sample_interval_ms);

        let intent_buffer_size = env_parse("NAVIGATOR_INTENT_BUFFER_SIZE")
            .or(file.intent_buffer_size)
            .unwrap_or(defaults.intent_buffer_size);

        Self {
            debug_mode,
            auto_start,
            history_max_size,
            critical_priority_threshold,
            cognitive_interval_ms,
            cognitive_vote_threshold,
            intent_sample_interval_ms,
            intent_buffer_size,
        }
    }

    pub fn to_toml(&self) -> String {
        format!(
            r#"# navigator configuration

debug_mode = {debug_mode}
auto_start = {auto_start}
history_max_size = {history_max_size}
critical_priority_threshold = {critical_priority_threshold}
cognitive_interval_ms = {cognitive_interval_ms}
cognitive_vote_threshold = {cognitive_vote_threshold}
intent_sample_interval_ms = {intent_sample_interval_ms}
intent_buffer_size = {intent_buffer_size}
"#,
            debug_mode = self.debug_mode,
            auto_start = self.auto_start,
            history_max_size = self.history_max_size,
            critical_priority_threshold = self.critical_priority_threshold,
            cognitive_interval_ms = self.cognitive_interval_ms,
            cognitive_vote_threshold = self.cognitive_vote_threshold,
            intent_sample_interval_ms = self.intent_sample_interval_ms,
            intent_buffer_size = self.intent_buffer_size,
        )
    }

    pub fn save(&self) -> Result<(), NavigatorError> {
        let path = Self::config_path()
            .ok_or_else(|| NavigatorError::Config("could not determine config path".into()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| NavigatorError::Config(e.to_string()))?;
        }
        std::fs::write(&path, self.to_toml()).map_err(|e| NavigatorError::Config(e.to_string()))
    }
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests;
