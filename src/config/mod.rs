use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::*;
use crate::tabs::TabSpec;

/// Why a candidate config file was passed over.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{} defines no usable [[tab]] entries", .path.display())]
    NoTabs { path: PathBuf },
}

/// Application configuration with sensible defaults.
///
/// Can be overridden via `$PERFMON_CONFIG`, `~/.config/perfmon/config.toml`
/// or `./perfmon.toml`, first usable file wins.
#[derive(Debug, Clone)]
pub struct Config {
    /// Metrics interval, and the refresh of tabs without their own.
    pub global_refresh: Duration,
    /// Theme name (built-in or custom).
    pub theme: String,
    /// Configured tabs; empty means the built-in defaults.
    pub tabs: Vec<TabSpec>,
    /// File the tabs came from.
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            global_refresh: Duration::from_millis(DEFAULT_REFRESH_MS),
            theme: "ocean".to_string(),
            tabs: Vec::new(),
            source: None,
        }
    }
}

/// TOML-deserializable config file format.
/// All fields are optional; missing fields use defaults.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileConfig {
    global_refresh_interval: Option<String>,
    theme: Option<String>,
    tab: Option<Vec<FileTab>>,
}

/// One `[[tab]]` table.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileTab {
    title: Option<String>,
    cmd: Option<Vec<String>>,
    refresh_interval: Option<String>,
}

/// Parse `500ms`, `5s`, `1.5m`, `1h`, or a sequence such as `1m30s`.
/// Zero, negative, or suffix-less values are rejected.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let mut rest = text.trim();
    if rest.is_empty() {
        return None;
    }
    let mut total_ms = 0.0;
    while !rest.is_empty() {
        let split = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(split);
        let value: f64 = number.parse().ok()?;
        let (unit_ms, tail) = if let Some(t) = tail.strip_prefix("ms") {
            (1.0, t)
        } else if let Some(t) = tail.strip_prefix('s') {
            (1_000.0, t)
        } else if let Some(t) = tail.strip_prefix('m') {
            (60_000.0, t)
        } else if let Some(t) = tail.strip_prefix('h') {
            (3_600_000.0, t)
        } else {
            return None;
        };
        total_ms += value * unit_ms;
        rest = tail;
    }
    if !total_ms.is_finite() || total_ms <= 0.0 {
        return None;
    }
    Some(Duration::from_millis(total_ms.round() as u64))
}

/// Raise an interval to the refresh floor.
pub fn clamp_refresh(interval: Duration) -> Duration {
    interval.max(Duration::from_millis(MIN_REFRESH_MS))
}

fn parse_interval(text: Option<&str>, what: &str) -> Option<Duration> {
    let text = text?;
    let parsed = parse_duration(text).map(clamp_refresh);
    if parsed.is_none() {
        warn!(value = text, field = what, "invalid duration, using default");
    }
    parsed
}

impl Config {
    /// Candidate config files, in search order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(env) = std::env::var(ENV_CONFIG) {
            let env = env.trim();
            if !env.is_empty() {
                paths.push(PathBuf::from(env));
            }
        }
        paths.push(config_file_path());
        paths.push(local_config_path());
        paths
    }

    /// Load the first usable file on the search path, then apply the
    /// `PERFMON_THEME` override. Never fails; falls back to defaults.
    pub fn load() -> Self {
        let mut config = Self::load_from(&Self::search_paths());
        if let Ok(theme) = std::env::var(ENV_THEME) {
            config.apply_theme_override(&theme);
        }
        config
    }

    /// Load the first usable file among `paths`.
    pub fn load_from(paths: &[PathBuf]) -> Self {
        for path in paths {
            match Self::load_file(path) {
                Ok(config) => {
                    info!(path = %path.display(), tabs = config.tabs.len(), "loaded config");
                    return config;
                }
                Err(ConfigError::Read { ref source, .. })
                    if source.kind() == std::io::ErrorKind::NotFound =>
                {
                    debug!(path = %path.display(), "no config file");
                }
                Err(e) => warn!(error = %e, "skipping config file"),
            }
        }
        info!("no usable config file, using built-in tabs");
        Self::default()
    }

    /// Read and parse one file. A file without a well-formed tab is an error.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file_config: FileConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_file_config(file_config, path)
    }

    fn from_file_config(file_config: FileConfig, path: &Path) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Merge file values over defaults
        if let Some(v) =
            parse_interval(file_config.global_refresh_interval.as_deref(), "global_refresh_interval")
        {
            config.global_refresh = v;
        }
        if let Some(v) = file_config.theme {
            if !v.trim().is_empty() {
                config.theme = v.trim().to_string();
            }
        }

        for tab in file_config.tab.unwrap_or_default() {
            let title = tab.title.unwrap_or_default();
            let argv = tab.cmd.unwrap_or_default();
            if title.trim().is_empty() || argv.is_empty() {
                warn!(path = %path.display(), title = %title, "dropping tab without title or cmd");
                continue;
            }
            config.tabs.push(TabSpec {
                title,
                argv,
                refresh: parse_interval(tab.refresh_interval.as_deref(), "refresh_interval"),
            });
        }

        if config.tabs.is_empty() {
            return Err(ConfigError::NoTabs {
                path: path.to_path_buf(),
            });
        }
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Replace the theme name unless `theme` is blank.
    pub fn apply_theme_override(&mut self, theme: &str) {
        let theme = theme.trim();
        if !theme.is_empty() {
            self.theme = theme.to_string();
        }
    }
}
