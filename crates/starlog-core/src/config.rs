//! Engine configuration loading.
//!
//! The canonical configuration lives in `starlog.yaml` next to the
//! binary's working directory. All fields have defaults, so an absent
//! file (or an empty one) yields a fully working configuration. The
//! journal directory can be overridden with the `STARLOG_JOURNAL_DIR`
//! environment variable so deployments can point the engine at the
//! game's save directory without editing the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Journal ingestion settings.
    #[serde(default)]
    pub journal: JournalConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `STARLOG_JOURNAL_DIR` overrides `journal.directory` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.journal.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.journal.apply_env_overrides();
        Ok(config)
    }
}

/// Journal ingestion settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JournalConfig {
    /// Directory the game writes journal and companion files into.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Tail poll interval in milliseconds (also the fallback interval
    /// for the OS-notification signal).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Retry interval in milliseconds while the directory is
    /// unavailable (degraded state).
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Whether to use OS file-system notifications (with interval
    /// fallback) instead of pure polling.
    #[serde(default = "default_true")]
    pub fs_events: bool,
}

impl JournalConfig {
    /// Override the journal directory with `STARLOG_JOURNAL_DIR` when
    /// the variable is set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("STARLOG_JOURNAL_DIR") {
            self.directory = PathBuf::from(dir);
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            poll_interval_ms: default_poll_interval_ms(),
            retry_interval_ms: default_retry_interval_ms(),
            fs_events: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes
    /// precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

const fn default_poll_interval_ms() -> u64 {
    500
}

const fn default_retry_interval_ms() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.journal.poll_interval_ms, 500);
        assert_eq!(config.journal.retry_interval_ms, 5_000);
        assert!(config.journal.fs_events);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
journal:
  directory: "/games/journals"
  poll_interval_ms: 250
  retry_interval_ms: 10000
  fs_events: false

logging:
  level: "debug"
"#;
        let config = EngineConfig::parse(yaml).unwrap();
        assert_eq!(config.journal.directory, PathBuf::from("/games/journals"));
        assert_eq!(config.journal.poll_interval_ms, 250);
        assert!(!config.journal.fs_events);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn parse_minimal_yaml_uses_defaults() {
        let config = EngineConfig::parse("journal:\n  poll_interval_ms: 100\n").unwrap();
        assert_eq!(config.journal.poll_interval_ms, 100);
        assert_eq!(config.journal.retry_interval_ms, 5_000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(EngineConfig::parse("").is_ok());
    }
}
