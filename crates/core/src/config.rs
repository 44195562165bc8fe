//! Configuration management for vecbase.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults for tuning values
//! - A YAML config file (`vecbase.yaml` or `VECBASE_CONFIG`)
//! - Environment variables (`VECBASE_<NAMESPACE>_<KEY>`)
//! - Command-line flags
//!
//! Values are stored as a namespaced string table. Components read them through
//! the [`ConfigSource`] trait, e.g. `get_value("weaviate", "host")`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "vecbase.yaml";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "VECBASE_";

/// Default number of chunks embedded and written concurrently per request.
pub const DEFAULT_INGEST_CONCURRENCY: usize = 4;

/// Default timeout for store and embedding HTTP calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Capability for looking up named string values.
pub trait ConfigSource: Send + Sync {
    /// Get the value for `key` under `namespace`.
    ///
    /// A missing value is a configuration error.
    fn get_value(&self, namespace: &str, key: &str) -> AppResult<String>;

    /// Get a value, falling back to `default` when it is not set.
    fn get_value_or(&self, namespace: &str, key: &str, default: &str) -> String {
        self.get_value(namespace, key)
            .unwrap_or_else(|_| default.to_string())
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Namespaced values (`weaviate.host`, `ingest.concurrency`, ...)
    pub values: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl AppConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// The file is `config_file` when given, otherwise `VECBASE_CONFIG`,
    /// otherwise `./vecbase.yaml` if it exists. Environment variables of the
    /// form `VECBASE_WEAVIATE_HOST` override file values.
    ///
    /// # Example
    /// ```no_run
    /// use vecbase_core::config::{AppConfig, ConfigSource};
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Store host: {:?}", config.get_value("weaviate", "host"));
    /// ```
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        let mut config = Self::default();

        let explicit = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("VECBASE_CONFIG").ok().map(PathBuf::from));

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                config.merge_yaml(&path)?;
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    config.merge_yaml(&path)?;
                }
            }
        }

        config.apply_env(std::env::vars());

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;
        self.config_file = Some(path.to_path_buf());

        Ok(())
    }

    /// Merge YAML text into this config.
    ///
    /// Top-level mappings become namespaces; their scalar entries become values.
    /// The `logging` section is read into the logging fields instead.
    pub fn merge_yaml_str(&mut self, contents: &str) -> AppResult<()> {
        let sections: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(contents)?;

        for (namespace, section) in sections {
            if namespace == "logging" {
                let logging: LoggingConfig = serde_yaml::from_value(section)?;
                if let Some(level) = logging.level {
                    self.log_level = Some(level);
                }
                if let Some(color) = logging.color {
                    self.no_color = !color;
                }
                continue;
            }

            let serde_yaml::Value::Mapping(entries) = section else {
                return Err(AppError::Config(format!(
                    "Section '{}' must be a mapping",
                    namespace
                )));
            };

            for (key, value) in entries {
                let key = scalar_to_string(&key).ok_or_else(|| {
                    AppError::Config(format!("Non-scalar key in section '{}'", namespace))
                })?;
                let value = scalar_to_string(&value).ok_or_else(|| {
                    AppError::Config(format!(
                        "Value for '{}.{}' must be a scalar",
                        namespace, key
                    ))
                })?;
                self.set_value(&namespace, &key, value);
            }
        }

        Ok(())
    }

    /// Apply `VECBASE_<NAMESPACE>_<KEY>` overrides from an environment listing.
    pub fn apply_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(rest) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            if rest == "CONFIG" {
                continue;
            }
            if let Some((namespace, key)) = rest.split_once('_') {
                if namespace.is_empty() || key.is_empty() {
                    continue;
                }
                self.set_value(&namespace.to_lowercase(), &key.to_lowercase(), value);
            }
        }
    }

    /// Apply CLI overrides to the configuration.
    pub fn with_overrides(
        mut self,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Set a namespaced value, replacing any previous one.
    pub fn set_value(&mut self, namespace: &str, key: &str, value: impl Into<String>) {
        self.values
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Builder-style variant of [`AppConfig::set_value`].
    pub fn with_value(mut self, namespace: &str, key: &str, value: impl Into<String>) -> Self {
        self.set_value(namespace, key, value);
        self
    }

    /// Number of chunks processed concurrently during ingestion.
    pub fn ingest_concurrency(&self) -> AppResult<usize> {
        let concurrency = self.parse_or("ingest", "concurrency", DEFAULT_INGEST_CONCURRENCY)?;
        if concurrency == 0 {
            return Err(AppError::Config(
                "ingest.concurrency must be at least 1".to_string(),
            ));
        }
        Ok(concurrency)
    }

    /// HTTP timeout in seconds for the given namespace (`weaviate` or `embedding`).
    pub fn timeout_secs(&self, namespace: &str) -> AppResult<u64> {
        self.parse_or(namespace, "timeout_secs", DEFAULT_TIMEOUT_SECS)
    }

    fn parse_or<T>(&self, namespace: &str, key: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.lookup(namespace, key) {
            Some(raw) => raw.trim().parse::<T>().map_err(|e| {
                AppError::Config(format!(
                    "Invalid value '{}' for {}.{}: {}",
                    raw, namespace, key, e
                ))
            }),
            None => Ok(default),
        }
    }

    fn lookup(&self, namespace: &str, key: &str) -> Option<&String> {
        self.values.get(namespace).and_then(|section| section.get(key))
    }
}

impl ConfigSource for AppConfig {
    fn get_value(&self, namespace: &str, key: &str) -> AppResult<String> {
        self.lookup(namespace, key).cloned().ok_or_else(|| {
            AppError::Config(format!(
                "Missing configuration value '{}.{}' (set it in {} or VECBASE_{}_{})",
                namespace,
                key,
                DEFAULT_CONFIG_FILE,
                namespace.to_uppercase(),
                key.to_uppercase()
            ))
        })
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
