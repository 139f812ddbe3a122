use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Files checked, in order, when no `--config` path is given.
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["lunchly.toml", "config/lunchly.toml"];

pub const DATABASE_URL: &str = "database.url";
pub const DATABASE_MAX_CONNECTIONS: &str = "database.max_connections";
pub const DATABASE_TIMEOUT_SECS: &str = "database.timeout_secs";
pub const LOGGING_LEVEL: &str = "logging.level";
pub const LOGGING_FORMAT: &str = "logging.format";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Values given on the command line. They beat every other layer.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// An explicit config file. Unlike the default locations it must exist.
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("config file `{0}` does not exist")]
    MissingConfigFile(PathBuf),
    #[error("`${{{var}}}` in the config file refers to an unset environment variable")]
    MissingEnvInterpolation { var: String },
    #[error("`${{` in the config file is never closed")]
    UnterminatedInterpolation,
    #[error("`{key}={value}` is not a valid setting")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// The layer an effective setting came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueSource {
    Default,
    File(PathBuf),
    Env(&'static str),
    Flag(&'static str),
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::File(path) => write!(f, "file ({})", path.display()),
            Self::Env(var) => write!(f, "env ({var})"),
            Self::Flag(flag) => write!(f, "flag ({flag})"),
        }
    }
}

static UNSET: ValueSource = ValueSource::Default;

/// An effective configuration plus the source of each setting.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub config: AppConfig,
    pub file: Option<PathBuf>,
    sources: BTreeMap<&'static str, ValueSource>,
}

impl ResolvedConfig {
    pub fn source(&self, key: &str) -> &ValueSource {
        self.sources.get(key).unwrap_or(&UNSET)
    }

    /// Every setting as `(key, value, source)`, in display order.
    pub fn entries(&self) -> Vec<(&'static str, String, &ValueSource)> {
        let config = &self.config;
        [
            (DATABASE_URL, config.database.url.clone()),
            (DATABASE_MAX_CONNECTIONS, config.database.max_connections.to_string()),
            (DATABASE_TIMEOUT_SECS, config.database.timeout_secs.to_string()),
            (LOGGING_LEVEL, config.logging.level.clone()),
            (LOGGING_FORMAT, config.logging.format.to_string()),
        ]
        .into_iter()
        .map(|(key, value)| (key, value, self.source(key)))
        .collect()
    }

    fn record(&mut self, key: &'static str, source: ValueSource) {
        self.sources.insert(key, source);
    }

    fn apply_file(&mut self, patch: ConfigPatch, path: &Path) {
        let source = ValueSource::File(path.to_path_buf());
        let database = patch.database.unwrap_or_default();
        let logging = patch.logging.unwrap_or_default();

        if let Some(url) = database.url {
            self.config.database.url = url;
            self.record(DATABASE_URL, source.clone());
        }
        if let Some(max_connections) = database.max_connections {
            self.config.database.max_connections = max_connections;
            self.record(DATABASE_MAX_CONNECTIONS, source.clone());
        }
        if let Some(timeout_secs) = database.timeout_secs {
            self.config.database.timeout_secs = timeout_secs;
            self.record(DATABASE_TIMEOUT_SECS, source.clone());
        }
        if let Some(level) = logging.level {
            self.config.logging.level = level;
            self.record(LOGGING_LEVEL, source.clone());
        }
        if let Some(format) = logging.format {
            self.config.logging.format = format;
            self.record(LOGGING_FORMAT, source);
        }
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some((var, url)) = first_env(&["LUNCHLY_DATABASE_URL"]) {
            self.config.database.url = url;
            self.record(DATABASE_URL, ValueSource::Env(var));
        }
        if let Some((var, raw)) = first_env(&["LUNCHLY_DATABASE_MAX_CONNECTIONS"]) {
            self.config.database.max_connections = parse_env(var, &raw)?;
            self.record(DATABASE_MAX_CONNECTIONS, ValueSource::Env(var));
        }
        if let Some((var, raw)) = first_env(&["LUNCHLY_DATABASE_TIMEOUT_SECS"]) {
            self.config.database.timeout_secs = parse_env(var, &raw)?;
            self.record(DATABASE_TIMEOUT_SECS, ValueSource::Env(var));
        }
        if let Some((var, level)) = first_env(&["LUNCHLY_LOGGING_LEVEL", "LUNCHLY_LOG_LEVEL"]) {
            self.config.logging.level = level;
            self.record(LOGGING_LEVEL, ValueSource::Env(var));
        }
        if let Some((var, raw)) = first_env(&["LUNCHLY_LOGGING_FORMAT", "LUNCHLY_LOG_FORMAT"]) {
            self.config.logging.format = raw.parse()?;
            self.record(LOGGING_FORMAT, ValueSource::Env(var));
        }
        Ok(())
    }

    fn apply_flags(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.database_url {
            self.config.database.url = url;
            self.record(DATABASE_URL, ValueSource::Flag("--database-url"));
        }
        if let Some(level) = overrides.log_level {
            self.config.logging.level = level;
            self.record(LOGGING_LEVEL, ValueSource::Flag("--log-level"));
        }
        if let Some(format) = overrides.log_format {
            self.config.logging.format = format;
            self.record(LOGGING_FORMAT, ValueSource::Flag("--log-format"));
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://lunchly.db?mode=rwc".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        [Self::Compact, Self::Pretty, Self::Json]
            .into_iter()
            .find(|format| value.trim().eq_ignore_ascii_case(format.as_str()))
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "unsupported log format `{value}` (expected compact|pretty|json)"
                ))
            })
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        Self::resolve(options).map(|resolved| resolved.config)
    }

    /// Layers defaults, the config file, `LUNCHLY_*` env vars and command-line
    /// overrides, in that order, then validates the result.
    pub fn resolve(options: LoadOptions) -> Result<ResolvedConfig, ConfigError> {
        let mut resolved =
            ResolvedConfig { config: Self::default(), file: None, sources: BTreeMap::new() };

        if let Some(path) = locate_config_file(options.config_path)? {
            let patch = read_patch(&path)?;
            resolved.apply_file(patch, &path);
            resolved.file = Some(path);
        }
        resolved.apply_env()?;
        resolved.apply_flags(options.overrides);
        resolved.config.validate()?;

        Ok(resolved)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.database.url.trim();
        if !(url.starts_with("sqlite:") || url == ":memory:") {
            return Err(ConfigError::Validation(format!(
                "database.url must be a sqlite URL like `sqlite://lunchly.db`, got `{url}`"
            )));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if !(1..=300).contains(&self.database.timeout_secs) {
            return Err(ConfigError::Validation(
                "database.timeout_secs must be in range 1..=300".to_string(),
            ));
        }

        let level = self.logging.level.trim().to_ascii_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of trace|debug|info|warn|error, got `{}`",
                self.logging.level
            )));
        }
        Ok(())
    }
}

fn locate_config_file(explicit: Option<PathBuf>) -> Result<Option<PathBuf>, ConfigError> {
    match explicit {
        Some(path) if path.is_file() => Ok(Some(path)),
        Some(path) => Err(ConfigError::MissingConfigFile(path)),
        None => Ok(DEFAULT_CONFIG_FILES.into_iter().map(PathBuf::from).find(|path| path.is_file())),
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&interpolate_env_vars(&raw)?)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Replaces every `${VAR}` with the value of `VAR`.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let var = &after[..end];
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &after[end + 1..];
    }
    output.push_str(rest);

    Ok(output)
}

/// First variable in `vars` holding a non-blank value.
fn first_env(vars: &[&'static str]) -> Option<(&'static str, String)> {
    vars.iter().find_map(|var| {
        env::var(var).ok().filter(|value| !value.trim().is_empty()).map(|value| (*var, value))
    })
}

fn parse_env<T: FromStr>(var: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: var.to_string(),
        value: raw.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
