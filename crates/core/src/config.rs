use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_CANDIDATES: [&str; 2] = ["hrdesk.toml", "config/hrdesk.toml"];

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub directory: DirectoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

/// Settings for records the system derives on its own.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Mail domain of accounts derived from employee names.
    pub account_domain: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
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

/// Values set by a binary's own flags. They win over file and environment.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub account_domain: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Explicit file; when absent the working-directory candidates are tried.
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("config file references `${{{var}}}` but it is not set")]
    MissingEnvInterpolation { var: String },
    #[error("config file has an unterminated `${{` expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://hrdesk.db".to_string(), max_connections: 5, timeout_secs: 30 }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1".to_string(), port: 9000, graceful_shutdown_secs: 15 }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self { account_domain: "company.com".to_string() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            directory: DirectoryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file, then `HRDESK_*` variables, then overrides.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = match locate_file(options.config_path.as_deref()) {
            Some(path) => read_file(&path)?,
            None => Self::default(),
        };

        config.apply_env()?;
        config.apply_overrides(options.overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        let database = &mut self.database;
        set_from_env(&mut database.url, "HRDESK_DATABASE_URL")?;
        set_from_env(&mut database.max_connections, "HRDESK_DATABASE_MAX_CONNECTIONS")?;
        set_from_env(&mut database.timeout_secs, "HRDESK_DATABASE_TIMEOUT_SECS")?;

        let server = &mut self.server;
        set_from_env(&mut server.bind_address, "HRDESK_SERVER_BIND_ADDRESS")?;
        set_from_env(&mut server.port, "HRDESK_SERVER_PORT")?;
        set_from_env(&mut server.graceful_shutdown_secs, "HRDESK_SERVER_GRACEFUL_SHUTDOWN_SECS")?;

        set_from_env(&mut self.directory.account_domain, "HRDESK_DIRECTORY_ACCOUNT_DOMAIN")?;

        set_from_env(&mut self.logging.level, "HRDESK_LOGGING_LEVEL")?;
        if let Some(value) = env_value("HRDESK_LOGGING_FORMAT") {
            self.logging.format = value.parse()?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.database_url {
            self.database.url = url;
        }
        if let Some(domain) = overrides.account_domain {
            self.directory.account_domain = domain;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.database.url.trim();
        if !(url.starts_with("sqlite:") || url == ":memory:") {
            return invalid("database.url must be a sqlite URL such as `sqlite://hrdesk.db`");
        }
        if self.database.max_connections == 0 {
            return invalid("database.max_connections must be greater than zero");
        }
        if !(1..=300).contains(&self.database.timeout_secs) {
            return invalid("database.timeout_secs must be in range 1..=300");
        }

        if self.server.bind_address.trim().is_empty() {
            return invalid("server.bind_address must not be empty");
        }
        if self.server.port == 0 {
            return invalid("server.port must be greater than zero");
        }
        if self.server.graceful_shutdown_secs == 0 {
            return invalid("server.graceful_shutdown_secs must be greater than zero");
        }

        let domain = self.directory.account_domain.trim();
        if domain.is_empty() || domain.contains('@') || domain.contains(char::is_whitespace) {
            return invalid(
                "directory.account_domain must be a bare mail domain such as `company.com`",
            );
        }

        match self.logging.level.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => invalid("logging.level must be one of trace|debug|info|warn|error"),
        }
    }
}

fn invalid(message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Validation(message.to_string()))
}

fn locate_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => CONFIG_CANDIDATES.iter().map(PathBuf::from).find(|path| path.exists()),
    }
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&expand_env_refs(&raw)?)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Replaces every `${NAME}` with the value of the environment variable `NAME`.
fn expand_env_refs(raw: &str) -> Result<String, ConfigError> {
    let mut expanded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some((before, after)) = rest.split_once("${") {
        let (var, tail) = after.split_once('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        expanded.push_str(before);
        expanded.push_str(&value);
        rest = tail;
    }
    expanded.push_str(rest);
    Ok(expanded)
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn set_from_env<T: FromStr>(slot: &mut T, key: &str) -> Result<(), ConfigError> {
    if let Some(value) = env_value(key) {
        *slot = value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: value.clone(),
        })?;
    }
    Ok(())
}
