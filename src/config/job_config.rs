use crate::adapters::coinmarketcap::DEFAULT_BASE_URL;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Largest page the listings endpoint accepts.
pub const MAX_LISTING_LIMIT: u32 = 5000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub source: SourceConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub start: u32,
    pub limit: u32,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            start: 1,
            limit: 200,
            timeout_seconds: 30,
            retry_attempts: 2,
            retry_delay_seconds: 2,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the discrete fields.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            name: None,
            user: None,
            password: None,
            min_connections: 1,
            max_connections: 10,
            acquire_timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

// Hand-written so credentials never reach the logs.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_deref().map(validation::mask_password))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("min_connections", &self.min_connections)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_seconds", &self.acquire_timeout_seconds)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl JobConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup, using the same
    /// variable names as the container environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(endpoint) = get("COINMARKETCAP_API_URL") {
            config.source.endpoint = endpoint;
        }
        config.source.api_key = get("COINMARKETCAP_API_KEY");
        if let Some(limit) = get("COINMARKETCAP_LISTING_LIMIT") {
            config.source.limit = parse_var("COINMARKETCAP_LISTING_LIMIT", &limit)?;
        }

        config.database.url = get("DATABASE_URL");
        if let Some(host) = get("DB_HOST") {
            config.database.host = host;
        }
        if let Some(port) = get("DB_PORT") {
            config.database.port = parse_var("DB_PORT", &port)?;
        }
        config.database.name = get("DB_NAME");
        config.database.user = get("DB_USER");
        config.database.password = get("DB_PASSWORD");
        if let Some(max) = get("DB_MAX_CONNECTIONS") {
            config.database.max_connections = parse_var("DB_MAX_CONNECTIONS", &max)?;
        }

        config.apply_port_override(&lookup)?;

        Ok(config)
    }

    /// A non-empty `PORT` replaces `server.port`, whichever source the rest
    /// of the configuration came from.
    pub fn apply_port_override<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").filter(|v| !v.trim().is_empty()) {
            self.server.port = parse_var("PORT", &port)?;
        }
        Ok(())
    }

    /// Loads configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML content after `${VAR}` substitution
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content, |key| std::env::var(key).ok());

        toml::from_str(&processed).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| EtlError::InvalidConfigValueError {
            field: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Replaces `${VAR}` with the looked-up value; unknown variables stay verbatim
/// so validation can report them.
pub(crate) fn substitute_env_vars<F>(content: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    use regex::Regex;
    use std::sync::OnceLock;

    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
    });

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
    })
    .into_owned()
}

fn reject_placeholder(field: &str, value: &str) -> Result<()> {
    if value.contains("${") {
        return Err(EtlError::ConfigValidationError {
            field: field.to_string(),
            message: format!("unresolved environment variable in '{}'", value),
        });
    }
    Ok(())
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        let source = &self.source;
        validation::validate_url("source.endpoint", &source.endpoint)?;

        let api_key = validation::validate_required_field("COINMARKETCAP_API_KEY", &source.api_key)?;
        validation::validate_non_empty_string("COINMARKETCAP_API_KEY", api_key)?;
        reject_placeholder("COINMARKETCAP_API_KEY", api_key)?;

        validation::validate_range("source.start", source.start, 1, u32::MAX)?;
        validation::validate_range("source.limit", source.limit, 1, MAX_LISTING_LIMIT)?;
        validation::validate_range("source.timeout_seconds", source.timeout_seconds, 1, 300)?;
        validation::validate_range("source.retry_attempts", source.retry_attempts, 0, 10)?;

        let db = &self.database;
        match &db.url {
            Some(url) => {
                reject_placeholder("DATABASE_URL", url)?;
                validation::validate_database_url("DATABASE_URL", url)?;
            }
            None => {
                validation::validate_non_empty_string("DB_HOST", &db.host)?;
                reject_placeholder("DB_HOST", &db.host)?;
                for (field, value) in [
                    ("DB_NAME", &db.name),
                    ("DB_USER", &db.user),
                    ("DB_PASSWORD", &db.password),
                ] {
                    let value = validation::validate_required_field(field, value)?;
                    reject_placeholder(field, value)?;
                }
            }
        }
        validation::validate_range("database.max_connections", db.max_connections, 1, 100)?;
        validation::validate_range(
            "database.min_connections",
            db.min_connections,
            0,
            db.max_connections,
        )?;

        validation::validate_non_empty_string("server.host", &self.server.host)?;

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}

impl ConfigProvider for JobConfig {
    fn api_endpoint(&self) -> &str {
        &self.source.endpoint
    }

    fn api_key(&self) -> &str {
        self.source.api_key.as_deref().unwrap_or_default()
    }

    fn listing_start(&self) -> u32 {
        self.source.start
    }

    fn listing_limit(&self) -> u32 {
        self.source.limit
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds)
    }

    fn retry_attempts(&self) -> u32 {
        self.source.retry_attempts
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.source.retry_delay_seconds)
    }
}
