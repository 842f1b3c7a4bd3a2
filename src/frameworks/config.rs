use serde::Deserialize;
use std::{env, fmt, fs, path::PathBuf, time::Duration};
use url::Url;

use crate::domain::Portal;
use crate::use_cases::DEFAULT_PAGE_SIZE;

// Client settings. Sources in priority order: environment, the TOML file
// named by `ACM_CONFIG`, built-in defaults.

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);
pub const DEFAULT_CACHE_FRESH_FOR: Duration = Duration::from_millis(30_000);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: Url,
    pub timeout: Duration,
    pub cache_fresh_for: Duration,
    pub page_size: u64,
    pub api_token: Option<String>,
    pub portal: Portal,
}

// Keys accepted in the TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub cache_fresh_ms: Option<u64>,
    pub page_size: Option<u64>,
    pub api_token: Option<String>,
    pub portal: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidUrl {
        value: String,
        reason: String,
    },
    InvalidValue {
        key: &'static str,
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config file {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config file {}: {source}", path.display())
            }
            ConfigError::InvalidUrl { value, reason } => {
                write!(f, "invalid api url {value:?}: {reason}")
            }
            ConfigError::InvalidValue { key, value } => write!(f, "invalid value {value:?} for {key}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    env::var("ACM_CONFIG").ok().map(PathBuf::from)
}

pub fn read_file(path: PathBuf) -> Result<FileConfig, ConfigError> {
    let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
}

pub fn parse_portal(value: &str) -> Result<Portal, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "admin" => Ok(Portal::Admin),
        "farmer" => Ok(Portal::Farmer),
        _ => Err(ConfigError::InvalidValue {
            key: "ACM_PORTAL",
            value: value.to_string(),
        }),
    }
}

pub fn parse_api_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|err| ConfigError::InvalidUrl {
        value: value.to_string(),
        reason: err.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            value: value.to_string(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

impl ClientConfig {
    /// Loads `.env`, the optional TOML file, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env locally; safe to ignore when not present.
        let _ = dotenvy::dotenv();
        let file = config_path().map(read_file).transpose()?.unwrap_or_default();
        Self::resolve(file, |key| env::var(key).ok())
    }

    // Environment values win over file values; unparseable numbers fall back.
    pub fn resolve(
        file: FileConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let number = |key: &str| lookup(key).and_then(|value| value.trim().parse::<u64>().ok());

        let api_url = lookup("ACM_API_URL")
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout = number("ACM_API_TIMEOUT_MS")
            .or(file.timeout_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT);
        let cache_fresh_for = number("ACM_CACHE_FRESH_MS")
            .or(file.cache_fresh_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_CACHE_FRESH_FOR);
        let page_size = number("ACM_PAGE_SIZE")
            .or(file.page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ACM_PAGE_SIZE",
                value: page_size.to_string(),
            });
        }
        let api_token = lookup("ACM_API_TOKEN")
            .or(file.api_token)
            .filter(|token| !token.trim().is_empty());
        let portal = match lookup("ACM_PORTAL").or(file.portal) {
            Some(value) => parse_portal(&value)?,
            None => Portal::Admin,
        };

        Ok(Self {
            api_url: parse_api_url(&api_url)?,
            timeout,
            cache_fresh_for,
            page_size,
            api_token,
            portal,
        })
    }
}
