use std::fmt;

use crate::frameworks::config::{ClientConfig, ConfigError};
use crate::interface_adapters::{HttpBackend, SystemClock};
use crate::use_cases::ResourceApi;

// Client over HTTP for whichever portal the config names.
pub type HttpApi = ResourceApi<HttpBackend, SystemClock>;

#[derive(Debug)]
pub enum ConnectError {
    Config(ConfigError),
    Client(reqwest::Error),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::Config(err) => write!(f, "configuration error: {err}"),
            ConnectError::Client(err) => write!(f, "failed to build http client: {err}"),
        }
    }
}

impl std::error::Error for ConnectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectError::Config(err) => Some(err),
            ConnectError::Client(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ConnectError {
    fn from(err: ConfigError) -> Self {
        ConnectError::Config(err)
    }
}

// Wires the reqwest backend, wall clock and cache from `config`.
pub fn build(config: &ClientConfig) -> Result<HttpApi, ConnectError> {
    let mut backend =
        HttpBackend::new(config.api_url.clone(), config.timeout).map_err(ConnectError::Client)?;
    if let Some(token) = &config.api_token {
        backend = backend.with_token(token.clone());
    }

    tracing::info!(
        api_url = %config.api_url,
        portal = %config.portal,
        timeout_ms = config.timeout.as_millis() as u64,
        cache_fresh_ms = config.cache_fresh_for.as_millis() as u64,
        "api client ready"
    );

    Ok(ResourceApi::new(
        backend,
        SystemClock,
        config.cache_fresh_for,
        config.page_size,
    )
    .with_portal(config.portal))
}

// Loads configuration from the environment and builds the client.
pub fn connect() -> Result<HttpApi, ConnectError> {
    let config = ClientConfig::load()?;
    build(&config)
}
