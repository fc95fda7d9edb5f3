use agent_realtime::{AgentError, ClientOptions};
use secrecy::{ExposeSecret, SecretString};
use tracing_subscriber::EnvFilter;

/// How many `DEEPGRAM_HEADER_{i}` / `DEEPGRAM_HEADER_VALUE_{i}` pairs are read.
const MAX_EXTRA_HEADERS: usize = 20;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Debug)]
pub struct Config {
    pub api_key: SecretString,
    /// REST host override (`DEEPGRAM_HOST`).
    pub host: Option<String>,
    /// Agent WebSocket endpoint override (`DEEPGRAM_AGENT_URL`).
    pub agent_url: Option<String>,
    pub keep_alive: bool,
    pub headers: Vec<(String, String)>,
    /// `RUST_LOG` directives, e.g. `info` or `voice_agent=debug,agent_realtime=trace`.
    pub log_filter: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Fails on a missing API key before anything touches the network.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let api_key = std::env::var("DEEPGRAM_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("DEEPGRAM_API_KEY".to_string()))?;

        let host = std::env::var("DEEPGRAM_HOST").ok();
        let agent_url = std::env::var("DEEPGRAM_AGENT_URL").ok();

        let keep_alive = match std::env::var("DEEPGRAM_KEEPALIVE") {
            Ok(value) => parse_bool(&value).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "DEEPGRAM_KEEPALIVE".to_string(),
                    format!("'{}' is not a boolean", value),
                )
            })?,
            Err(_) => true,
        };

        let mut headers = Vec::new();
        for i in 0..MAX_EXTRA_HEADERS {
            if let Ok(name) = std::env::var(format!("DEEPGRAM_HEADER_{i}")) {
                let value_var = format!("DEEPGRAM_HEADER_VALUE_{i}");
                let value =
                    std::env::var(&value_var).map_err(|_| ConfigError::MissingVar(value_var))?;
                headers.push((name, value));
            }
        }

        let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        EnvFilter::try_new(&log_filter).map_err(|e| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid filter: {}", log_filter, e),
            )
        })?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            host,
            agent_url,
            keep_alive,
            headers,
            log_filter,
        })
    }

    /// The tracing filter built from [`log_filter`](Config::log_filter).
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::new(&self.log_filter)
    }

    /// The first five characters of the key, for confirming which key is in use.
    pub fn api_key_hint(&self) -> String {
        let prefix: String = self.api_key.expose_secret().chars().take(5).collect();
        format!("{prefix}...")
    }

    /// Builds client options from this configuration.
    pub fn client_options(&self) -> Result<ClientOptions, AgentError> {
        let mut options =
            ClientOptions::new(self.api_key.expose_secret())?.with_keep_alive(self.keep_alive);
        if let Some(host) = &self.host {
            options = options.with_url(host);
        }
        if let Some(agent_url) = &self.agent_url {
            options = options.with_agent_url(agent_url.clone());
        }
        for (name, value) in &self.headers {
            options = options.with_header(name.clone(), value.clone());
        }
        Ok(options)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
