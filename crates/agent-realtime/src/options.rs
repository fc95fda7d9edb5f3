//! Connection options shared by the REST and WebSocket sides of the client.

use crate::error::{AgentError, Result};
use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeMap;

/// Default REST host.
pub const DEFAULT_URL: &str = "api.deepgram.com";
/// Default agent WebSocket endpoint.
pub const DEFAULT_AGENT_URL: &str = "wss://agent.deepgram.com/v1/agent/converse";

const USER_AGENT: &str = concat!("voice-agent/", env!("CARGO_PKG_VERSION"));

/// Options for [`AgentClient`](crate::AgentClient).
///
/// The API key is kept in a [`SecretString`] so it never shows up in `Debug`
/// output or logs.
#[derive(Debug)]
pub struct ClientOptions {
    api_key: SecretString,
    url: String,
    agent_url: String,
    headers: BTreeMap<String, String>,
    keep_alive: bool,
}

impl ClientOptions {
    /// Creates options for `api_key` with the default endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::MissingApiKey`] if the key is empty or blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AgentError::MissingApiKey);
        }
        Ok(Self {
            api_key: SecretString::from(api_key),
            url: normalize_url(DEFAULT_URL),
            agent_url: DEFAULT_AGENT_URL.to_string(),
            headers: BTreeMap::new(),
            keep_alive: true,
        })
    }

    /// Sets the REST base URL. A missing scheme defaults to `https://`.
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = normalize_url(url);
        self
    }

    pub fn with_agent_url(mut self, agent_url: impl Into<String>) -> Self {
        self.agent_url = agent_url.into();
        self
    }

    /// Adds a header sent on every request, overriding a default of the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn agent_url(&self) -> &str {
        &self.agent_url
    }

    pub fn is_keep_alive_enabled(&self) -> bool {
        self.keep_alive
    }

    /// The full header set: defaults, the token header, then custom headers.
    pub fn headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::from([
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
            (
                "Authorization".to_string(),
                format!("Token {}", self.api_key.expose_secret()),
            ),
        ]);
        headers.extend(self.headers.clone());
        headers
    }
}

/// Prefixes `https://` when `url` has no http(s) scheme and strips trailing slashes.
pub fn normalize_url(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    let url = if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("api.deepgram.com"), "https://api.deepgram.com");
        assert_eq!(normalize_url("http://localhost:8080/"), "http://localhost:8080");
        assert_eq!(normalize_url("HTTPS://Example.com//"), "HTTPS://Example.com");
        assert_eq!(normalize_url("example.com/v1/"), "https://example.com/v1");
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        assert!(matches!(
            ClientOptions::new(""),
            Err(AgentError::MissingApiKey)
        ));
        assert!(matches!(
            ClientOptions::new("   "),
            Err(AgentError::MissingApiKey)
        ));
    }

    #[test]
    fn test_defaults() {
        let options = ClientOptions::new("secret-key").unwrap();

        assert_eq!(options.url(), "https://api.deepgram.com");
        assert_eq!(options.agent_url(), DEFAULT_AGENT_URL);
        assert!(options.is_keep_alive_enabled());
        assert_eq!(options.api_key().expose_secret(), "secret-key");
    }

    #[test]
    fn test_headers_include_token_and_overrides() {
        let options = ClientOptions::new("secret-key")
            .unwrap()
            .with_header("Accept", "text/plain")
            .with_header("X-Trace", "abc");
        let headers = options.headers();

        assert_eq!(headers["Authorization"], "Token secret-key");
        assert_eq!(headers["Accept"], "text/plain");
        assert_eq!(headers["X-Trace"], "abc");
        assert!(headers["User-Agent"].starts_with("voice-agent/"));
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let options = ClientOptions::new("super-secret").unwrap();
        assert!(!format!("{options:?}").contains("super-secret"));
    }
}
