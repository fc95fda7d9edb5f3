//! REST entry point: builds agent connections and exchanges the API key for access tokens.

use crate::{
    connection::AgentConnection,
    error::{AgentError, Result},
    options::ClientOptions,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// A short-lived access token returned by the grant endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GrantToken {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: f64,
}

#[derive(Serialize)]
struct GrantRequest {
    ttl_seconds: u32,
}

/// Entry point for talking to the agent service.
#[derive(Debug, Clone)]
pub struct AgentClient {
    options: Arc<ClientOptions>,
    http: reqwest::Client,
}

impl AgentClient {
    pub fn new(options: ClientOptions) -> Self {
        Self {
            options: Arc::new(options),
            http: reqwest::Client::new(),
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// A new, not yet started agent session.
    pub fn connection(&self) -> AgentConnection {
        AgentConnection::new(self.options.clone())
    }

    /// Exchanges the API key for a temporary access token.
    ///
    /// `ttl_seconds` is left to the server's default when `None`.
    pub async fn grant_token(&self, ttl_seconds: Option<u32>) -> Result<GrantToken> {
        let url = format!("{}/v1/auth/grant", self.options.url());
        debug!(%url, ?ttl_seconds, "Requesting access token");

        let mut request = self.http.post(&url);
        for (name, value) in self.options.headers() {
            request = request.header(name, value);
        }
        if let Some(ttl_seconds) = ttl_seconds {
            request = request.json(&GrantRequest { ttl_seconds });
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let token: GrantToken = response.json().await?;
        info!(expires_in = token.expires_in, "Access token granted");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_token_response_shape() {
        let token: GrantToken =
            serde_json::from_str(r#"{"access_token":"eyJ0eXAi","expires_in":30}"#).unwrap();
        assert_eq!(token.access_token, "eyJ0eXAi");
        assert_eq!(token.expires_in, 30.0);
    }

    #[test]
    fn test_connection_is_not_started() {
        let client = AgentClient::new(ClientOptions::new("key").unwrap());
        assert!(!client.connection().is_started());
    }
}
