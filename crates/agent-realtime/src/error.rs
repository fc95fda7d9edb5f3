use tokio_tungstenite::tungstenite;

/// Errors returned by the agent client.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("API key is missing or invalid")]
    MissingApiKey,
    #[error("Invalid header {0}: {1}")]
    InvalidHeader(String, String),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("Connection is not started or has already finished")]
    NotConnected,
    #[error("Connection has already been started")]
    AlreadyStarted,
    #[error("Failed to serialize message: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },
}

pub type Result<T, E = AgentError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AgentError::MissingApiKey.to_string(),
            "API key is missing or invalid"
        );
        assert_eq!(
            AgentError::Api {
                status: 401,
                body: "unauthorized".to_string()
            }
            .to_string(),
            "API returned 401: unauthorized"
        );
        assert_eq!(
            AgentError::InvalidHeader("X Bad".to_string(), "invalid name".to_string())
                .to_string(),
            "Invalid header X Bad: invalid name"
        );
    }
}
