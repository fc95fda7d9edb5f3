//! Events surfaced by an agent connection and the handler seam for them.

use crate::protocol::{
    AgentStartedSpeaking, AgentThinking, ConversationText, ErrorResponse, FunctionCallRequest,
    InjectionRefused, ServerMessage, Welcome,
};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tracing::error;

/// Everything the connection's I/O task can report.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// The socket is connected and the settings frame has been sent.
    Open,
    /// A decoded JSON message from the agent.
    Message(ServerMessage),
    /// A binary frame of agent audio.
    AudioData(Bytes),
    /// The socket closed, with the close frame if the peer sent one.
    Close(Option<CloseReason>),
    /// The transport failed; the connection is gone.
    TransportError(String),
    /// A text frame that is not a known message.
    Unhandled(String),
}

impl AgentEvent {
    /// Classifies a text frame.
    pub fn from_text(text: &str) -> Self {
        match ServerMessage::decode(text) {
            Some(message) => Self::Message(message),
            None => Self::Unhandled(text.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    pub code: u16,
    pub reason: String,
}

impl From<CloseFrame> for CloseReason {
    fn from(frame: CloseFrame) -> Self {
        Self {
            code: frame.code.into(),
            reason: frame.reason.as_str().to_string(),
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} ({})", self.code, self.reason)
        }
    }
}

/// Receives agent events, one method per event kind.
///
/// Every method defaults to doing nothing, so implementors only override the
/// events they care about. [`handle`](AgentEventHandler::handle) routes an
/// [`AgentEvent`] to the matching method.
#[async_trait]
pub trait AgentEventHandler: Send {
    async fn on_open(&mut self) -> Result<()> {
        Ok(())
    }

    async fn on_welcome(&mut self, _welcome: &Welcome) -> Result<()> {
        Ok(())
    }

    async fn on_settings_applied(&mut self) -> Result<()> {
        Ok(())
    }

    async fn on_conversation_text(&mut self, _text: &ConversationText) -> Result<()> {
        Ok(())
    }

    async fn on_user_started_speaking(&mut self) -> Result<()> {
        Ok(())
    }

    async fn on_agent_thinking(&mut self, _thinking: &AgentThinking) -> Result<()> {
        Ok(())
    }

    async fn on_agent_started_speaking(&mut self, _speaking: &AgentStartedSpeaking) -> Result<()> {
        Ok(())
    }

    async fn on_agent_audio_done(&mut self) -> Result<()> {
        Ok(())
    }

    async fn on_audio_data(&mut self, _data: &Bytes) -> Result<()> {
        Ok(())
    }

    async fn on_prompt_updated(&mut self) -> Result<()> {
        Ok(())
    }

    async fn on_speak_updated(&mut self) -> Result<()> {
        Ok(())
    }

    async fn on_injection_refused(&mut self, _refused: &InjectionRefused) -> Result<()> {
        Ok(())
    }

    async fn on_function_call_request(&mut self, _request: &FunctionCallRequest) -> Result<()> {
        Ok(())
    }

    async fn on_warning(&mut self, _warning: &ErrorResponse) -> Result<()> {
        Ok(())
    }

    /// Called for agent `Error` messages and for transport failures.
    async fn on_error(&mut self, _error: &ErrorResponse) -> Result<()> {
        Ok(())
    }

    async fn on_close(&mut self, _reason: Option<&CloseReason>) -> Result<()> {
        Ok(())
    }

    async fn on_unhandled(&mut self, _raw: &str) -> Result<()> {
        Ok(())
    }

    /// Routes `event` to the matching `on_*` method.
    async fn handle(&mut self, event: AgentEvent) -> Result<()> {
        match event {
            AgentEvent::Open => self.on_open().await,
            AgentEvent::AudioData(data) => self.on_audio_data(&data).await,
            AgentEvent::Close(reason) => self.on_close(reason.as_ref()).await,
            AgentEvent::TransportError(description) => {
                self.on_error(&ErrorResponse {
                    description,
                    code: None,
                })
                .await
            }
            AgentEvent::Unhandled(raw) => self.on_unhandled(&raw).await,
            AgentEvent::Message(message) => match message {
                ServerMessage::Welcome(welcome) => self.on_welcome(&welcome).await,
                ServerMessage::SettingsApplied => self.on_settings_applied().await,
                ServerMessage::ConversationText(text) => self.on_conversation_text(&text).await,
                ServerMessage::UserStartedSpeaking => self.on_user_started_speaking().await,
                ServerMessage::AgentThinking(thinking) => self.on_agent_thinking(&thinking).await,
                ServerMessage::AgentStartedSpeaking(speaking) => {
                    self.on_agent_started_speaking(&speaking).await
                }
                ServerMessage::AgentAudioDone => self.on_agent_audio_done().await,
                ServerMessage::PromptUpdated => self.on_prompt_updated().await,
                ServerMessage::SpeakUpdated => self.on_speak_updated().await,
                ServerMessage::InjectionRefused(refused) => {
                    self.on_injection_refused(&refused).await
                }
                ServerMessage::FunctionCallRequest(request) => {
                    self.on_function_call_request(&request).await
                }
                ServerMessage::Warning(warning) => self.on_warning(&warning).await,
                ServerMessage::Error(error) => self.on_error(&error).await,
            },
        }
    }
}

/// Feeds every event from `events` to `handler` until the connection's I/O
/// task ends. A failing handler is logged and does not stop the loop.
pub async fn run_handler<H>(mut events: mpsc::Receiver<AgentEvent>, handler: &mut H)
where
    H: AgentEventHandler + ?Sized,
{
    while let Some(event) = events.recv().await {
        if let Err(e) = handler.handle(event).await {
            error!(error = ?e, "Event handler failed");
        }
    }
}
