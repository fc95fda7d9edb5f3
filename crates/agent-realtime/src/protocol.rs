//! JSON messages exchanged with the agent over the WebSocket.
//!
//! Every text frame is an object tagged by `"type"`. Audio travels as binary
//! frames in both directions and has no JSON representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_tungstenite::tungstenite::Message;

// --- Settings ---

/// Session configuration, sent as the first frame after connecting.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub audio: AudioConfig,
    pub agent: AgentConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct AudioConfig {
    pub input: AudioInput,
    pub output: AudioOutput,
}

/// Format of the audio the client streams up.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AudioInput {
    pub encoding: String,
    pub sample_rate: u32,
}

impl Default for AudioInput {
    fn default() -> Self {
        Self {
            encoding: "linear16".to_string(),
            sample_rate: 24000,
        }
    }
}

/// Format of the agent audio the client receives.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AudioOutput {
    pub encoding: String,
    pub sample_rate: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

impl Default for AudioOutput {
    fn default() -> Self {
        Self {
            encoding: "linear16".to_string(),
            sample_rate: 16000,
            bitrate: None,
            container: Some("wav".to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub language: String,
    pub listen: Listen,
    pub think: Think,
    pub speak: Speak,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            listen: Listen {
                provider: Provider::new("deepgram", "nova-3"),
            },
            think: Think {
                provider: Provider::new("open_ai", "gpt-4o-mini"),
                prompt: Some("You are a friendly AI assistant.".to_string()),
                functions: Vec::new(),
            },
            speak: Speak {
                provider: Provider::new("deepgram", "aura-2-thalia-en"),
            },
            greeting: Some("Hello! How can I help you today?".to_string()),
        }
    }
}

/// Speech-to-text stage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Listen {
    pub provider: Provider,
}

/// Language-model stage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Think {
    pub provider: Provider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<Function>,
}

/// Text-to-speech stage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Speak {
    pub provider: Provider,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Provider {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Provider {
    pub fn new(kind: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            model: Some(model.into()),
        }
    }
}

/// A function the think stage may ask the client to call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

// --- Client -> agent ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    Settings(Settings),
    KeepAlive,
    UpdatePrompt {
        prompt: String,
    },
    UpdateSpeak {
        speak: Speak,
    },
    InjectAgentMessage {
        message: String,
    },
    FunctionCallResponse {
        function_call_id: String,
        output: String,
    },
}

impl ClientMessage {
    /// Serializes the message into a WebSocket text frame.
    pub fn to_frame(&self) -> Result<Message, serde_json::Error> {
        Ok(Message::Text(serde_json::to_string(self)?.into()))
    }
}

// --- Agent -> client ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    Welcome(Welcome),
    SettingsApplied,
    ConversationText(ConversationText),
    UserStartedSpeaking,
    AgentThinking(AgentThinking),
    AgentStartedSpeaking(AgentStartedSpeaking),
    AgentAudioDone,
    PromptUpdated,
    SpeakUpdated,
    InjectionRefused(InjectionRefused),
    FunctionCallRequest(FunctionCallRequest),
    Warning(ErrorResponse),
    Error(ErrorResponse),
}

impl ServerMessage {
    /// Decodes a text frame. Unknown types and malformed JSON yield `None`.
    pub fn decode(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Renders the message as its JSON wire form.
impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Welcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// A line of the conversation, spoken by either the user or the agent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConversationText {
    pub role: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AgentThinking {
    #[serde(default)]
    pub content: String,
}

/// Latencies in seconds for the turn the agent is about to speak.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct AgentStartedSpeaking {
    #[serde(default)]
    pub total_latency: f64,
    #[serde(default)]
    pub tts_latency: f64,
    #[serde(default)]
    pub ttt_latency: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InjectionRefused {
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FunctionCallRequest {
    pub function_name: String,
    pub function_call_id: String,
    #[serde(default)]
    pub input: String,
}

/// Payload shared by `Warning` and `Error` messages.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.description),
            None => f.write_str(&self.description),
        }
    }
}
