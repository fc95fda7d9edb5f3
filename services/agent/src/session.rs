//! Turns agent events into files on disk: one WAV per agent turn and a chat log.

use agent_realtime::{
    AgentEventHandler, CloseReason,
    protocol::{
        AgentStartedSpeaking, AgentThinking, AudioOutput, ConversationText, ErrorResponse,
        FunctionCallRequest, InjectionRefused, Welcome,
    },
};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use tracing::{debug, error, info, warn};
use voice_agent_core::{AudioRecorder, ChatLog, WavError, WavSpec};

/// WAV parameters matching the audio the agent was asked to send.
///
/// Fails when the format cannot be described by a WAV header.
pub fn output_wav_spec(output: &AudioOutput) -> Result<WavSpec, WavError> {
    let bits_per_sample = match output.encoding.as_str() {
        "mulaw" | "alaw" => 8,
        _ => 16,
    };
    let spec = WavSpec::new(output.sample_rate, bits_per_sample, 1);
    spec.validate()?;
    Ok(spec)
}

pub struct SessionRecorder {
    recorder: AudioRecorder,
    chatlog: ChatLog,
}

impl SessionRecorder {
    pub fn new(output_dir: &Path, spec: WavSpec) -> Self {
        Self {
            recorder: AudioRecorder::new(output_dir, spec),
            chatlog: ChatLog::in_dir(output_dir),
        }
    }

    pub fn recorder(&self) -> &AudioRecorder {
        &self.recorder
    }

    pub fn chatlog(&self) -> &ChatLog {
        &self.chatlog
    }
}

#[async_trait]
impl AgentEventHandler for SessionRecorder {
    async fn on_open(&mut self) -> Result<()> {
        info!("Connection opened");
        Ok(())
    }

    async fn on_welcome(&mut self, welcome: &Welcome) -> Result<()> {
        info!(request_id = ?welcome.request_id, "Welcome received");
        let request_id = welcome.request_id.as_deref().unwrap_or_default();
        self.chatlog.record("Welcome message", request_id).await
    }

    async fn on_settings_applied(&mut self) -> Result<()> {
        info!("Settings applied");
        self.chatlog.record("Settings applied", "SettingsApplied").await
    }

    async fn on_conversation_text(&mut self, text: &ConversationText) -> Result<()> {
        info!(role = %text.role, content = %text.content, "Conversation text");
        self.chatlog.record_json(text).await
    }

    async fn on_user_started_speaking(&mut self) -> Result<()> {
        info!("User started speaking");
        self.chatlog
            .record("User Started Speaking", "UserStartedSpeaking")
            .await
    }

    async fn on_agent_thinking(&mut self, thinking: &AgentThinking) -> Result<()> {
        debug!(content = %thinking.content, "Agent thinking");
        self.chatlog.record("Agent Thinking", &thinking.content).await
    }

    async fn on_agent_started_speaking(&mut self, speaking: &AgentStartedSpeaking) -> Result<()> {
        info!(
            total_latency = speaking.total_latency,
            tts_latency = speaking.tts_latency,
            ttt_latency = speaking.ttt_latency,
            "Agent started speaking"
        );
        let record = serde_json::to_string(speaking)?;
        self.chatlog.record("Agent Started Speaking", record).await
    }

    async fn on_audio_data(&mut self, data: &Bytes) -> Result<()> {
        self.recorder.append(data);
        Ok(())
    }

    async fn on_agent_audio_done(&mut self) -> Result<()> {
        info!(bytes = self.recorder.buffered(), "Agent audio done");
        self.recorder.flush().await?;
        Ok(())
    }

    async fn on_injection_refused(&mut self, refused: &InjectionRefused) -> Result<()> {
        warn!(message = %refused.message, "Injection refused");
        self.chatlog.record("Injection refused", &refused.message).await
    }

    async fn on_function_call_request(&mut self, request: &FunctionCallRequest) -> Result<()> {
        info!(
            function = %request.function_name,
            id = %request.function_call_id,
            "Function call requested"
        );
        let record = serde_json::to_string(request)?;
        self.chatlog.record("Function call request", record).await
    }

    async fn on_warning(&mut self, warning: &ErrorResponse) -> Result<()> {
        warn!(%warning, "Agent warning");
        self.chatlog.record("Warning", warning).await
    }

    async fn on_error(&mut self, err: &ErrorResponse) -> Result<()> {
        error!(error = %err, "Agent error");
        self.chatlog.record("Error", err).await
    }

    async fn on_close(&mut self, reason: Option<&CloseReason>) -> Result<()> {
        info!(?reason, "Connection closed");
        let record = reason.map(ToString::to_string).unwrap_or_default();
        self.chatlog.record("Connection closed", record).await
    }

    async fn on_unhandled(&mut self, raw: &str) -> Result<()> {
        debug!(%raw, "Unhandled event");
        self.chatlog.record("Unhandled event", raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_realtime::{AgentEvent, ServerMessage};
    use tempfile::tempdir;
    use voice_agent_core::wav;

    async fn feed(recorder: &mut SessionRecorder, events: Vec<AgentEvent>) {
        for event in events {
            recorder.handle(event).await.unwrap();
        }
    }

    #[test]
    fn test_output_wav_spec() {
        let spec = output_wav_spec(&AudioOutput::default()).unwrap();
        assert_eq!(spec, WavSpec::new(16000, 16, 1));

        let mulaw = AudioOutput {
            encoding: "mulaw".to_string(),
            sample_rate: 8000,
            ..AudioOutput::default()
        };
        assert_eq!(output_wav_spec(&mulaw).unwrap(), WavSpec::new(8000, 8, 1));
    }

    #[test]
    fn test_output_wav_spec_rejects_unrepresentable_rate() {
        let output = AudioOutput {
            sample_rate: 3_000_000_000,
            ..AudioOutput::default()
        };

        assert!(matches!(
            output_wav_spec(&output),
            Err(WavError::ByteRateOverflow { .. })
        ));
    }

    #[tokio::test]
    async fn test_audio_turns_become_numbered_files() {
        let dir = tempdir().unwrap();
        let spec = WavSpec::new(16000, 16, 1);
        let mut session = SessionRecorder::new(dir.path(), spec);

        feed(
            &mut session,
            vec![
                AgentEvent::AudioData(Bytes::from_static(&[1, 2])),
                AgentEvent::AudioData(Bytes::from_static(&[3, 4])),
                AgentEvent::Message(ServerMessage::AgentAudioDone),
                AgentEvent::AudioData(Bytes::from_static(&[5, 6])),
                AgentEvent::Message(ServerMessage::AgentAudioDone),
            ],
        )
        .await;

        assert_eq!(session.recorder().files_written(), 2);
        let first = std::fs::read(dir.path().join("output-0.wav")).unwrap();
        assert_eq!(&first[..wav::HEADER_LEN], &wav::header(&spec).unwrap());
        assert_eq!(&first[wav::HEADER_LEN..], &[1, 2, 3, 4]);
        let second = std::fs::read(dir.path().join("output-1.wav")).unwrap();
        assert_eq!(&second[wav::HEADER_LEN..], &[5, 6]);
    }

    #[tokio::test]
    async fn test_events_are_logged() {
        let dir = tempdir().unwrap();
        let mut session = SessionRecorder::new(dir.path(), WavSpec::default());

        feed(
            &mut session,
            vec![
                AgentEvent::Open,
                AgentEvent::from_text(r#"{"type":"Welcome","request_id":"req-1"}"#),
                AgentEvent::from_text(r#"{"type":"SettingsApplied"}"#),
                AgentEvent::from_text(
                    r#"{"type":"ConversationText","role":"user","content":"Hi there"}"#,
                ),
                AgentEvent::from_text(r#"{"type":"UserStartedSpeaking"}"#),
                AgentEvent::from_text(r#"{"type":"Error","description":"bad audio","code":"E1"}"#),
                AgentEvent::from_text(r#"{"type":"Mystery"}"#),
                AgentEvent::Close(Some(CloseReason {
                    code: 1000,
                    reason: String::new(),
                })),
            ],
        )
        .await;

        let contents = std::fs::read_to_string(session.chatlog().path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Welcome message: req-1",
                "Settings applied: SettingsApplied",
                r#"{"role":"user","content":"Hi there"}"#,
                "User Started Speaking: UserStartedSpeaking",
                "Error: E1: bad audio",
                r#"Unhandled event: {"type":"Mystery"}"#,
                "Connection closed: 1000",
            ]
        );
    }

    #[tokio::test]
    async fn test_transport_error_is_logged_as_error() {
        let dir = tempdir().unwrap();
        let mut session = SessionRecorder::new(dir.path(), WavSpec::default());

        feed(
            &mut session,
            vec![AgentEvent::TransportError("connection reset".to_string())],
        )
        .await;

        let contents = std::fs::read_to_string(session.chatlog().path()).unwrap();
        assert_eq!(contents, "Error: connection reset\n");
    }
}
