//! The two things the binary does: hold a conversation, or mint a token.

use crate::{
    cli::{ConverseArgs, GrantArgs},
    config::Config,
    session::{SessionRecorder, output_wav_spec},
    source::{AudioSource, StreamStats, stream_audio},
};
use agent_realtime::{AgentClient, run_handler};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

/// What a finished conversation left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConverseSummary {
    pub stream: StreamStats,
    pub files_written: usize,
}

/// Streams the audio to the agent, waits for its replies, and records them.
///
/// The connection is always finished, even when streaming fails part way.
pub async fn converse(config: &Config, args: &ConverseArgs) -> Result<ConverseSummary> {
    tokio::fs::create_dir_all(&args.output_dir)
        .await
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    let settings = args.settings();
    let spec =
        output_wav_spec(&settings.audio.output).context("Unsupported output audio format")?;
    let mut session = SessionRecorder::new(&args.output_dir, spec);

    let client = AgentClient::new(config.client_options()?);
    let mut connection = client.connection();
    let events = connection
        .start(&settings)
        .await
        .context("Failed to start agent connection")?;

    let consumer = tokio::spawn(async move {
        run_handler(events, &mut session).await;
        session
    });

    let source = AudioSource::parse(&args.audio);
    info!(%source, chunk_size = args.chunk_size(), "Streaming audio");
    let streamed = stream_audio(
        &source,
        args.chunk_size(),
        Duration::from_millis(args.chunk_delay_ms),
        |chunk| Ok(connection.send_audio(chunk)?),
    )
    .await;

    if streamed.is_ok() {
        let wait = Duration::from_secs(args.wait_secs);
        info!(wait_secs = args.wait_secs, "Waiting for the agent to respond");
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, finishing early");
            }
        }
    }

    connection.finish().await?;
    let session = consumer.await.context("Event consumer task failed")?;
    let stream = streamed.with_context(|| format!("Failed to stream {source}"))?;

    let summary = ConverseSummary {
        stream,
        files_written: session.recorder().files_written(),
    };
    if session.recorder().buffered() > 0 {
        warn!(
            bytes = session.recorder().buffered(),
            "Session ended with agent audio that was never flushed"
        );
    }
    info!(?summary, output_dir = %args.output_dir.display(), "Conversation finished");
    Ok(summary)
}

/// Requests a temporary token and prints it as JSON on stdout.
pub async fn grant(config: &Config, args: &GrantArgs) -> Result<()> {
    let client = AgentClient::new(config.client_options()?);
    let token = client
        .grant_token(args.ttl)
        .await
        .context("Failed to request access token")?;
    println!("{}", serde_json::to_string_pretty(&token)?);
    Ok(())
}
