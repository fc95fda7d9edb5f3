//! A single bidirectional agent session over a WebSocket.

use crate::{
    error::{AgentError, Result},
    events::{AgentEvent, CloseReason},
    keepalive::{KEEP_ALIVE_INTERVAL, KeepAlive},
    options::ClientOptions,
    protocol::{ClientMessage, Settings},
};
use bytes::Bytes;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::{
    net::TcpStream,
    sync::mpsc,
    task::{AbortHandle, JoinHandle},
    time::timeout,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        Message,
        client::IntoClientRequest,
        handshake::client::Request,
        http::{HeaderName, HeaderValue},
    },
};
use tracing::{debug, error, info, instrument, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Capacity of the event channel handed back by [`AgentConnection::start`].
const EVENT_CHANNEL_CAPACITY: usize = 128;
/// How long `finish` waits for the agent to acknowledge the close.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// One agent session.
///
/// Nothing touches the network until [`start`](AgentConnection::start). All
/// outgoing frames (audio, control messages, keep-alives) go through one queue
/// drained by a writer task, which is the socket's only writer. Incoming frames
/// are read by a separate reader task, so a slow event consumer delays event
/// delivery but never outgoing writes.
#[derive(Debug)]
pub struct AgentConnection {
    options: Arc<ClientOptions>,
    outgoing: Option<mpsc::UnboundedSender<Message>>,
    open: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
    keep_alive: Option<KeepAlive>,
    keep_alive_interval: Duration,
}

impl AgentConnection {
    pub(crate) fn new(options: Arc<ClientOptions>) -> Self {
        Self {
            options,
            outgoing: None,
            open: Arc::new(AtomicBool::new(false)),
            reader: None,
            writer: None,
            keep_alive: None,
            keep_alive_interval: KEEP_ALIVE_INTERVAL,
        }
    }

    /// Overrides the keep-alive period used by [`start`](AgentConnection::start).
    pub fn with_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    pub fn is_started(&self) -> bool {
        self.outgoing.is_some()
    }

    /// Connects, sends `settings` as the first frame and starts the I/O tasks.
    ///
    /// Returns the receiver of every [`AgentEvent`] of the session, beginning
    /// with [`AgentEvent::Open`]. The receiver closes when the session ends.
    #[instrument(skip_all, fields(url = %self.options.agent_url()))]
    pub async fn start(&mut self, settings: &Settings) -> Result<mpsc::Receiver<AgentEvent>> {
        if self.is_started() {
            return Err(AgentError::AlreadyStarted);
        }

        let request = build_request(&self.options)?;
        let (ws_stream, _) = connect_async(request).await?;
        info!("Connected to agent WebSocket");
        let (mut ws_tx, ws_rx) = ws_stream.split();

        ws_tx
            .send(ClientMessage::Settings(settings.clone()).to_frame()?)
            .await?;
        debug!("Sent settings");

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let _ = event_tx.send(AgentEvent::Open).await;

        self.open.store(true, Ordering::SeqCst);
        let writer = tokio::spawn(run_writer(ws_tx, outgoing_rx, event_tx.clone()));
        self.reader = Some(tokio::spawn(run_reader(
            ws_rx,
            event_tx,
            self.open.clone(),
            writer.abort_handle(),
        )));
        self.writer = Some(writer);

        if self.options.is_keep_alive_enabled() {
            self.keep_alive = Some(KeepAlive::spawn(
                outgoing_tx.clone(),
                self.keep_alive_interval,
            ));
        }
        self.outgoing = Some(outgoing_tx);

        Ok(event_rx)
    }

    /// Queues a JSON control message.
    pub fn send(&self, message: &ClientMessage) -> Result<()> {
        self.send_frame(message.to_frame()?)
    }

    /// Queues a chunk of input audio as a binary frame.
    pub fn send_audio(&self, data: impl Into<Bytes>) -> Result<()> {
        self.send_frame(Message::Binary(data.into()))
    }

    /// Queues a single `KeepAlive`, independent of the periodic task.
    pub fn keep_alive(&self) -> Result<()> {
        self.send(&ClientMessage::KeepAlive)
    }

    fn send_frame(&self, frame: Message) -> Result<()> {
        let outgoing = self.outgoing.as_ref().ok_or(AgentError::NotConnected)?;
        if !self.open.load(Ordering::SeqCst) {
            return Err(AgentError::NotConnected);
        }
        outgoing.send(frame).map_err(|_| AgentError::NotConnected)
    }

    /// Stops the keep-alive, closes the socket and waits for the I/O tasks.
    ///
    /// Finishing a connection that never started is a no-op.
    pub async fn finish(&mut self) -> Result<()> {
        if let Some(keep_alive) = self.keep_alive.take() {
            keep_alive.stop().await;
        }

        if let Some(outgoing) = self.outgoing.take() {
            // The writer may already be gone if the agent hung up first.
            let _ = outgoing.send(Message::Close(None));
        }

        if let Some(mut reader) = self.reader.take() {
            if timeout(CLOSE_TIMEOUT, &mut reader).await.is_err() {
                warn!("Agent did not acknowledge close in time; aborting connection");
                reader.abort();
            }
        }
        if let Some(writer) = self.writer.take() {
            writer.abort();
        }
        self.open.store(false, Ordering::SeqCst);

        info!("Connection finished");
        Ok(())
    }
}

/// Builds the upgrade request with the token and any custom headers.
fn build_request(options: &ClientOptions) -> Result<Request> {
    let mut request = options.agent_url().into_client_request()?;
    let headers = request.headers_mut();
    for (name, value) in options.headers() {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AgentError::InvalidHeader(name.clone(), e.to_string()))?;
        let header_value = HeaderValue::from_str(&value)
            .map_err(|e| AgentError::InvalidHeader(name.clone(), e.to_string()))?;
        headers.insert(header_name, header_value);
    }
    Ok(request)
}

/// Drains the outgoing queue into the socket.
///
/// Stops after the first close frame. When every sender is gone without one,
/// closes the socket itself.
async fn run_writer(
    mut ws_tx: SplitSink<WsStream, Message>,
    mut outgoing: mpsc::UnboundedReceiver<Message>,
    events: mpsc::Sender<AgentEvent>,
) {
    while let Some(frame) = outgoing.recv().await {
        let is_close = matches!(frame, Message::Close(_));
        if let Err(e) = ws_tx.send(frame).await {
            error!(error = %e, "Failed to send WebSocket frame");
            let _ = events.send(AgentEvent::TransportError(e.to_string())).await;
            return;
        }
        if is_close {
            debug!("Sent close frame");
            return;
        }
    }

    let _ = ws_tx.send(Message::Close(None)).await;
}

/// Turns socket frames into events until the agent closes the connection.
///
/// On exit it marks the session closed and stops the writer, so later sends
/// fail with [`AgentError::NotConnected`].
async fn run_reader(
    mut ws_rx: SplitStream<WsStream>,
    events: mpsc::Sender<AgentEvent>,
    open: Arc<AtomicBool>,
    writer: AbortHandle,
) {
    let last = loop {
        match ws_rx.next().await {
            Some(Ok(Message::Text(text))) => {
                let _ = events.send(AgentEvent::from_text(text.as_str())).await;
            }
            Some(Ok(Message::Binary(data))) => {
                let _ = events.send(AgentEvent::AudioData(data)).await;
            }
            Some(Ok(Message::Close(frame))) => {
                info!(?frame, "Agent closed the connection");
                break AgentEvent::Close(frame.map(CloseReason::from));
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                error!(error = %e, "Error reading from agent WebSocket");
                break AgentEvent::TransportError(e.to_string());
            }
            None => {
                info!("Agent WebSocket stream ended");
                break AgentEvent::Close(None);
            }
        }
    };

    open.store(false, Ordering::SeqCst);
    writer.abort();
    let _ = events.send(last).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Arc<ClientOptions> {
        Arc::new(
            ClientOptions::new("test-key")
                .unwrap()
                .with_agent_url("ws://127.0.0.1:9/v1/agent/converse")
                .with_header("X-Session", "demo"),
        )
    }

    #[test]
    fn test_build_request_sets_headers() {
        let request = build_request(&options()).unwrap();

        assert_eq!(request.uri().path(), "/v1/agent/converse");
        assert_eq!(request.headers()["authorization"], "Token test-key");
        assert_eq!(request.headers()["x-session"], "demo");
    }

    #[test]
    fn test_build_request_rejects_bad_header() {
        let options = ClientOptions::new("test-key")
            .unwrap()
            .with_header("Bad Header", "x");

        let err = build_request(&options).unwrap_err();
        assert!(matches!(err, AgentError::InvalidHeader(name, _) if name == "Bad Header"));
    }

    #[tokio::test]
    async fn test_send_before_start_fails() {
        let connection = AgentConnection::new(options());

        assert!(!connection.is_started());
        assert!(matches!(
            connection.send_audio(vec![0u8; 4]),
            Err(AgentError::NotConnected)
        ));
        assert!(matches!(
            connection.keep_alive(),
            Err(AgentError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_finish_without_start_is_noop() {
        let mut connection = AgentConnection::new(options());
        connection.finish().await.unwrap();
        assert!(!connection.is_started());
    }
}
