//! Periodic `KeepAlive` emission on a connection's outgoing queue.

use crate::protocol::ClientMessage;
use std::time::Duration;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{Instant, interval_at},
};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

/// How often a keep-alive is sent while the session is open.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(5);

/// Owns the background task that enqueues a `KeepAlive` every interval.
///
/// Sending is fire-and-forget: nothing is awaited from the agent and a failed
/// enqueue is only logged. The task ends on [`stop`](KeepAlive::stop) or when
/// the handle is dropped.
#[derive(Debug)]
pub struct KeepAlive {
    handle: JoinHandle<()>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl KeepAlive {
    /// Starts the task. The first keep-alive goes out one `interval` from now.
    pub fn spawn(outgoing: mpsc::UnboundedSender<Message>, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        debug!("Keep alive!");
                        match ClientMessage::KeepAlive.to_frame() {
                            Ok(frame) => {
                                if outgoing.send(frame).is_err() {
                                    debug!("Keep-alive not delivered: connection is closed");
                                }
                            }
                            Err(e) => warn!(error = %e, "Failed to encode keep-alive"),
                        }
                    }
                }
            }
            debug!("Keep-alive task stopped");
        });

        Self {
            handle,
            shutdown: Some(shutdown_tx),
        }
    }

    /// Signals the task to stop and waits for it to exit.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = (&mut self.handle).await;
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
