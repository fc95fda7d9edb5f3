//! Reads the WAV file to upload and cuts it into fixed-size frames.

use anyhow::{Context, Result};
use bytes::{Bytes, BytesMut};
use std::{fmt, path::PathBuf, time::Duration};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};
use voice_agent_core::wav::HEADER_LEN;

const FILE_READ_BUFFER: usize = 64 * 1024;

/// Where the uploaded audio comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Url(String),
    File(PathBuf),
}

impl AudioSource {
    /// `http://` and `https://` locations are fetched, anything else is a path.
    pub fn parse(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Drops the source's WAV header and regroups the rest into `chunk_size` frames.
#[derive(Debug)]
pub struct WavChunker {
    header_remaining: usize,
    chunk_size: usize,
    pending: BytesMut,
}

impl WavChunker {
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            header_remaining: HEADER_LEN,
            chunk_size,
            pending: BytesMut::with_capacity(chunk_size),
        }
    }

    /// Feeds raw file bytes and returns every frame that is now complete.
    pub fn push(&mut self, mut data: &[u8]) -> Vec<Bytes> {
        if self.header_remaining > 0 {
            let skipped = self.header_remaining.min(data.len());
            self.header_remaining -= skipped;
            data = &data[skipped..];
        }
        self.pending.extend_from_slice(data);

        let mut chunks = Vec::with_capacity(self.pending.len() / self.chunk_size);
        while self.pending.len() >= self.chunk_size {
            chunks.push(self.pending.split_to(self.chunk_size).freeze());
        }
        chunks
    }

    /// The trailing partial frame, if any.
    pub fn finish(self) -> Option<Bytes> {
        (!self.pending.is_empty()).then(|| self.pending.freeze())
    }
}

/// Totals for one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamStats {
    pub chunks: usize,
    pub bytes: usize,
}

/// Streams `source` through a [`WavChunker`], handing each frame to `send`
/// and pausing `delay` after it.
pub async fn stream_audio<F>(
    source: &AudioSource,
    chunk_size: usize,
    delay: Duration,
    mut send: F,
) -> Result<StreamStats>
where
    F: FnMut(Bytes) -> Result<()>,
{
    let mut chunker = WavChunker::new(chunk_size);
    let mut stats = StreamStats::default();

    match source {
        AudioSource::Url(url) => {
            let mut response = reqwest::get(url)
                .await
                .with_context(|| format!("Failed to download {url}"))?
                .error_for_status()?;
            while let Some(data) = response.chunk().await? {
                for chunk in chunker.push(&data) {
                    send_chunk(&mut send, chunk, delay, &mut stats).await?;
                }
            }
        }
        AudioSource::File(path) => {
            let mut file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let mut buf = vec![0u8; FILE_READ_BUFFER];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                for chunk in chunker.push(&buf[..n]) {
                    send_chunk(&mut send, chunk, delay, &mut stats).await?;
                }
            }
        }
    }

    if let Some(last) = chunker.finish() {
        send_chunk(&mut send, last, delay, &mut stats).await?;
    }

    info!(chunks = stats.chunks, bytes = stats.bytes, "Finished streaming audio");
    Ok(stats)
}

async fn send_chunk<F>(
    send: &mut F,
    chunk: Bytes,
    delay: Duration,
    stats: &mut StreamStats,
) -> Result<()>
where
    F: FnMut(Bytes) -> Result<()>,
{
    stats.chunks += 1;
    stats.bytes += chunk.len();
    debug!(len = chunk.len(), "Sending audio chunk");
    send(chunk)?;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    Ok(())
}
