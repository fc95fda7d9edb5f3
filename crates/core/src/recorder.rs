//! Accumulates agent audio and writes one numbered WAV file per agent turn.

use crate::wav::{self, WavSpec};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Buffers received audio until the agent signals the end of its turn.
///
/// Each [`flush`](AudioRecorder::flush) writes `output-{n}.wav` into the output
/// directory, resets the buffer, and advances `n`.
#[derive(Debug)]
pub struct AudioRecorder {
    output_dir: PathBuf,
    spec: WavSpec,
    buffer: Vec<u8>,
    file_counter: usize,
}

impl AudioRecorder {
    pub fn new(output_dir: impl Into<PathBuf>, spec: WavSpec) -> Self {
        Self {
            output_dir: output_dir.into(),
            spec,
            buffer: Vec::new(),
            file_counter: 0,
        }
    }

    /// Appends a chunk of received audio to the pending turn.
    pub fn append(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
        debug!(chunk = data.len(), buffered = self.buffer.len(), "Buffered agent audio");
    }

    /// Number of bytes waiting for the next flush.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Number of files written so far.
    pub fn files_written(&self) -> usize {
        self.file_counter
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes the pending audio behind a fresh header and starts a new turn.
    ///
    /// A file is written even when nothing was buffered.
    pub async fn flush(&mut self) -> Result<PathBuf> {
        let path = self
            .output_dir
            .join(format!("output-{}.wav", self.file_counter));

        let mut contents = Vec::with_capacity(wav::HEADER_LEN + self.buffer.len());
        contents.extend_from_slice(&wav::header(&self.spec)?);
        contents.extend_from_slice(&self.buffer);

        tokio::fs::write(&path, &contents)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(path = %path.display(), bytes = self.buffer.len(), "Wrote agent audio");
        self.buffer.clear();
        self.file_counter += 1;
        Ok(path)
    }
}
