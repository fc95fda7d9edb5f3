//! Append-only text log of session events.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// File name used when the log lives in an output directory.
pub const CHATLOG_FILE: &str = "chatlog.txt";

/// Appends one record per line to a text file, creating it on first write.
#[derive(Debug, Clone)]
pub struct ChatLog {
    path: PathBuf,
}

impl ChatLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A log named [`CHATLOG_FILE`] inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CHATLOG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `"{label}: {record}"`.
    pub async fn record(&self, label: &str, record: impl std::fmt::Display) -> Result<()> {
        self.append_line(&format!("{label}: {record}")).await
    }

    /// Appends `value` serialized as a single JSON line.
    pub async fn record_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let line = serde_json::to_string(value).context("Failed to serialize chat log record")?;
        self.append_line(&line).await
    }

    async fn append_line(&self, line: &str) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.write_all(format!("{line}\n").as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_records_append_in_order() {
        let dir = tempdir().unwrap();
        let log = ChatLog::in_dir(dir.path());

        log.record("Welcome message", "abc-123").await.unwrap();
        log.record_json(&json!({"role": "user", "content": "hi"}))
            .await
            .unwrap();
        log.record("Connection closed", 1000).await.unwrap();

        let contents = std::fs::read_to_string(dir.path().join(CHATLOG_FILE)).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Welcome message: abc-123",
                r#"{"content":"hi","role":"user"}"#,
                "Connection closed: 1000",
            ]
        );
    }

    #[tokio::test]
    async fn test_existing_log_is_not_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.log");
        std::fs::write(&path, "earlier run\n").unwrap();

        let log = ChatLog::new(&path);
        log.record("Agent Thinking", "hmm").await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "earlier run\nAgent Thinking: hmm\n");
    }
}
