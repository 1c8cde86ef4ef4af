//! Append-only JSONL transcripts.
//!
//! Each session gets a `<session_key>.jsonl` file under the state directory
//! and every message is one JSON line. Reads go through an in-memory
//! write-through cache; file I/O runs on the blocking pool.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use sq_domain::error::{Error, Result};
use sq_domain::tool::Message;

use crate::session_key::validate_session_key;
use crate::store::{emit_append, sort_recent_first, ConversationStore, SessionSummary};

/// One transcript line: the message plus when it was stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub message: Message,
}

pub struct FileStore {
    base_dir: PathBuf,
    cache: RwLock<HashMap<String, Vec<TranscriptLine>>>,
}

impl FileStore {
    /// Open (creating if needed) the transcript directory.
    pub fn new(base_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(base_dir)?;
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            cache: RwLock::new(HashMap::new()),
        })
    }

    fn path_for(&self, session_key: &str) -> Result<PathBuf> {
        validate_session_key(session_key)?;
        Ok(self.base_dir.join(format!("{session_key}.jsonl")))
    }

    /// Cached lines for a session, loading from disk on first access.
    async fn lines(&self, session_key: &str) -> Result<Vec<TranscriptLine>> {
        if let Some(lines) = self.cache.read().get(session_key) {
            return Ok(lines.clone());
        }

        let path = self.path_for(session_key)?;
        let sid = session_key.to_owned();
        let loaded = tokio::task::spawn_blocking(move || read_jsonl_file(&path, &sid))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))??;

        // Unknown sessions stay out of the cache until their first append.
        let Some(lines) = loaded else {
            return Ok(Vec::new());
        };
        self.cache
            .write()
            .entry(session_key.to_owned())
            .or_insert_with(|| lines.clone());
        Ok(lines)
    }
}

#[async_trait::async_trait]
impl ConversationStore for FileStore {
    async fn history(&self, session_key: &str) -> Result<Vec<Message>> {
        Ok(self
            .lines(session_key)
            .await?
            .into_iter()
            .map(|l| l.message)
            .collect())
    }

    async fn append(&self, session_key: &str, messages: &[Message]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }

        // Warm the cache first so lines written by an earlier process are
        // not shadowed by a cache entry holding only the new lines.
        let existing = self.lines(session_key).await?.len();

        let now = Utc::now();
        let new_lines: Vec<TranscriptLine> = messages
            .iter()
            .map(|m| TranscriptLine {
                timestamp: now,
                message: m.clone(),
            })
            .collect();
        let buf = serialize_lines(&new_lines)?;
        let path = self.path_for(session_key)?;

        // Disk first; the cache only changes once the write succeeded.
        tokio::task::spawn_blocking(move || {
            use std::io::Write;
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            file.write_all(buf.as_bytes())?;
            file.sync_data()?;
            Ok::<(), Error>(())
        })
        .await
        .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))??;

        self.cache
            .write()
            .entry(session_key.to_owned())
            .or_default()
            .extend(new_lines);

        emit_append(session_key, messages.len(), existing == 0);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionSummary>> {
        let dir = self.base_dir.clone();
        let keys = tokio::task::spawn_blocking(move || list_transcript_keys(&dir))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))??;

        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let lines = self.lines(&key).await?;
            let (Some(first), Some(last)) = (lines.first(), lines.last()) else {
                continue;
            };
            out.push(SessionSummary {
                session_key: key,
                message_count: lines.len(),
                created_at: first.timestamp,
                updated_at: last.timestamp,
            });
        }
        sort_recent_first(&mut out);
        Ok(out)
    }
}

// ── File helpers ───────────────────────────────────────────────────

fn serialize_lines(lines: &[TranscriptLine]) -> Result<String> {
    let mut buf = String::new();
    for line in lines {
        buf.push_str(&serde_json::to_string(line)?);
        buf.push('\n');
    }
    Ok(buf)
}

/// `None` when the session has no transcript file yet.
fn read_jsonl_file(path: &Path, session_key: &str) -> Result<Option<Vec<TranscriptLine>>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path)?;
    let mut lines = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<TranscriptLine>(line) {
            Ok(tl) => lines.push(tl),
            Err(e) => {
                tracing::warn!(
                    session_key = session_key,
                    error = %e,
                    "skipping malformed transcript line"
                );
            }
        }
    }
    Ok(Some(lines))
}

fn list_transcript_keys(dir: &Path) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if validate_session_key(stem).is_ok() {
                keys.push(stem.to_owned());
            }
        }
    }
    Ok(keys)
}
