//! Transcript files: the messages and status updates shown on startup

use anyhow::{Context, Result};
use chatview_core::ChatMessage;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Status log entries, oldest first
    #[serde(default)]
    pub status_updates: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptFile {
    Messages(Vec<ChatMessage>),
    Full(Transcript),
}

/// Read a transcript; either a bare message array or `{messages, statusUpdates}`
pub fn load_transcript(path: &Path) -> Result<Transcript> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript {}", path.display()))?;
    let transcript = match serde_json::from_str(&raw)
        .with_context(|| format!("Invalid transcript {}", path.display()))?
    {
        TranscriptFile::Messages(messages) => Transcript {
            messages,
            status_updates: Vec::new(),
        },
        TranscriptFile::Full(transcript) => transcript,
    };
    info!(
        messages = transcript.messages.len(),
        statuses = transcript.status_updates.len(),
        "loaded transcript"
    );
    Ok(transcript)
}
