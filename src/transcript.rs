//! Transcript export.
//!
//! Writes the session transcript as a JSON array of
//! `{role, content, at, has_audio}` objects. Audio bytes are not exported.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use crate::models::{QuizTurn, Role};

#[derive(Debug, Serialize)]
struct ExportTurn<'a> {
    role: Role,
    content: &'a str,
    at: DateTime<Utc>,
    has_audio: bool,
}

impl<'a> From<&'a QuizTurn> for ExportTurn<'a> {
    fn from(turn: &'a QuizTurn) -> Self {
        Self {
            role: turn.role,
            content: &turn.content,
            at: turn.at,
            has_audio: turn.audio.is_some(),
        }
    }
}

pub fn transcript_json(turns: &[QuizTurn]) -> Result<String> {
    let export: Vec<ExportTurn> = turns.iter().map(ExportTurn::from).collect();
    Ok(serde_json::to_string_pretty(&export)?)
}

/// Write the transcript to `path`, creating parent directories.
pub fn export_transcript(path: &Path, turns: &[QuizTurn]) -> Result<()> {
    let json = transcript_json(turns)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write transcript: {}", path.display()))?;
    Ok(())
}
