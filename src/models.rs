//! Core data models used throughout the tutor.
//!
//! These types represent the knowledge items extracted from notes and the
//! conversation turns that flow through a quiz session.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// One extracted case or legal principle.
///
/// `name` is the deduplication key. Every other key the extraction
/// produced (`facts`, `ratio`, `commentary` and anything else) is kept in
/// `fields` exactly as the model returned it, nulls and lists included,
/// and written back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    #[serde(default, deserialize_with = "name_or_empty")]
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

pub const FACTS: &str = "facts";
pub const RATIO: &str = "ratio";
pub const COMMENTARY: &str = "commentary";

fn name_or_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl KnowledgeItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_facts(self, facts: impl Into<Value>) -> Self {
        self.with_field(FACTS, facts)
    }

    pub fn with_ratio(self, ratio: impl Into<Value>) -> Self {
        self.with_field(RATIO, ratio)
    }

    pub fn with_commentary(self, commentary: impl Into<Value>) -> Self {
        self.with_field(COMMENTARY, commentary)
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn facts(&self) -> Option<&Value> {
        self.field(FACTS)
    }

    pub fn ratio(&self) -> Option<&Value> {
        self.field(RATIO)
    }

    pub fn commentary(&self) -> Option<&Value> {
        self.field(COMMENTARY)
    }

    /// A field as display text. Strings come back as-is, lists of strings
    /// are joined with `"; "`, null reads as absent and anything else is
    /// rendered as JSON.
    pub fn field_text(&self, key: &str) -> Option<String> {
        match self.field(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Array(values) => Some(
                values
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            other => Some(other.to_string()),
        }
    }

    /// The deduplication key: `name` with surrounding whitespace removed.
    pub fn key(&self) -> &str {
        self.name.trim()
    }

    /// JSON rendering used as prompt context.
    pub fn to_context(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.name.clone())
    }
}

/// Who produced a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Assistant => write!(f, "assistant"),
            Role::User => write!(f, "user"),
        }
    }
}

/// One entry in the conversation transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizTurn {
    pub role: Role,
    pub content: String,
    /// Synthesized speech for assistant turns, when available.
    pub audio: Option<Vec<u8>>,
    pub at: DateTime<Utc>,
}

impl QuizTurn {
    pub fn assistant(content: impl Into<String>, audio: Option<Vec<u8>>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            audio,
            at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            audio: None,
            at: Utc::now(),
        }
    }
}

/// A recorded answer to be transcribed.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_for(&file_name).to_string();
        Self {
            bytes,
            file_name,
            mime_type,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read audio file: {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "answer.wav".to_string());
        Ok(Self::new(bytes, file_name))
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" | "mpga" | "mpeg" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "webm" => "audio/webm",
        "flac" => "audio/flac",
        _ => "audio/wav",
    }
}
