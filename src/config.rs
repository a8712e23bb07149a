//! TOML configuration.
//!
//! Every section and field has a default, so a missing config file is not
//! an error: [`load_config`] falls back to [`Config::minimal`]. Credentials
//! are never read from the file; see [`Credentials`].

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the language-model / transcription key.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable holding the speech-synthesis key.
pub const ELEVENLABS_API_KEY_VAR: &str = "ELEVENLABS_API_KEY";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub notes: NotesConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotesConfig {
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            raw_dir: default_raw_dir(),
            recursive: false,
            exclude_globs: Vec::new(),
        }
    }
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("data/raw")
}

#[derive(Debug, Deserialize, Clone)]
pub struct KnowledgeConfig {
    #[serde(default = "default_knowledge_path")]
    pub path: PathBuf,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: default_knowledge_path(),
        }
    }
}

fn default_knowledge_path() -> PathBuf {
    PathBuf::from("data/processed/knowledge_base.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
        }
    }
}

fn default_max_chars() -> usize {
    crate::chunk::DEFAULT_MAX_CHARS
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    #[serde(default = "default_extraction_temperature")]
    pub temperature: f32,
    /// Number of chunks extracted concurrently. Results are still merged
    /// in file-then-chunk order.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            temperature: default_extraction_temperature(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_extraction_temperature() -> f32 {
    0.1
}
fn default_concurrency() -> usize {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_question_temperature")]
    pub question_temperature: f32,
    #[serde(default = "default_evaluation_temperature")]
    pub evaluation_temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_llm_model(),
            question_temperature: default_question_temperature(),
            evaluation_temperature: default_evaluation_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_question_temperature() -> f32 {
    0.7
}
fn default_evaluation_temperature() -> f32 {
    0.5
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranscriptionConfig {
    #[serde(default = "default_transcription_model")]
    pub model: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: default_transcription_model(),
        }
    }
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpeechConfig {
    #[serde(default = "default_elevenlabs_base_url")]
    pub base_url: String,
    /// ElevenLabs voice id.
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_speech_model")]
    pub model: String,
    /// Directory synthesized audio is written to during `tutor quiz`.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: default_elevenlabs_base_url(),
            voice: default_voice(),
            model: default_speech_model(),
            output_dir: None,
        }
    }
}

fn default_elevenlabs_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}
/// ElevenLabs premade voice "Rachel".
fn default_voice() -> String {
    "21m00Tcm4TlvDq8ikWAM".to_string()
}
fn default_speech_model() -> String {
    "eleven_monolingual_v1".to_string()
}

impl Config {
    /// All-defaults configuration, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

/// API keys taken from the environment. Each is optional: a missing key
/// disables the capabilities that need it.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: read_key(OPENAI_API_KEY_VAR),
            elevenlabs_api_key: read_key(ELEVENLABS_API_KEY_VAR),
        }
    }
}

fn read_key(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::minimal());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.chunking.max_chars == 0 {
        anyhow::bail!("chunking.max_chars must be > 0");
    }

    if config.extraction.concurrency == 0 {
        anyhow::bail!("extraction.concurrency must be >= 1");
    }

    let temperatures = [
        ("extraction.temperature", config.extraction.temperature),
        ("llm.question_temperature", config.llm.question_temperature),
        ("llm.evaluation_temperature", config.llm.evaluation_temperature),
    ];
    for (key, value) in temperatures {
        if !(0.0..=2.0).contains(&value) {
            anyhow::bail!("{} must be in [0.0, 2.0]", key);
        }
    }

    if config.speech.voice.trim().is_empty() {
        anyhow::bail!("speech.voice must not be empty");
    }

    for pattern in &config.notes.exclude_globs {
        globset::Glob::new(pattern)
            .with_context(|| format!("notes.exclude_globs: invalid pattern {:?}", pattern))?;
    }

    Ok(())
}
