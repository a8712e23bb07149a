//! # Recall Tutor
//!
//! Turns unstructured study notes into a knowledge base of cases and
//! principles, then quizzes you on it by text or voice.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌───────────┐   ┌───────────┐   ┌──────────┐
//! │  Reader  │──▶│ Chunker │──▶│ Extractor │──▶│ Aggregate │──▶│ KB (JSON)│
//! │ txt/md/  │   │ ¶ aware │   │   (LLM)   │   │ first wins│   └────┬─────┘
//! │  docx    │   └─────────┘   └───────────┘   └───────────┘        │
//! └──────────┘                                                      ▼
//!                     ┌───────────────────┐                  ┌────────────┐
//!                     │ SessionController │◀────────────────▶│ QuizEngine │
//!                     │  transcript, TTS, │                  │   (LLM)    │
//!                     │   transcription   │                  └────────────┘
//!                     └───────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export OPENAI_API_KEY=...        # questions, grading, transcription
//! export ELEVENLABS_API_KEY=...    # optional spoken questions/feedback
//! tutor parse                      # notes in data/raw -> knowledge base
//! tutor list                       # what was extracted
//! tutor quiz --transcript out.json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment credentials |
//! | [`models`] | Knowledge items, transcript turns, audio clips |
//! | [`reader`] | Notes directory scan and file reading |
//! | [`extract`] | Text extraction from `.docx` |
//! | [`chunk`] | Paragraph-aware chunking |
//! | [`error`] | Capability client errors |
//! | [`traits`] | Capability interfaces and the capability bundle |
//! | [`openai`] | Chat completion and transcription client |
//! | [`elevenlabs`] | Speech synthesis client |
//! | [`extractor`] | Knowledge-item extraction from chunks |
//! | [`knowledge`] | Deduplication and the knowledge-base file |
//! | [`ingest`] | The `parse` pipeline |
//! | [`quiz`] | Question generation and answer evaluation |
//! | [`voice`] | Best-effort speech and transcription |
//! | [`session`] | Quiz session state machine |
//! | [`quiz_cmd`] | Interactive terminal quiz |
//! | [`status`] | `status` and `list` commands |
//! | [`transcript`] | Transcript export |

pub mod chunk;
pub mod config;
pub mod elevenlabs;
pub mod error;
pub mod extract;
pub mod extractor;
pub mod ingest;
pub mod knowledge;
pub mod models;
pub mod openai;
pub mod quiz;
pub mod quiz_cmd;
pub mod reader;
pub mod session;
pub mod status;
pub mod traits;
pub mod transcript;
pub mod voice;
