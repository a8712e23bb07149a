//! Interactive terminal quiz (`tutor quiz`).
//!
//! Reads one command or answer per line and drives the
//! [`SessionController`]. Input is any async line source so the loop can
//! be driven from a byte buffer in tests.
//!
//! | Input | Effect |
//! |-------|--------|
//! | blank, `start`, `next` | ask a question (start or next, by phase) |
//! | `:skip` | answer with the fixed "don't know" text |
//! | `:audio <path>` | answer with a recorded audio file |
//! | `:quit` | leave the session |
//! | anything else | typed answer |

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use uuid::Uuid;

use crate::config::Config;
use crate::knowledge::load_knowledge_base;
use crate::models::{AudioClip, Role};
use crate::quiz::QuizEngine;
use crate::session::{Answer, Phase, Rejection, SessionController, SessionState, StepOutcome};
use crate::traits::Capabilities;
use crate::transcript::export_transcript;
use crate::voice::VoiceHandler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizCommand {
    Advance,
    Skip,
    Audio(PathBuf),
    Quit,
    Answer(String),
}

pub fn parse_command(line: &str) -> QuizCommand {
    let line = line.trim();
    match line {
        "" | "start" | "next" => QuizCommand::Advance,
        ":skip" => QuizCommand::Skip,
        ":quit" | ":q" => QuizCommand::Quit,
        _ => match line.strip_prefix(":audio") {
            Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
                QuizCommand::Audio(PathBuf::from(rest.trim()))
            }
            _ => QuizCommand::Answer(line.to_string()),
        },
    }
}

/// Run the quiz loop until `:quit` or end of input.
///
/// Returns the final session state.
pub async fn run_quiz<R>(
    config: &Config,
    caps: &Capabilities,
    input: R,
    transcript_path: Option<&Path>,
) -> Result<SessionState>
where
    R: AsyncBufRead + Unpin,
{
    let knowledge_base = load_knowledge_base(&config.knowledge.path)?;
    let mut state = SessionState::new(knowledge_base);

    if state.knowledge_base().is_empty() {
        println!("No knowledge base found. Run `tutor parse` first.");
        return Ok(state);
    }
    if caps.llm.is_none() {
        println!("OPENAI_API_KEY not set: questions and evaluation are unavailable.");
        return Ok(state);
    }

    let controller = SessionController::new(
        QuizEngine::new(caps.llm.clone(), &config.llm),
        VoiceHandler::from_capabilities(caps, config.speech.voice.clone()),
    );
    let session_id = Uuid::new_v4();
    let mut saved_audio = 0usize;

    println!(
        "Quiz over {} items. Enter to start, :skip, :audio <path>, :quit.",
        state.knowledge_base().len()
    );

    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "could not read input; ending session");
                break;
            }
        };
        let turns_before = state.transcript().len();

        let (next_state, outcome) = match parse_command(&line) {
            QuizCommand::Quit => break,
            QuizCommand::Advance => controller.advance(state).await,
            QuizCommand::Skip => controller.skip(state).await,
            QuizCommand::Answer(text) => controller.answer(state, Answer::Text(text)).await,
            QuizCommand::Audio(path) => match AudioClip::from_file(&path) {
                Ok(clip) => controller.answer(state, Answer::Audio(clip)).await,
                Err(e) => {
                    println!("  {:#}", e);
                    continue;
                }
            },
        };
        state = next_state;

        report(&outcome, state.phase());

        if let Some(dir) = &config.speech.output_dir {
            for turn in &state.transcript()[turns_before..] {
                let Some(audio) = &turn.audio else { continue };
                if turn.role != Role::Assistant {
                    continue;
                }
                saved_audio += 1;
                match save_audio(dir, session_id, saved_audio, audio) {
                    Ok(path) => println!("  (audio: {})", path.display()),
                    Err(e) => tracing::warn!(error = %e, "could not save audio"),
                }
            }
        }
    }

    if let Some(path) = transcript_path {
        export_transcript(path, state.transcript())?;
        println!(
            "Transcript ({} turns) written to {}",
            state.transcript().len(),
            path.display()
        );
    }

    Ok(state)
}

fn report(outcome: &StepOutcome, phase: Phase) {
    match outcome {
        StepOutcome::Asked { question } => {
            println!();
            println!("Tutor: {}", question);
        }
        StepOutcome::Evaluated { answer, feedback } => {
            println!("You:   {}", answer);
            println!("Tutor: {}", feedback);
            println!();
            println!("(Enter for the next question)");
        }
        StepOutcome::Rejected(Rejection::WrongPhase(Phase::AwaitingAnswer)) => {
            println!("  Answer the question first, or :skip.");
        }
        StepOutcome::Rejected(Rejection::EmptyAnswer) if phase == Phase::AwaitingAnswer => {
            println!("  Answer the question first, or :skip.");
        }
        StepOutcome::Rejected(Rejection::WrongPhase(_)) => {
            println!("  No question yet. Press Enter to start.");
        }
        StepOutcome::Rejected(rejection) => {
            println!("  {}", rejection);
        }
    }
}

fn save_audio(dir: &Path, session: Uuid, n: usize, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    let path = dir.join(format!("{}-{}.mp3", session, n));
    std::fs::write(&path, bytes)
        .with_context(|| format!("Failed to write audio: {}", path.display()))?;
    Ok(path)
}
