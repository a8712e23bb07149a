//! Quiz session state machine.
//!
//! A session cycles between two states: waiting for the caller to ask for
//! a question, and waiting for an answer to the question just posed.
//!
//! ```text
//!              start                      next
//!  NotStarted ───────▶ AwaitingAnswer ◀─────────── FeedbackShown
//!                            │                           ▲
//!                            └──── answer / skip ────────┘
//! ```
//!
//! [`SessionState`] is a plain value. Every transition on
//! [`SessionController`] takes the state by value and hands back the next
//! state together with a [`StepOutcome`]. A rejected transition returns
//! the state untouched.
//!
//! Each posed question appends one assistant turn. Each evaluated answer
//! appends one user turn followed by one assistant turn.

use crate::models::{AudioClip, KnowledgeItem, QuizTurn};
use crate::quiz::{GeneratedQuestion, QuizEngine};
use crate::voice::VoiceHandler;

/// Answer text sent by the skip action.
pub const SKIP_ANSWER: &str = "I don't know, please explain.";

/// The question currently in play and the item it was generated from.
#[derive(Debug, Clone, PartialEq)]
pub struct PosedQuestion {
    pub question: String,
    pub item: KnowledgeItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No question has been asked yet.
    NotStarted,
    AwaitingAnswer,
    /// The last question has been answered and graded.
    FeedbackShown,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::NotStarted => write!(f, "not started"),
            Phase::AwaitingAnswer => write!(f, "awaiting answer"),
            Phase::FeedbackShown => write!(f, "feedback shown"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    transcript: Vec<QuizTurn>,
    current: Option<PosedQuestion>,
    awaiting_answer: bool,
    knowledge_base: Vec<KnowledgeItem>,
}

impl SessionState {
    pub fn new(knowledge_base: Vec<KnowledgeItem>) -> Self {
        Self {
            knowledge_base,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        if self.awaiting_answer {
            Phase::AwaitingAnswer
        } else if self.current.is_some() {
            Phase::FeedbackShown
        } else {
            Phase::NotStarted
        }
    }

    pub fn transcript(&self) -> &[QuizTurn] {
        &self.transcript
    }

    pub fn current(&self) -> Option<&PosedQuestion> {
        self.current.as_ref()
    }

    pub fn is_awaiting_answer(&self) -> bool {
        self.awaiting_answer
    }

    pub fn knowledge_base(&self) -> &[KnowledgeItem] {
        &self.knowledge_base
    }
}

/// A user's answer: typed text, or recorded audio to be transcribed.
#[derive(Debug, Clone)]
pub enum Answer {
    Text(String),
    Audio(AudioClip),
}

/// Why a transition did not happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The operation is not valid in this phase.
    WrongPhase(Phase),
    /// No language model, or an empty knowledge base.
    QuestionUnavailable,
    /// The model call failed; carries the error text.
    QuestionFailed(String),
    /// The resolved answer was empty.
    EmptyAnswer,
    /// The audio answer could not be transcribed.
    Transcription(String),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::WrongPhase(phase) => write!(f, "not allowed while {}", phase),
            Rejection::QuestionUnavailable => write!(
                f,
                "no question available (empty knowledge base or no language model)"
            ),
            Rejection::QuestionFailed(msg) => write!(f, "{}", msg),
            Rejection::EmptyAnswer => write!(f, "answer is empty"),
            Rejection::Transcription(msg) => write!(f, "could not transcribe answer: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// A question was posed.
    Asked { question: String },
    /// An answer was recorded and graded.
    Evaluated { answer: String, feedback: String },
    Rejected(Rejection),
}

pub struct SessionController {
    engine: QuizEngine,
    voice: VoiceHandler,
}

impl SessionController {
    pub fn new(engine: QuizEngine, voice: VoiceHandler) -> Self {
        Self { engine, voice }
    }

    /// Pose the first question of the session.
    pub async fn start(&self, state: SessionState) -> (SessionState, StepOutcome) {
        match state.phase() {
            Phase::NotStarted => self.ask(state).await,
            phase => (state, StepOutcome::Rejected(Rejection::WrongPhase(phase))),
        }
    }

    /// Pose the next question after feedback on the previous one.
    pub async fn next(&self, state: SessionState) -> (SessionState, StepOutcome) {
        match state.phase() {
            Phase::FeedbackShown => self.ask(state).await,
            phase => (state, StepOutcome::Rejected(Rejection::WrongPhase(phase))),
        }
    }

    /// `start` or `next`, whichever the current phase allows.
    pub async fn advance(&self, state: SessionState) -> (SessionState, StepOutcome) {
        match state.phase() {
            Phase::NotStarted => self.start(state).await,
            _ => self.next(state).await,
        }
    }

    pub async fn answer(&self, mut state: SessionState, answer: Answer) -> (SessionState, StepOutcome) {
        let posed = match state.current.clone() {
            Some(posed) if state.awaiting_answer => posed,
            _ => {
                let phase = state.phase();
                return (state, StepOutcome::Rejected(Rejection::WrongPhase(phase)));
            }
        };

        let text = match answer {
            Answer::Text(text) => text,
            Answer::Audio(clip) => match self.voice.transcribe(&clip).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(file = %clip.file_name, error = %e, "transcription failed; answer discarded");
                    return (state, StepOutcome::Rejected(Rejection::Transcription(e.to_string())));
                }
            },
        };
        let text = text.trim().to_string();
        if text.is_empty() {
            return (state, StepOutcome::Rejected(Rejection::EmptyAnswer));
        }

        state.transcript.push(QuizTurn::user(text.clone()));

        let feedback = self
            .engine
            .evaluate_answer(&posed.question, &text, &posed.item)
            .await;
        let audio = self.voice.speak(&feedback).await;
        state.transcript.push(QuizTurn::assistant(feedback.clone(), audio));
        state.awaiting_answer = false;

        (
            state,
            StepOutcome::Evaluated {
                answer: text,
                feedback,
            },
        )
    }

    /// Answer with [`SKIP_ANSWER`].
    pub async fn skip(&self, state: SessionState) -> (SessionState, StepOutcome) {
        self.answer(state, Answer::Text(SKIP_ANSWER.to_string())).await
    }

    async fn ask(&self, mut state: SessionState) -> (SessionState, StepOutcome) {
        match self.engine.generate_question(&state.knowledge_base).await {
            GeneratedQuestion::Posed { question, item } => {
                let audio = self.voice.speak(&question).await;
                state.transcript.push(QuizTurn::assistant(question.clone(), audio));
                state.current = Some(PosedQuestion {
                    question: question.clone(),
                    item,
                });
                state.awaiting_answer = true;
                tracing::debug!(turns = state.transcript.len(), "question posed");
                (state, StepOutcome::Asked { question })
            }
            GeneratedQuestion::Unavailable => {
                (state, StepOutcome::Rejected(Rejection::QuestionUnavailable))
            }
            GeneratedQuestion::Failed(msg) => {
                (state, StepOutcome::Rejected(Rejection::QuestionFailed(msg)))
            }
        }
    }
}
