//! Turn state machine
//!
//! A turn is one user message and the streamed response to it. The machine is
//! pure: it folds wire events into step and answer state and reports what
//! changed, leaving persistence and notification to the caller.

use advisor_wire::WireEvent;
use serde::{Deserialize, Serialize};

use crate::{
    answer::AnswerAccumulator,
    steps::{StepTracker, ThinkingStep},
};

/// Where a turn is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    #[default]
    Idle,
    AwaitingFirstEvent,
    Thinking,
    Answering,
    Completed,
    Aborted,
    Failed,
}

impl TurnPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TurnPhase::Completed | TurnPhase::Aborted | TurnPhase::Failed
        )
    }
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "reason", rename_all = "snake_case")]
pub enum TurnOutcome {
    Completed,
    Aborted,
    Failed(String),
}

impl TurnOutcome {
    pub fn phase(&self) -> TurnPhase {
        match self {
            TurnOutcome::Completed => TurnPhase::Completed,
            TurnOutcome::Aborted => TurnPhase::Aborted,
            TurnOutcome::Failed(_) => TurnPhase::Failed,
        }
    }
}

/// State change produced by one wire event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnUpdate {
    /// The thinking step list changed
    Steps(Vec<ThinkingStep>),
    /// The assistant message now reads `content`. `first` is set on the
    /// fragment that starts the answer, which also clears the steps.
    Answer {
        message_id: String,
        content: String,
        first: bool,
    },
    /// Nothing to apply
    Ignored,
}

/// One in-flight turn for a conversation
#[derive(Debug)]
pub struct Turn {
    conversation_id: String,
    phase: TurnPhase,
    steps: StepTracker,
    answer: AnswerAccumulator,
}

impl Turn {
    /// Begin a turn; the request has been sent and nothing has arrived yet
    pub fn start(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            phase: TurnPhase::AwaitingFirstEvent,
            steps: StepTracker::new(),
            answer: AnswerAccumulator::new(),
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn steps(&self) -> &[ThinkingStep] {
        self.steps.steps()
    }

    /// Id of the assistant message, once the answer has started
    pub fn answer_message_id(&self) -> Option<&str> {
        self.answer
            .is_started()
            .then(|| self.answer.message_id())
    }

    pub fn answer(&self) -> &str {
        self.answer.content()
    }

    /// Fold one event into the turn
    pub fn apply(&mut self, event: WireEvent, now_ms: i64) -> TurnUpdate {
        match (self.phase, event) {
            (phase, _) if phase.is_terminal() || phase == TurnPhase::Idle => TurnUpdate::Ignored,

            (TurnPhase::Answering, WireEvent::Status(step)) => {
                tracing::debug!(step = %step.step, "ignoring status event after answer started");
                TurnUpdate::Ignored
            }

            (_, WireEvent::Status(step)) => {
                self.phase = TurnPhase::Thinking;
                self.steps.apply(&step, now_ms);
                TurnUpdate::Steps(self.steps.snapshot())
            }

            (phase, WireEvent::Answer(fragment)) => {
                let first = phase != TurnPhase::Answering;
                if first {
                    self.steps.clear();
                    self.phase = TurnPhase::Answering;
                }
                let content = self.answer.push(&fragment).to_string();
                TurnUpdate::Answer {
                    message_id: self.answer.message_id().to_string(),
                    content,
                    first,
                }
            }
        }
    }

    /// The stream closed normally
    pub fn complete(&mut self) -> TurnOutcome {
        self.finish(TurnOutcome::Completed)
    }

    /// The turn was cancelled; accumulated content is kept
    pub fn abort(&mut self) -> TurnOutcome {
        self.finish(TurnOutcome::Aborted)
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> TurnOutcome {
        self.finish(TurnOutcome::Failed(reason.into()))
    }

    fn finish(&mut self, outcome: TurnOutcome) -> TurnOutcome {
        self.steps.clear();
        self.phase = outcome.phase();
        outcome
    }
}
