//! Offline backend that plays a canned response

use std::time::Duration;

use advisor_wire::{ChatRequest, Error, Result, StepEvent, StepStatus, WireEvent, WireEventStream};
use async_stream::stream;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    title::title_question,
    transport::ChatTransport,
};

const GREETING: &str = "Namaste! I can help with questions about the laws of Nepal, \
the Constitution of Nepal 2072 and common legal procedures. What would you like to know?";

const COMPANY: &str = "To register a private limited company in Nepal you apply to the \
Office of the Company Registrar under the Companies Act 2063. You will need the \
memorandum and articles of association, citizenship copies of the promoters and the \
prescribed fee. Registration can be completed online through the OCR portal.";

const TENANCY: &str = "Tenancy in Nepal is governed mainly by the Muluki Civil Code 2074. \
A lease should be in writing, state the rent and the term, and the landlord must give \
notice before eviction except in the cases the Code allows.";

const FALLBACK: &str = "I am running in offline mode, so this is a sample answer. \
Under the Constitution of Nepal every citizen has the right to constitutional remedy \
before the Supreme Court and the High Courts.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Company,
    Tenancy,
    Greeting,
    Other,
}

fn topic(question: &str) -> Topic {
    let question = question.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| question.contains(w));

    if has(&["company", "register", "business"]) {
        Topic::Company
    } else if has(&["rent", "tenant", "lease", "landlord"]) {
        Topic::Tenancy
    } else if has(&["hello", "hi", "namaste"]) {
        Topic::Greeting
    } else {
        Topic::Other
    }
}

/// Pick the canned answer for a question
pub fn canned_answer(question: &str) -> &'static str {
    match topic(question) {
        Topic::Company => COMPANY,
        Topic::Tenancy => TENANCY,
        Topic::Greeting => GREETING,
        Topic::Other => FALLBACK,
    }
}

/// Pick the canned conversation title for a question
pub fn canned_title(question: &str) -> &'static str {
    match topic(question) {
        Topic::Company => "Company registration in Nepal",
        Topic::Tenancy => "Tenancy and rent",
        Topic::Greeting => "Getting started",
        Topic::Other => "Constitutional remedies",
    }
}

/// Split `text` into word fragments whose concatenation is `text`
pub fn word_fragments(text: &str) -> Vec<String> {
    let words: Vec<&str> = text.split(' ').collect();
    let last = words.len().saturating_sub(1);
    words
        .iter()
        .enumerate()
        .map(|(i, w)| if i == last { w.to_string() } else { format!("{} ", w) })
        .collect()
}

/// Transport that emits thinking steps and then streams a canned answer word by word
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    delay: Duration,
    answer: Option<String>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            delay: Duration::from_millis(50),
            answer: None,
        }
    }

    /// Pause between emitted events
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Always answer with `answer` instead of a canned reply
    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    fn script(&self, question: &str) -> Vec<WireEvent> {
        let answer = self
            .answer
            .clone()
            .unwrap_or_else(|| canned_answer(question).to_string());

        let mut events = vec![
            WireEvent::Status(StepEvent::new(
                "Understanding",
                StepStatus::Processing,
                "Understanding your question",
                "🤔",
            )),
            WireEvent::Status(StepEvent::new(
                "Understanding",
                StepStatus::Result,
                "Question understood",
                "🤔",
            )),
            WireEvent::Status(StepEvent::new(
                "Searching",
                StepStatus::Processing,
                "Searching legal sources",
                "🔎",
            )),
            WireEvent::Status(StepEvent::new(
                "Searching",
                StepStatus::Result,
                "Found relevant provisions",
                "🔎",
            )),
        ];
        events.extend(word_fragments(&answer).into_iter().map(WireEvent::Answer));
        events
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<WireEventStream> {
        if cancel.is_cancelled() {
            return Err(Error::Aborted);
        }
        let events = match title_question(request) {
            Some(question) => {
                vec![WireEvent::Answer(canned_title(question).to_string())]
            }
            None => self.script(&request.text),
        };
        let delay = self.delay;

        Ok(Box::pin(stream! {
            for event in events {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        yield Err(Error::Aborted);
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                yield Ok(event);
            }
        }))
    }
}
