//! Wire types for the chat endpoint

use serde::{Deserialize, Serialize};

/// Step name the backend uses for answer fragments
pub const ANSWER_STEP: &str = "Answering";

/// Progress of a thinking step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Step is still running
    #[default]
    Processing,
    /// Step produced its result
    Result,
}

/// Icon attached to a thinking step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepIcon {
    #[serde(default)]
    pub emoji: String,
}

impl StepIcon {
    pub fn new(emoji: impl Into<String>) -> Self {
        Self {
            emoji: emoji.into(),
        }
    }
}

/// A "thinking step" status record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEvent {
    pub step: String,
    pub status: StepStatus,
    pub message: String,
    pub icon: StepIcon,
}

impl StepEvent {
    pub fn new(
        step: impl Into<String>,
        status: StepStatus,
        message: impl Into<String>,
        emoji: impl Into<String>,
    ) -> Self {
        Self {
            step: step.into(),
            status,
            message: message.into(),
            icon: StepIcon::new(emoji),
        }
    }
}

/// A decoded record from the response stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
    /// Thinking-step progress
    Status(StepEvent),
    /// Incremental answer text
    Answer(String),
}

impl WireEvent {
    /// Decode one `data:` payload.
    ///
    /// Answer fragments arrive either as `{"step": "Answering", "message": ..}` or as
    /// `{"content": ..}`; both map to [`WireEvent::Answer`]. Records matching neither
    /// shape decode to `None`.
    pub fn decode(payload: &str) -> serde_json::Result<Option<Self>> {
        let raw: RawRecord = serde_json::from_str(payload)?;

        if let Some(content) = raw.content {
            return Ok(Some(WireEvent::Answer(content)));
        }

        match raw.step {
            Some(step) if step == ANSWER_STEP => Ok(raw.message.map(WireEvent::Answer)),
            Some(step) => Ok(Some(WireEvent::Status(StepEvent {
                step,
                status: raw.status.unwrap_or_default(),
                message: raw.message.unwrap_or_default(),
                icon: raw.icon.unwrap_or_default(),
            }))),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    step: Option<String>,
    status: Option<StepStatus>,
    message: Option<String>,
    icon: Option<StepIcon>,
    content: Option<String>,
}

/// JSON body layout accepted by the chat endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestShape {
    /// `{"queries": [text], "model": ..}`
    #[default]
    Queries,
    /// `{"message": text}`
    Message,
}

/// A single chat request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// User text for this turn
    pub text: String,
    /// Backend model label (e.g. "Gemini Flash")
    pub model: Option<String>,
}

impl ChatRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Build the JSON body for the given shape
    pub fn body(&self, shape: RequestShape) -> serde_json::Value {
        match shape {
            RequestShape::Queries => {
                let mut body = serde_json::json!({ "queries": [self.text] });
                if let Some(ref model) = self.model {
                    body["model"] = serde_json::Value::String(model.clone());
                }
                body
            }
            RequestShape::Message => serde_json::json!({ "message": self.text }),
        }
    }
}
