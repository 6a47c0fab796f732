//! Advisor event types

use serde::{Deserialize, Serialize};

use crate::{auth::User, steps::ThinkingStep, turn::TurnOutcome};

/// Non-fatal problems surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    LoadFailed,
    CreateFailed,
    ResponseFailed,
    SaveFailed,
    RenameFailed,
    DeleteFailed,
    RatingFailed,
    CommentFailed,
}

impl Notice {
    /// Message catalogue key
    pub fn key(&self) -> &'static str {
        match self {
            Notice::LoadFailed => "notice.load_failed",
            Notice::CreateFailed => "notice.create_failed",
            Notice::ResponseFailed => "notice.response_failed",
            Notice::SaveFailed => "notice.save_failed",
            Notice::RenameFailed => "notice.rename_failed",
            Notice::DeleteFailed => "notice.delete_failed",
            Notice::RatingFailed => "notice.rating_failed",
            Notice::CommentFailed => "notice.comment_failed",
        }
    }
}

/// Events emitted by the advisor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdvisorEvent {
    /// A request was sent for a conversation
    TurnStart { conversation_id: String },

    /// Thinking steps changed
    StepsUpdated {
        conversation_id: String,
        steps: Vec<ThinkingStep>,
    },

    /// The streaming assistant message now reads `content`
    AnswerUpdated {
        conversation_id: String,
        message_id: String,
        content: String,
    },

    /// A turn finished
    TurnEnd {
        conversation_id: String,
        outcome: TurnOutcome,
    },

    /// The conversation list was replaced
    ConversationsChanged,

    /// The active selection changed
    ActiveChanged { conversation_id: Option<String> },

    /// The signed-in user changed
    UserChanged { user: Option<User> },

    Notice { notice: Notice },
}
