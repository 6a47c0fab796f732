//! advisor-chat: conversation state for the legal advisor
//!
//! Folds the streamed response of the chat endpoint into thinking steps and a
//! growing assistant message, and keeps the per-user conversation list in step
//! with an external store using optimistic updates.

pub mod advisor;
pub mod answer;
pub mod auth;
pub mod conversation;
pub mod error;
pub mod events;
pub mod handle;
pub mod mock;
pub mod steps;
pub mod store;
pub mod title;
pub mod transport;
pub mod turn;

pub use advisor::{Advisor, AdvisorConfig, DEFAULT_MODEL};
pub use auth::{AuthProvider, Credentials, StaticAuth, User};
pub use conversation::{Conversation, ConversationList, Message, Role};
pub use error::{Error, Result};
pub use events::{AdvisorEvent, Notice};
pub use handle::TurnHandle;
pub use mock::ScriptedTransport;
pub use steps::{StepTracker, ThinkingStep};
pub use store::{ConversationStore, ConversationUpdate, MemoryStore, ScopedStore};
pub use transport::{ChatTransport, HttpTransport, RetryConfig};
pub use turn::{Turn, TurnOutcome, TurnPhase, TurnUpdate};
