//! advisor-wire: chat endpoint wire protocol
//!
//! Request/response types for the legal advisor chat backend, the lenient
//! line-oriented stream reader, and the reqwest-based client.

pub mod client;
pub mod error;
pub mod stream;
pub mod types;

pub use client::{ChatClient, DEFAULT_ENDPOINT};
pub use error::{Error, Result};
pub use stream::{WireEventStream, read_events};
pub use types::*;
