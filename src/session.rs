//! Session store
//!
//! Owns the conversation state of one interactive session: the transcript,
//! the active mode and one draft per mode.

mod snapshot;
mod store;
mod transcript;
mod types;

pub use snapshot::SessionSnapshot;
pub use store::{SessionError, SessionStore};
pub use types::{ContextTag, Drafts, ExchangeFailure, Message, Mode, Role};
