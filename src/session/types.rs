//! Session data types

use crate::assistant::{AssistantError, AssistantErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Input mode of the client. Each mode keeps its own draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Conversation,
    CodeAnalysis,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Conversation => "chat",
            Mode::CodeAnalysis => "code",
        }
    }
}

/// Marker telling the assistant service how to treat an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextTag {
    Conversation,
    CodeAnalysis,
}

impl ContextTag {
    /// The mode whose draft feeds this kind of exchange
    pub fn mode(self) -> Mode {
        match self {
            ContextTag::Conversation => Mode::Conversation,
            ContextTag::CodeAnalysis => Mode::CodeAnalysis,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContextTag::Conversation => "conversation",
            ContextTag::CodeAnalysis => "code_analysis",
        }
    }
}

impl From<Mode> for ContextTag {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Conversation => ContextTag::Conversation,
            Mode::CodeAnalysis => ContextTag::CodeAnalysis,
        }
    }
}

impl fmt::Display for ContextTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single transcript entry.
///
/// Fields are private so a message cannot change after the transcript
/// has assigned its sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    role: Role,
    content: String,
    sequence: u64,
    context: ContextTag,
    created_at: DateTime<Utc>,
}

impl Message {
    pub(super) fn new(role: Role, content: String, sequence: u64, context: ContextTag) -> Self {
        Self {
            role,
            content,
            sequence,
            context,
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn context(&self) -> ContextTag {
        self.context
    }
}

/// Uncommitted input, one buffer per mode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Drafts {
    conversation: String,
    code_analysis: String,
}

impl Drafts {
    pub fn get(&self, mode: Mode) -> &str {
        match mode {
            Mode::Conversation => &self.conversation,
            Mode::CodeAnalysis => &self.code_analysis,
        }
    }

    pub fn set(&mut self, mode: Mode, text: String) {
        *self.slot(mode) = text;
    }

    pub fn clear(&mut self, mode: Mode) {
        self.slot(mode).clear();
    }

    fn slot(&mut self, mode: Mode) -> &mut String {
        match mode {
            Mode::Conversation => &mut self.conversation,
            Mode::CodeAnalysis => &mut self.code_analysis,
        }
    }
}

/// Visible error state attached to an exchange the assistant did not answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeFailure {
    pub exchange_id: Uuid,
    /// Sequence of the unanswered user message, if it is still in the transcript
    pub user_sequence: Option<u64>,
    pub context: ContextTag,
    pub kind: AssistantErrorKind,
    pub message: String,
    /// Whether re-submitting is likely to help
    pub retryable: bool,
}

impl ExchangeFailure {
    pub fn new(
        exchange_id: Uuid,
        user_sequence: Option<u64>,
        context: ContextTag,
        error: &AssistantError,
    ) -> Self {
        Self {
            exchange_id,
            user_sequence,
            context,
            kind: error.kind,
            message: error.message.clone(),
            retryable: error.kind.is_retryable(),
        }
    }
}
