//! System prompts and message framing per context tag

use crate::session::{ContextTag, Message, Role};

/// Prompt for conversational exchanges
const CONVERSATION_PROMPT: &str = r"You are an AI coding assistant. Help the user with programming questions, code review, debugging and development best practices.

Be concise. Use fenced code blocks for any code you show.";

/// Prompt for code analysis exchanges
const CODE_ANALYSIS_PROMPT: &str = r"You are an AI coding assistant performing code analysis. The user has pasted source code. Review it for bugs, unclear logic, performance problems and style issues.

Structure your answer as a short summary followed by a list of concrete findings. Quote the relevant lines and propose a fix for each finding.";

pub fn system_prompt(context: ContextTag) -> &'static str {
    match context {
        ContextTag::Conversation => CONVERSATION_PROMPT,
        ContextTag::CodeAnalysis => CODE_ANALYSIS_PROMPT,
    }
}

/// Text sent to the model for a transcript message.
///
/// Pasted code is fenced so the model does not read it as prose. Content
/// that already carries a fence (quick actions) goes out unchanged.
pub fn render_message(message: &Message) -> String {
    match (message.role(), message.context()) {
        (Role::User, ContextTag::CodeAnalysis) if !message.content().contains("```") => {
            format!(
                "Please analyze the following code:\n\n```\n{}\n```",
                message.content().trim_end()
            )
        }
        _ => message.content().to_string(),
    }
}
