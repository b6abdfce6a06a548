//! Offline assistant that answers with a canned reply after a fixed delay

use super::{AssistantError, AssistantReply, AssistantService};
use crate::session::{ContextTag, Message, Role};
use async_trait::async_trait;
use std::time::Duration;

const CONVERSATION_REPLY: &str = "I understand you want help with coding. I'm here to assist you with your development tasks!";

pub struct SimulatedAssistant {
    delay: Duration,
}

impl SimulatedAssistant {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

fn code_analysis_reply(code: &str) -> String {
    let lines = code.lines().filter(|l| !l.trim().is_empty()).count();
    format!(
        "I've received {lines} line(s) of code for analysis. Connect a live assistant backend (set ANTHROPIC_API_KEY) for a detailed review."
    )
}

#[async_trait]
impl AssistantService for SimulatedAssistant {
    async fn respond(
        &self,
        transcript: &[Message],
        context: ContextTag,
    ) -> Result<AssistantReply, AssistantError> {
        tokio::time::sleep(self.delay).await;

        let content = match context {
            ContextTag::Conversation => CONVERSATION_REPLY.to_string(),
            ContextTag::CodeAnalysis => {
                let code = transcript
                    .iter()
                    .rev()
                    .find(|m| m.role() == Role::User)
                    .map_or("", Message::content);
                code_analysis_reply(code)
            }
        };
        Ok(AssistantReply::text(content))
    }

    fn model_id(&self) -> &str {
        "simulated"
    }
}
