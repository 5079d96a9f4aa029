use crate::genai::content::Prompt;
use crate::genai::wire::{Content, GenerateContentResponse};

/// One prompt-or-response unit in a conversation history.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    Prompt(Prompt),
    Response(GenerateContentResponse),
}

/// Chat session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Created, no exchange yet.
    #[default]
    Open,
    /// At least one successful exchange.
    Active,
    /// Closed by the caller; no further sends are accepted.
    Closed,
}

/// One continuous multi-turn conversation. Turns are append-only and
/// never trimmed.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    turns: Vec<Turn>,
    state: SessionState,
}

impl ChatSession {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Caller-driven close from any state.
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    /// Records one completed exchange and marks the session active.
    pub(crate) fn record_exchange(&mut self, prompt: Prompt, response: GenerateContentResponse) {
        self.turns.push(Turn::Prompt(prompt));
        self.turns.push(Turn::Response(response));
        self.state = SessionState::Active;
    }

    /// Full turn history as wire content, oldest first. Refused responses
    /// carry no content block and are skipped.
    pub(crate) fn context_contents(&self) -> Vec<Content> {
        self.turns
            .iter()
            .filter_map(|turn| match turn {
                Turn::Prompt(prompt) => Some(prompt.to_content()),
                Turn::Response(response) => response
                    .candidates
                    .first()
                    .and_then(|candidate| candidate.content.clone()),
            })
            .collect()
    }
}
