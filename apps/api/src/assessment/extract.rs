//! Response Extractor — turns whatever the completion provider returned into
//! the single text result handed back to the client. Never fails.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Returned when the completion response carries no recognizable text.
pub const UNEXPECTED_FORMAT: &str = "Analysis completed, but unexpected response format.";

/// Known completion response shapes, tried in declaration order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CompletionPayload {
    Answer { answer: String },
    Output { output: String },
    /// OpenAI-compatible chat completion.
    Chat { choices: Vec<ChatChoice> },
    Unrecognized(Value),
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionPayload {
    pub fn decode(raw: Value) -> Self {
        serde_json::from_value(raw).unwrap_or(CompletionPayload::Unrecognized(Value::Null))
    }
}

pub fn extract_text(payload: CompletionPayload) -> String {
    match payload {
        CompletionPayload::Answer { answer } => answer,
        CompletionPayload::Output { output } => output,
        CompletionPayload::Chat { choices } => choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_else(|| UNEXPECTED_FORMAT.to_string()),
        CompletionPayload::Unrecognized(raw) => {
            debug!("Unrecognized completion shape: {raw}");
            UNEXPECTED_FORMAT.to_string()
        }
    }
}
