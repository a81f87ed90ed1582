//! Text classification adapter.
//!
//! The pipeline only sees `Classifier::classify(text) -> label`. The label is
//! returned as the model produced it (trimmed); mapping it onto the closed
//! category set happens in the categorize step.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};

/// Max tokens for the classification call. The answer is a single label.
const CLASSIFY_MAX_TOKENS: u32 = 16;

/// Sampling temperature for classification.
const CLASSIFY_TEMPERATURE: f32 = 0.0;

/// Maps free-form text to a category label.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<String, LlmError>;
}

/// Classifier backed by a chat-completion model.
pub struct LlmClassifier {
    llm: Arc<dyn LlmProvider>,
}

impl LlmClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, text: &str) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_system_prompt()),
            ChatMessage::user(build_user_prompt(text)),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let response = self.llm.complete(request).await?;
        let label = response.content.trim();
        if label.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.llm.model_name().to_string(),
                reason: "empty classification".to_string(),
            });
        }

        debug!(
            model = self.llm.model_name(),
            label,
            output_tokens = response.output_tokens,
            "Classifier returned label"
        );
        Ok(label.to_string())
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_system_prompt() -> String {
    "You are a text categorizer. You understand what my friend is saying and sort it \
     into a useful category. Texts may be written in English or in Roman Urdu. \
     For context, 'milo' is my nickname.\n\n\
     Categories:\n\
     - \"compliment\": my friend is complimenting me, e.g. calling me cute, smart, hot. \
     Supportive or encouraging texts are NOT compliments.\n\
     - \"off_topic\": anything that does not fit the compliment description.\n\n\
     Output a single category only, one of: compliment, off_topic. Do not output anything else."
        .to_string()
}

fn build_user_prompt(text: &str) -> String {
    format!("Categorize this text:\n\n{text}")
}
