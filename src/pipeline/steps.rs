//! The three steps of the reply workflow.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::classifier::Classifier;
use crate::config::ReplyConfig;
use crate::error::PipelineError;
use crate::pipeline::graph::Step;
use crate::pipeline::state::{Category, TextState};

pub const CATEGORIZE: &str = "categorize";
pub const COMPOSE_REPLY: &str = "compose_reply";
pub const REPORT: &str = "report";

// ── categorize ──────────────────────────────────────────────────────

/// Asks the classifier for a label and records it.
pub struct CategorizeStep {
    classifier: Arc<dyn Classifier>,
}

impl CategorizeStep {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl Step<TextState> for CategorizeStep {
    fn name(&self) -> &str {
        CATEGORIZE
    }

    async fn run(&self, state: TextState) -> Result<TextState, PipelineError> {
        let label = self.classifier.classify(state.text()).await?;
        let category = Category::parse(&label);
        info!(id = %state.id(), category = %category, "Text categorized");
        Ok(state.with_category(category))
    }
}

// ── compose_reply ───────────────────────────────────────────────────

/// Maps the category to a canned reply.
pub struct ComposeReplyStep {
    replies: ReplyConfig,
}

impl ComposeReplyStep {
    pub fn new(replies: ReplyConfig) -> Self {
        Self { replies }
    }

    /// Reply for a category. Total: every non-compliment label, recognized
    /// or not, gets the default reply.
    pub fn reply_for(&self, category: &Category) -> &str {
        match category {
            Category::Compliment => &self.replies.compliment,
            Category::OffTopic | Category::Unrecognized(_) => &self.replies.default,
        }
    }
}

#[async_trait]
impl Step<TextState> for ComposeReplyStep {
    fn name(&self) -> &str {
        COMPOSE_REPLY
    }

    async fn run(&self, state: TextState) -> Result<TextState, PipelineError> {
        let category = state.category().ok_or_else(|| PipelineError::MissingField {
            step: COMPOSE_REPLY.to_string(),
            field: "category",
        })?;

        if let Category::Unrecognized(raw) = category {
            warn!(
                id = %state.id(),
                label = %raw,
                "Classifier returned a label outside the known set, using default reply"
            );
        }

        let reply = self.reply_for(category).to_string();
        Ok(state.with_reply(reply))
    }
}

// ── report ──────────────────────────────────────────────────────────

/// Emits the final state. Never modifies it.
pub struct ReportStep {
    echo: bool,
}

impl ReportStep {
    pub fn new(echo: bool) -> Self {
        Self { echo }
    }
}

/// The three report lines for a state.
pub fn report_lines(state: &TextState) -> [String; 3] {
    [
        format!("Initial text: {}", state.text()),
        format!(
            "Text category: {}",
            state.category().map(Category::label).unwrap_or_default()
        ),
        format!("Return text: {}", state.reply().unwrap_or_default()),
    ]
}

#[async_trait]
impl Step<TextState> for ReportStep {
    fn name(&self) -> &str {
        REPORT
    }

    async fn run(&self, state: TextState) -> Result<TextState, PipelineError> {
        info!(
            id = %state.id(),
            text = %state.text(),
            category = state.category().map(Category::label).unwrap_or_default(),
            reply = state.reply().unwrap_or_default(),
            "Pipeline state"
        );
        if self.echo {
            for line in report_lines(&state) {
                println!("{line}");
            }
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;

    struct FixedClassifier(&'static str);

    #[async_trait]
    impl Classifier for FixedClassifier {
        async fn classify(&self, _text: &str) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenClassifier;

    #[async_trait]
    impl Classifier for BrokenClassifier {
        async fn classify(&self, _text: &str) -> Result<String, LlmError> {
            Err(LlmError::RequestFailed {
                provider: "test".into(),
                reason: "timeout".into(),
            })
        }
    }

    #[tokio::test]
    async fn categorize_sets_category_and_keeps_text() {
        let step = CategorizeStep::new(Arc::new(FixedClassifier("compliment")));
        let state = step.run(TextState::new("you look amazing today")).await.unwrap();
        assert_eq!(state.category(), Some(&Category::Compliment));
        assert_eq!(state.text(), "you look amazing today");
        assert!(state.reply().is_none());
    }

    #[tokio::test]
    async fn categorize_propagates_classifier_failure() {
        let step = CategorizeStep::new(Arc::new(BrokenClassifier));
        let err = step.run(TextState::new("hi")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Classification(_)));
    }

    #[tokio::test]
    async fn compose_reply_maps_categories() {
        let step = ComposeReplyStep::new(ReplyConfig::default());

        let compliment = TextState::new("a").with_category(Category::Compliment);
        let state = step.run(compliment).await.unwrap();
        assert_eq!(state.reply(), Some("nu youuuu!!"));

        let off_topic = TextState::new("b").with_category(Category::OffTopic);
        let state = step.run(off_topic).await.unwrap();
        assert_eq!(state.reply(), Some("noted."));

        let unknown = TextState::new("c").with_category(Category::parse("unknown"));
        let state = step.run(unknown).await.unwrap();
        assert_eq!(state.reply(), Some("noted."));
    }

    #[tokio::test]
    async fn near_miss_labels_get_default_reply() {
        let compose = ComposeReplyStep::new(ReplyConfig::default());
        for label in ["'compliment'", "COMPLIMENT", "Compliment", "`compliment`"] {
            let categorize = CategorizeStep::new(Arc::new(FixedClassifier(label)));
            let state = categorize.run(TextState::new("x")).await.unwrap();
            assert_eq!(
                state.category(),
                Some(&Category::Unrecognized(label.to_string()))
            );
            let state = compose.run(state).await.unwrap();
            assert_eq!(state.reply(), Some("noted."), "label {label}");
        }
    }

    #[tokio::test]
    async fn compose_reply_is_idempotent() {
        let step = ComposeReplyStep::new(ReplyConfig::default());
        let base = TextState::new("x").with_category(Category::Compliment);

        let first = step.run(base.clone()).await.unwrap();
        let second = step.run(base).await.unwrap();
        assert_eq!(first.reply(), second.reply());
    }

    #[tokio::test]
    async fn compose_reply_requires_category() {
        let step = ComposeReplyStep::new(ReplyConfig::default());
        let err = step.run(TextState::new("x")).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingField { field: "category", .. }
        ));
    }

    #[tokio::test]
    async fn compose_reply_uses_configured_replies() {
        let step = ComposeReplyStep::new(ReplyConfig {
            compliment: "thank you!".into(),
            default: "ok".into(),
        });
        assert_eq!(step.reply_for(&Category::Compliment), "thank you!");
        assert_eq!(step.reply_for(&Category::OffTopic), "ok");
    }

    #[tokio::test]
    async fn report_passes_state_through() {
        let state = TextState::new("hello")
            .with_category(Category::OffTopic)
            .with_reply("noted.");
        let out = ReportStep::new(false).run(state.clone()).await.unwrap();
        assert_eq!(out, state);
    }

    #[test]
    fn report_lines_cover_all_fields() {
        let state = TextState::new("tum bohat pyari ho")
            .with_category(Category::Compliment)
            .with_reply("nu youuuu!!");
        let lines = report_lines(&state);
        assert_eq!(lines[0], "Initial text: tum bohat pyari ho");
        assert_eq!(lines[1], "Text category: compliment");
        assert_eq!(lines[2], "Return text: nu youuuu!!");
    }

    #[test]
    fn report_lines_tolerate_missing_fields() {
        let lines = report_lines(&TextState::new("x"));
        assert_eq!(lines[1], "Text category: ");
        assert_eq!(lines[2], "Return text: ");
    }
}
