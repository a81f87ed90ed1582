//! The reply workflow: categorize → compose_reply → report.

use std::sync::Arc;

use tracing::{Instrument, error, info, info_span};

use crate::classifier::Classifier;
use crate::config::WorkflowConfig;
use crate::error::PipelineError;
use crate::pipeline::graph::{END, Pipeline, Step};
use crate::pipeline::state::{Category, TextState};
use crate::pipeline::steps::{
    CATEGORIZE, COMPOSE_REPLY, CategorizeStep, ComposeReplyStep, REPORT, ReportStep,
};

/// Branch decision after categorization.
///
/// Both arms currently lead to `compose_reply`; the branch point is where
/// category-specific steps plug in.
pub fn route_after_categorize(state: &TextState) -> String {
    match state.category() {
        Some(Category::Compliment) => COMPOSE_REPLY.to_string(),
        _ => COMPOSE_REPLY.to_string(),
    }
}

/// Wire the three steps: entry `categorize`, branch to `compose_reply`,
/// then `report`, then end.
fn build_pipeline(
    categorize: Arc<dyn Step<TextState>>,
    compose_reply: Arc<dyn Step<TextState>>,
    report: Arc<dyn Step<TextState>>,
    step_limit: usize,
) -> Result<Pipeline<TextState>, PipelineError> {
    Pipeline::builder()
        .add_step(categorize)
        .add_step(compose_reply)
        .add_step(report)
        .set_entry(CATEGORIZE)
        .add_conditional_edge(CATEGORIZE, route_after_categorize, [COMPOSE_REPLY])
        .add_edge(COMPOSE_REPLY, REPORT)
        .add_edge(REPORT, END)
        .with_step_limit(step_limit)
        .build()
}

/// Classifies a text and picks a canned reply.
pub struct ReplyWorkflow {
    pipeline: Pipeline<TextState>,
}

impl ReplyWorkflow {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        config: &WorkflowConfig,
    ) -> Result<Self, PipelineError> {
        let pipeline = build_pipeline(
            Arc::new(CategorizeStep::new(classifier)),
            Arc::new(ComposeReplyStep::new(config.replies.clone())),
            Arc::new(ReportStep::new(config.echo_report)),
            config.step_limit,
        )?;

        Ok(Self { pipeline })
    }

    /// Run one text through the workflow.
    pub async fn run(&self, text: impl Into<String>) -> Result<TextState, PipelineError> {
        let state = TextState::new(text);
        let span = info_span!("workflow", id = %state.id());
        async {
            info!(chars = state.text().chars().count(), "Processing text");
            self.pipeline.run(state).await
        }
        .instrument(span)
        .await
    }

    /// Run several texts one after another.
    ///
    /// Each text gets its own state. Failures are logged and skipped.
    pub async fn run_batch<I, T>(&self, texts: I) -> Vec<TextState>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut results = Vec::new();
        let mut failed = 0usize;
        for text in texts {
            match self.run(text).await {
                Ok(state) => results.push(state),
                Err(e) => {
                    failed += 1;
                    error!(error = %e, "Failed to process text in batch");
                }
            }
        }

        info!(processed = results.len(), failed, "Batch processing complete");
        results
    }
}
