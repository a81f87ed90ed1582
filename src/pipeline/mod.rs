//! Reply pipeline.
//!
//! Every text flows through:
//! 1. `categorize` — one classifier call, label recorded on the state
//! 2. `compose_reply` — category mapped to a canned reply
//! 3. `report` — final state emitted, unchanged
//!
//! The edge leaving `categorize` is a state-dependent branch. Each run owns
//! its state; the pipeline itself is shared and stateless.

pub mod graph;
pub mod state;
pub mod steps;
pub mod workflow;

pub use graph::{END, Pipeline, PipelineBuilder, Step, Transition};
pub use state::{Category, TextState};
pub use workflow::ReplyWorkflow;
