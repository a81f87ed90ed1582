//! Text categorizer — classifies a message and answers with a canned reply.

pub mod classifier;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
