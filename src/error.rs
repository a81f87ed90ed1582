//! Error types for the text categorizer.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Model {model} not available on provider {provider}")]
    ModelNotAvailable { provider: String, model: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pipeline build and execution errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Classification failed: {0}")]
    Classification(#[from] LlmError),

    #[error("Step {0} is not registered")]
    UnknownStep(String),

    #[error("Step {0} registered twice")]
    DuplicateStep(String),

    #[error("Step name {0} is reserved for the end marker")]
    ReservedStepName(String),

    #[error("Branch chose {0}, which is not one of its declared targets")]
    UndeclaredBranch(String),

    #[error("No entry step set")]
    MissingEntry,

    #[error("Step {0} has no outgoing edge")]
    MissingEdge(String),

    #[error("Step {0} already has an outgoing edge")]
    DuplicateEdge(String),

    #[error("Step {step} requires {field} to be set")]
    MissingField { step: String, field: &'static str },

    #[error("Step limit of {limit} reached without hitting the end marker")]
    StepLimitExceeded { limit: usize },
}
