//! Configuration types.
//!
//! Everything is read once at startup and passed down explicitly.

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{GROQ_BASE_URL, LlmBackend, LlmConfig};
use crate::pipeline::graph::DEFAULT_STEP_LIMIT;

/// Canned replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyConfig {
    /// Sent when the text is a compliment.
    pub compliment: String,
    /// Sent for everything else.
    pub default: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            compliment: "nu youuuu!!".to_string(),
            default: "noted.".to_string(),
        }
    }
}

/// Workflow options.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub replies: ReplyConfig,
    /// Maximum steps per run before the executor gives up.
    pub step_limit: usize,
    /// Print the report lines to stdout in addition to the log.
    pub echo_report: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            replies: ReplyConfig::default(),
            step_limit: DEFAULT_STEP_LIMIT,
            echo_report: true,
        }
    }
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub workflow: WorkflowConfig,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend: LlmBackend = match get("CATEGORIZER_BACKEND") {
            Some(raw) => raw.parse()?,
            None => LlmBackend::default(),
        };

        let key_var = backend.api_key_var();
        let api_key = get(key_var).ok_or_else(|| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let model = get("CATEGORIZER_MODEL").unwrap_or_else(|| backend.default_model().to_string());
        let base_url = get("CATEGORIZER_BASE_URL").unwrap_or_else(|| GROQ_BASE_URL.to_string());

        let defaults = WorkflowConfig::default();

        let step_limit = match get("CATEGORIZER_STEP_LIMIT") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "CATEGORIZER_STEP_LIMIT".to_string(),
                        message: format!("expected a positive integer, got '{raw}'"),
                    });
                }
            },
            None => defaults.step_limit,
        };

        let echo_report = match get("CATEGORIZER_ECHO_REPORT") {
            Some(raw) => parse_bool("CATEGORIZER_ECHO_REPORT", &raw)?,
            None => defaults.echo_report,
        };

        let replies = ReplyConfig {
            compliment: get("CATEGORIZER_REPLY_COMPLIMENT")
                .unwrap_or(defaults.replies.compliment),
            default: get("CATEGORIZER_REPLY_DEFAULT").unwrap_or(defaults.replies.default),
        };

        Ok(Self {
            llm: LlmConfig {
                backend,
                api_key: SecretString::from(api_key),
                model,
                base_url,
            },
            workflow: WorkflowConfig {
                replies,
                step_limit,
                echo_report,
            },
        })
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected true or false, got '{raw}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_groq() {
        let config = AppConfig::from_vars(vars(&[("GROQ_API_KEY", "gsk-test")])).unwrap();
        assert_eq!(config.llm.backend, LlmBackend::Groq);
        assert_eq!(config.llm.model, "llama3-70b-8192");
        assert_eq!(config.llm.base_url, GROQ_BASE_URL);
        assert_eq!(config.llm.api_key.expose_secret(), "gsk-test");
        assert_eq!(config.workflow.replies, ReplyConfig::default());
        assert_eq!(config.workflow.step_limit, DEFAULT_STEP_LIMIT);
        assert!(config.workflow.echo_report);
    }

    #[test]
    fn missing_key_for_selected_backend() {
        let err = AppConfig::from_vars(vars(&[
            ("CATEGORIZER_BACKEND", "anthropic"),
            ("GROQ_API_KEY", "gsk-test"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(var) if var == "ANTHROPIC_API_KEY"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let err = AppConfig::from_vars(vars(&[("GROQ_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_vars(vars(&[
            ("CATEGORIZER_BACKEND", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
            ("CATEGORIZER_MODEL", "gpt-4o-mini"),
            ("CATEGORIZER_REPLY_COMPLIMENT", "aww thanks"),
            ("CATEGORIZER_REPLY_DEFAULT", "ok"),
            ("CATEGORIZER_STEP_LIMIT", "10"),
            ("CATEGORIZER_ECHO_REPORT", "off"),
        ]))
        .unwrap();
        assert_eq!(config.llm.backend, LlmBackend::OpenAi);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.workflow.replies.compliment, "aww thanks");
        assert_eq!(config.workflow.replies.default, "ok");
        assert_eq!(config.workflow.step_limit, 10);
        assert!(!config.workflow.echo_report);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = AppConfig::from_vars(vars(&[
            ("GROQ_API_KEY", "gsk"),
            ("CATEGORIZER_STEP_LIMIT", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = AppConfig::from_vars(vars(&[
            ("GROQ_API_KEY", "gsk"),
            ("CATEGORIZER_ECHO_REPORT", "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = AppConfig::from_vars(vars(&[("CATEGORIZER_BACKEND", "llama")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
