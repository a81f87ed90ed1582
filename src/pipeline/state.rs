//! State threaded through the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Category ────────────────────────────────────────────────────────

/// Classification label.
///
/// The classifier is asked for one of the closed set, but its output is not
/// trusted: anything else is kept verbatim as `Unrecognized`. Serialized as
/// the plain label string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Compliment,
    OffTopic,
    Unrecognized(String),
}

impl Category {
    /// Exact match on the closed set. Quoting or case variants are
    /// `Unrecognized` and take the default reply.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "compliment" => Self::Compliment,
            "off_topic" => Self::OffTopic,
            _ => Self::Unrecognized(raw.to_string()),
        }
    }

    /// Label as written to logs.
    pub fn label(&self) -> &str {
        match self {
            Self::Compliment => "compliment",
            Self::OffTopic => "off_topic",
            Self::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Unrecognized(raw) => raw,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Text state ──────────────────────────────────────────────────────

/// One run's worth of state.
///
/// Fields are read-only from outside the crate. Steps produce updated copies
/// through `with_category` / `with_reply`, each of which is applied once per
/// run by the step that owns the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextState {
    id: Uuid,
    text: String,
    category: Option<Category>,
    reply: Option<String>,
}

impl TextState {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            category: None,
            reply: None,
        }
    }

    /// Run identifier for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn category(&self) -> Option<&Category> {
        self.category.as_ref()
    }

    pub fn reply(&self) -> Option<&str> {
        self.reply.as_deref()
    }

    pub(crate) fn with_category(self, category: Category) -> Self {
        debug_assert!(self.category.is_none(), "category is set once per run");
        Self {
            category: Some(category),
            ..self
        }
    }

    pub(crate) fn with_reply(self, reply: impl Into<String>) -> Self {
        debug_assert!(self.reply.is_none(), "reply is set once per run");
        Self {
            reply: Some(reply.into()),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_closed_set() {
        assert_eq!(Category::parse("compliment"), Category::Compliment);
        assert_eq!(Category::parse("off_topic"), Category::OffTopic);
    }

    #[test]
    fn parse_is_exact() {
        for raw in ["'compliment'", "COMPLIMENT", "`Compliment`", "\"off_topic\"", "Off_Topic"] {
            assert_eq!(Category::parse(raw), Category::Unrecognized(raw.to_string()));
        }
    }

    #[test]
    fn parse_keeps_unknown_labels_verbatim() {
        let category = Category::parse("unknown");
        assert_eq!(category, Category::Unrecognized("unknown".into()));
        assert!(!category.is_recognized());
        assert_eq!(category.label(), "unknown");
    }

    #[test]
    fn parse_does_not_match_substrings() {
        assert!(matches!(
            Category::parse("compliment, probably"),
            Category::Unrecognized(_)
        ));
    }

    #[test]
    fn new_state_has_only_text() {
        let state = TextState::new("hello");
        assert_eq!(state.text(), "hello");
        assert!(state.category().is_none());
        assert!(state.reply().is_none());
    }

    #[test]
    fn updates_keep_text_and_id() {
        let state = TextState::new("tum bohat pyari ho");
        let id = state.id();
        let state = state
            .with_category(Category::Compliment)
            .with_reply("nu youuuu!!");
        assert_eq!(state.id(), id);
        assert_eq!(state.text(), "tum bohat pyari ho");
        assert_eq!(state.category(), Some(&Category::Compliment));
        assert_eq!(state.reply(), Some("nu youuuu!!"));
    }

    #[test]
    fn state_serializes_category_snake_case() {
        let state = TextState::new("x").with_category(Category::OffTopic);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["category"], "off_topic");
        assert!(json["reply"].is_null());
    }

    #[test]
    fn unrecognized_category_serializes_as_plain_label() {
        let state = TextState::new("x").with_category(Category::parse("unknown"));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["category"], "unknown");

        let back: TextState = serde_json::from_value(json).unwrap();
        assert_eq!(back.category(), Some(&Category::Unrecognized("unknown".into())));
    }
}
