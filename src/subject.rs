//! Routing key resolution
//!
//! Expands a subject template such as `falco.<priority>.<rule>` against an
//! alert. Only `<priority>` and `<rule>` are recognised; any other text,
//! including unknown `<tokens>`, is copied through unchanged.

use crate::types::Event;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Template used when none is configured
pub const DEFAULT_SUBJECT_TEMPLATE: &str = "falco.<priority>.<rule>";

const PRIORITY_PLACEHOLDER: &str = "<priority>";
const RULE_PLACEHOLDER: &str = "<rule>";

fn slug_regex() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new("[^a-z0-9]+").expect("static slug pattern is valid"))
}

/// Lowercase `text` and collapse every run of non `[a-z0-9]` chars to `_`,
/// trimming `_` from both ends.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    slug_regex()
        .replace_all(&lower, "_")
        .trim_matches('_')
        .to_string()
}

/// A subject template supplied by configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectTemplate(String);

impl SubjectTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// The effective template, falling back to the default when empty
    pub fn as_str(&self) -> &str {
        if self.0.is_empty() {
            DEFAULT_SUBJECT_TEMPLATE
        } else {
            &self.0
        }
    }

    /// Resolve the template against an alert
    pub fn resolve(&self, event: &Event) -> String {
        resolve_subject(self.as_str(), event)
    }
}

impl From<&str> for SubjectTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

impl From<String> for SubjectTemplate {
    fn from(template: String) -> Self {
        Self(template)
    }
}

/// Expand `<priority>` and `<rule>` in `template` for `event`
pub fn resolve_subject(template: &str, event: &Event) -> String {
    let template = if template.is_empty() {
        DEFAULT_SUBJECT_TEMPLATE
    } else {
        template
    };

    template
        .replace(
            PRIORITY_PLACEHOLDER,
            &event.priority.as_str().to_lowercase(),
        )
        .replace(RULE_PLACEHOLDER, &slugify(&event.rule))
}
