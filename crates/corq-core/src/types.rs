//! Common types used across the corq pipeline

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A user question. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question(String);

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Question {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// Whether a question asks about the corpus as a whole or about something
/// specific that needs passage retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    #[serde(rename = "corpus_overview")]
    Overview,
    #[serde(rename = "specific_query")]
    Specific,
}

impl QuestionKind {
    pub const OVERVIEW_LABEL: &'static str = "corpus_overview";
    pub const SPECIFIC_LABEL: &'static str = "specific_query";

    /// Parse a wire label into a kind. Returns `None` for anything that is
    /// not one of the two known labels.
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim() {
            Self::OVERVIEW_LABEL => Some(Self::Overview),
            Self::SPECIFIC_LABEL => Some(Self::Specific),
            _ => None,
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Overview => Self::OVERVIEW_LABEL,
            Self::Specific => Self::SPECIFIC_LABEL,
        }
    }
}

/// Whether an answer is backed by citations into the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grounding {
    Cited,
    Uncited,
}

/// The terminal output of the classify-then-retrieve pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    /// Source identifiers of the passages the answer is grounded on.
    /// Always a subset of the passages supplied to the generator.
    pub citations: Vec<String>,
    pub grounding: Grounding,
}

impl Answer {
    pub fn is_grounded(&self) -> bool {
        self.grounding == Grounding::Cited
    }
}

/// States of a pipeline run. `Answered` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Received,
    Classified,
    Retrieved,
    Answered,
    Failed,
}

/// Configuration for retrying transient service failures.
///
/// The delay doubles after each failed attempt. Only transient failures
/// (HTTP 429, 5xx, transport errors) are retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}
