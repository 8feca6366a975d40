//! Brain Module
//!
//! Classifiers that turn a `FieldDescriptor` into a `Decision`. Anything
//! that implements [`Classifier`] can drive a renderer: the offline keyword
//! rules, the language-model backed classifier, or a fixed table of presets.

mod extract;
mod generative;
mod preset;
mod prompt;
mod rules;

pub use extract::{extract_json, sanitize_json};
pub use generative::GenerativeClassifier;
pub use preset::PresetClassifier;
pub use prompt::{build_field_prompt, CLASSIFIER_INSTRUCTIONS};
pub use rules::{clean_label, GeoPolicy, RuleBasedClassifier};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::{Decision, FieldDescriptor};

pub const TURN_BUDGET_HINT: &str = "Answer using information already gathered.";

/// Failure modes of a classification.
///
/// Only `Unavailable` and `TurnBudgetExceeded` ever leave a classifier; the
/// other two are absorbed into a fallback decision where they occur.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum ClassifierError {
    #[error("Generative backend unavailable: {0}")]
    Unavailable(String),

    #[error("Model output is not a valid decision: {0}")]
    MalformedOutput(String),

    #[error("Max turn budget of {limit} exceeded for this request. Suggestion: {hint}", hint = TURN_BUDGET_HINT)]
    TurnBudgetExceeded { limit: u32 },

    #[error("Inference failed: {0}")]
    InferenceFailure(String),
}

impl ClassifierError {
    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self {
            ClassifierError::TurnBudgetExceeded { .. } => Some(TURN_BUDGET_HINT),
            _ => None,
        }
    }

    /// Whether the error may propagate past the classifier that hit it.
    pub fn is_surfaced(&self) -> bool {
        matches!(
            self,
            ClassifierError::Unavailable(_) | ClassifierError::TurnBudgetExceeded { .. }
        )
    }
}

pub type ClassifierResult<T> = std::result::Result<T, ClassifierError>;

/// Anything that can decide how a field should be filled in.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    async fn classify(&self, descriptor: &FieldDescriptor) -> ClassifierResult<Decision>;
}

#[async_trait]
impl<C: Classifier + ?Sized> Classifier for std::sync::Arc<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn classify(&self, descriptor: &FieldDescriptor) -> ClassifierResult<Decision> {
        (**self).classify(descriptor).await
    }
}
