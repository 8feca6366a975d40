use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

use super::{Classifier, ClassifierResult, RuleBasedClassifier};
use crate::field::{Decision, FieldDescriptor};

/// Answers from a fixed table of decisions keyed by field name, deferring
/// to an inner classifier for anything not in the table.
///
/// Used for scripted UI runs and as a stand-in classifier in tests.
pub struct PresetClassifier<C = RuleBasedClassifier> {
    presets: HashMap<String, Decision>,
    inner: C,
}

impl PresetClassifier<RuleBasedClassifier> {
    pub fn new() -> Self {
        Self::with_inner(RuleBasedClassifier::new())
    }
}

impl Default for PresetClassifier<RuleBasedClassifier> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Classifier> PresetClassifier<C> {
    pub fn with_inner(inner: C) -> Self {
        Self {
            presets: HashMap::new(),
            inner,
        }
    }

    pub fn with_preset(mut self, field_name: impl Into<String>, decision: Decision) -> Self {
        self.presets.insert(field_name.into(), decision);
        self
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

#[async_trait]
impl<C: Classifier> Classifier for PresetClassifier<C> {
    fn name(&self) -> &str {
        "Preset"
    }

    async fn classify(&self, descriptor: &FieldDescriptor) -> ClassifierResult<Decision> {
        if let Some(decision) = self.presets.get(&descriptor.name) {
            debug!(target: "contextual::brain", "[Preset] Hit for field '{}'", descriptor.name);
            return Ok(decision.clone());
        }
        self.inner.classify(descriptor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{KeyboardConfig, Strategy};

    #[tokio::test]
    async fn test_preset_hit_and_delegation() {
        let classifier = PresetClassifier::new().with_preset(
            "firstName",
            Decision::keyboard(KeyboardConfig::default())
                .with_label("First Name")
                .with_placeholder("John"),
        );
        assert_eq!(classifier.len(), 1);

        let hit = classifier.classify(&FieldDescriptor::new("firstName")).await.unwrap();
        assert_eq!(hit.label.as_deref(), Some("First Name"));

        let miss = classifier.classify(&FieldDescriptor::new("Firma")).await.unwrap();
        assert_eq!(miss.strategy(), Strategy::Signature);
    }
}
