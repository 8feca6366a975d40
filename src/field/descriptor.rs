use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A field to classify.
///
/// Built fresh by the caller for every request and never mutated by the
/// engine. `kind` is advisory only; classifiers decide from `name` first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    #[serde(default = "Uuid::new_v4")]
    pub identifier: Uuid,
    pub name: String,
    #[serde(default = "default_kind", alias = "type")]
    pub kind: String,
    #[serde(default, alias = "nearbyText")]
    pub nearby_context: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

fn default_kind() -> String {
    "text".to_string()
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            identifier: Uuid::new_v4(),
            name: name.into(),
            kind: default_kind(),
            nearby_context: String::new(),
            metadata: HashMap::new(),
        }
    }

    /// Descriptor for a free-form developer prompt rather than a scraped label.
    pub fn generative(prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        let context = format!("Developer requested input for: {}", prompt);
        Self::new(prompt).with_kind("generative").with_context(context)
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.nearby_context = context.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_identifier(mut self, identifier: Uuid) -> Self {
        self.identifier = identifier;
        self
    }

    /// Whether the name carries anything to classify.
    pub fn is_degenerate(&self) -> bool {
        self.name.trim().is_empty()
    }
}
