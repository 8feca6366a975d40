//! Generative Classifier
//!
//! Asks a language model for the decision. The model may be missing, may
//! answer in prose, or may wrap its JSON in markdown; only an unavailable
//! backend or a spent turn budget is reported as an error. Everything else
//! degrades to a plain keyboard decision.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{
    build_field_prompt, extract_json, sanitize_json, Classifier, ClassifierError, ClassifierResult,
    CLASSIFIER_INSTRUCTIONS,
};
use crate::agent::{Agent, Availability, LLMProvider};
use crate::field::{Decision, FieldDescriptor};

pub struct GenerativeClassifier {
    agent: Arc<Agent>,
    max_turns: Option<u32>,
}

impl GenerativeClassifier {
    /// A single-agent classifier using the built-in instructions.
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        let agent = Agent::new("FieldClassifier", CLASSIFIER_INSTRUCTIONS, model, provider);
        Self::from_agent(Arc::new(agent))
    }

    /// Classify through a caller-built agent, typically one with sub-agents
    /// registered as tools.
    pub fn from_agent(agent: Arc<Agent>) -> Self {
        Self {
            agent,
            max_turns: None,
        }
    }

    /// Bounds the model invocations of each classification's call tree.
    pub fn with_max_turns(mut self, max_turns: Option<u32>) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    /// Decodes a raw model response, reporting why it could not be used.
    pub fn try_parse(text: &str) -> ClassifierResult<Decision> {
        let candidate = extract_json(text)
            .ok_or_else(|| ClassifierError::MalformedOutput("empty response".to_string()))?;
        let json = sanitize_json(&candidate);
        serde_json::from_str(&json).map_err(|e| {
            debug!(target: "contextual::brain", "[Generative] Attempted to decode: {}", json);
            ClassifierError::MalformedOutput(e.to_string())
        })
    }

    /// Decodes a raw model response, falling back for anything unusable.
    pub fn parse_response(text: &str, field_name: &str) -> Decision {
        match Self::try_parse(text) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(target: "contextual::brain", "[Generative] {} Using fallback.", e);
                Decision::fallback(field_name)
            }
        }
    }
}

#[async_trait]
impl Classifier for GenerativeClassifier {
    fn name(&self) -> &str {
        "Generative"
    }

    async fn classify(&self, descriptor: &FieldDescriptor) -> ClassifierResult<Decision> {
        let availability = self.agent.provider().availability(self.agent.model()).await;
        if let Availability::Unavailable(reason) = availability {
            error!(target: "contextual::brain", "[Generative] Model not available: {}", reason);
            return Err(ClassifierError::Unavailable(reason));
        }

        let prompt = build_field_prompt(descriptor);
        info!(target: "contextual::brain", "[Generative] Sending prompt for field: {}", descriptor.name);

        match self.agent.run(&prompt, self.max_turns).await {
            Ok(text) => {
                let decision = Self::parse_response(&text, &descriptor.name);
                info!(target: "contextual::brain", "[Generative] Parsed Decision: {}", decision.strategy());
                Ok(decision)
            }
            Err(e) if e.is_surfaced() => Err(e),
            Err(e) => {
                error!(target: "contextual::brain", "[Generative] Session Error: {}", e);
                warn!(target: "contextual::brain", "[Generative] Error encountered, using safe fallback.");
                Ok(Decision::fallback(&descriptor.name))
            }
        }
    }
}
