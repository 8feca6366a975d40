//! Tools an agent may call while answering, including other agents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

use super::Agent;
use crate::orchestrator::TurnContext;

/// Output from a tool execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolOutput {
    pub success: bool,
    /// Text handed back to the calling model as the observation.
    pub summary: String,
    pub error: Option<String>,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            success: true,
            summary: content.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            summary: format!("Error: {}", error),
            error: Some(error),
        }
    }
}

/// A tool call request parsed from LLM output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub parameters: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> String;

    fn description(&self) -> String;

    /// JSON schema of the parameters object.
    fn parameters(&self) -> Value;

    /// Runs the tool inside the caller's turn budget. Failures are reported
    /// in the output so the calling model can recover.
    async fn execute(&self, params: Value, turns: &TurnContext) -> ToolOutput;
}

/// Exposes an agent as a tool of another agent.
pub struct AgentTool {
    name: String,
    description: String,
    agent: Arc<Agent>,
}

impl AgentTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, agent: Arc<Agent>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            agent,
        }
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "A prompt for the agent to respond to."
                }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, params: Value, turns: &TurnContext) -> ToolOutput {
        let Some(prompt) = params["prompt"].as_str() else {
            return ToolOutput::failure("Missing prompt");
        };

        debug!(target: "contextual::brain", "[AgentTool] Running sub-agent: {}", self.name);
        match self.agent.respond(prompt, turns).await {
            Ok(answer) => ToolOutput::success(answer),
            Err(e) => {
                error!(target: "contextual::brain", "[AgentTool] Error in sub-agent {}: {}", self.name, e);
                ToolOutput::failure(e.to_string())
            }
        }
    }
}
