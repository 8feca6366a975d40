//! Agent - a language model session with instructions and tools
//!
//! An agent answers a prompt with one model invocation, or several when the
//! model asks for a tool through an `[ACTION]` tag. Agents can be handed to
//! other agents as tools, forming a call tree that shares one turn budget.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{AgentTool, LLMProvider, Tool, ToolCall, ToolOutput};
use crate::brain::{extract_json, ClassifierError, ClassifierResult};
use crate::orchestrator::TurnContext;
use crate::utils::{truncate_text, TruncationPolicy};

const ACTION_TAG: &str = "[ACTION]";

pub type PromptTransformer = Arc<dyn Fn(&str) -> String + Send + Sync>;

pub struct Agent {
    name: String,
    instructions: String,
    model: String,
    provider: Arc<dyn LLMProvider>,
    tools: Vec<Arc<dyn Tool>>,
    prompt_transformer: Option<PromptTransformer>,
    max_tool_rounds: usize,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: impl Into<String>,
        provider: Arc<dyn LLMProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: model.into(),
            provider,
            tools: Vec::new(),
            prompt_transformer: None,
            max_tool_rounds: 4,
        }
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Rewrites every prompt before it reaches the model.
    pub fn with_prompt_transformer(mut self, transformer: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.prompt_transformer = Some(Arc::new(transformer));
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Wraps this agent so other agents can call it.
    pub fn as_tool(self: &Arc<Self>, description: impl Into<String>, name: Option<String>) -> AgentTool {
        AgentTool::new(name.unwrap_or_else(|| self.name.clone()), description, self.clone())
    }

    /// Entry point for a top-level request: starts a fresh turn budget that
    /// every sub-agent reached from here draws from.
    pub async fn run(&self, prompt: &str, max_turns: Option<u32>) -> ClassifierResult<String> {
        let turns = TurnContext::new(max_turns);
        self.respond(prompt, &turns).await
    }

    /// Answers within an existing budget. Used directly by `AgentTool`.
    pub async fn respond(&self, prompt: &str, turns: &TurnContext) -> ClassifierResult<String> {
        let mut transcript = match &self.prompt_transformer {
            Some(transform) => transform(prompt),
            None => prompt.to_string(),
        };
        let system = self.system_prompt();
        let mut rounds = 0;

        loop {
            turns.check_and_increment(&self.name).await?;

            debug!(target: "contextual::brain", "[Agent: {}] Responding to prompt...", self.name);
            let response = self
                .provider
                .generate(&self.model, transcript.clone(), Some(system.clone()))
                .await
                .map_err(|e| ClassifierError::InferenceFailure(e.to_string()))?;
            debug!(
                target: "contextual::brain",
                "[Agent: {}] content: {}",
                self.name,
                truncate_text(&response, TruncationPolicy::Bytes(2048))
            );

            if self.tools.is_empty() {
                return Ok(response);
            }
            let Some(call) = parse_tool_call(&response) else {
                return Ok(response);
            };
            if rounds >= self.max_tool_rounds {
                warn!(target: "contextual::brain", "[Agent: {}] Tool round limit reached, ignoring call to {}", self.name, call.name);
                return Ok(response);
            }

            let observation = self.call_tool(&call, turns).await;
            let action = serde_json::to_string(&call).unwrap_or_else(|_| call.name.clone());
            transcript.push_str(&format!(
                "\n\n{}\n{}\n[OBSERVATION]\n{}\n",
                ACTION_TAG, action, observation.summary
            ));
            rounds += 1;
        }
    }

    async fn call_tool(&self, call: &ToolCall, turns: &TurnContext) -> ToolOutput {
        match self.tools.iter().find(|t| t.name() == call.name) {
            Some(tool) => tool.execute(call.parameters.clone(), turns).await,
            None => {
                warn!(target: "contextual::brain", "[Agent: {}] Unknown tool requested: {}", self.name, call.name);
                ToolOutput::failure(format!("Unknown tool '{}'", call.name))
            }
        }
    }

    fn system_prompt(&self) -> String {
        if self.tools.is_empty() {
            return self.instructions.clone();
        }

        let mut prompt = self.instructions.clone();
        prompt.push_str("\n\n## Available Tools\n");
        for tool in &self.tools {
            prompt.push_str(&format!(
                "- {}: {}\n  parameters: {}\n",
                tool.name(),
                tool.description(),
                tool.parameters()
            ));
        }
        prompt.push_str(&format!(
            "\nTo call a tool, reply with only:\n{}\n{{\"name\": \"tool_name\", \"parameters\": {{\"prompt\": \"...\"}}}}\nThe result will be given to you as [OBSERVATION]. Otherwise answer directly.\n",
            ACTION_TAG
        ));
        prompt
    }
}

/// Reads a `[ACTION]` tagged tool call from a model response.
fn parse_tool_call(response: &str) -> Option<ToolCall> {
    let idx = response.find(ACTION_TAG)?;
    let after = &response[idx + ACTION_TAG.len()..];
    let json = extract_json(after)?;
    let value: Value = serde_json::from_str(&json).ok()?;
    serde_json::from_value(value).ok()
}
