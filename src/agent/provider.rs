use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

/// Whether a backend can serve requests right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable(String),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(&self, model: &str, prompt: String, system: Option<String>) -> Result<String>;

    /// Checked before any inference is attempted.
    async fn availability(&self, _model: &str) -> Availability {
        Availability::Available
    }
}

pub struct OllamaProvider {
    client: ollama_rs::Ollama,
}

impl OllamaProvider {
    pub fn new(client: ollama_rs::Ollama) -> Self {
        Self { client }
    }
}

/// `llama3.2` matches an installed `llama3.2:latest`.
fn model_matches(installed: &str, requested: &str) -> bool {
    installed == requested
        || (!requested.contains(':') && installed.strip_suffix(":latest") == Some(requested))
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    async fn generate(&self, model: &str, prompt: String, system: Option<String>) -> Result<String> {
        use ollama_rs::generation::chat::{request::ChatMessageRequest, ChatMessage};

        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(ChatMessage::system(sys));
        }
        messages.push(ChatMessage::user(prompt));

        let res = self
            .client
            .send_chat_messages(ChatMessageRequest::new(model.to_string(), messages))
            .await
            .context("Ollama chat request failed")?;

        Ok(res.message.content)
    }

    async fn availability(&self, model: &str) -> Availability {
        match self.client.list_local_models().await {
            Ok(models) if models.iter().any(|m| model_matches(&m.name, model)) => Availability::Available,
            Ok(_) => Availability::Unavailable(format!("model '{}' is not installed in Ollama", model)),
            Err(e) => Availability::Unavailable(format!("Ollama is not reachable: {}", e)),
        }
    }
}

pub struct OpenAICompatibleProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAICompatibleProvider {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn generate(&self, model: &str, prompt: String, system: Option<String>) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(json!({ "role": "system", "content": sys }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        // Low temperature: the answer is a schema-bound JSON object.
        let body = json!({
            "model": model,
            "messages": messages,
            "temperature": 0.2,
        });

        let mut request = self.client.post(self.endpoint("chat/completions")).json(&body);

        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request.send().await?.error_for_status()?;
        let json: serde_json::Value = res.json().await?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .context("Failed to parse content from OpenAI response")?;

        Ok(content.to_string())
    }

    async fn availability(&self, _model: &str) -> Availability {
        let mut request = self.client.get(self.endpoint("models"));
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        match request.send().await.and_then(|res| res.error_for_status()) {
            Ok(_) => Availability::Available,
            Err(e) => Availability::Unavailable(format!("{} is not reachable: {}", self.base_url, e)),
        }
    }
}
