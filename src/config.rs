//! Engine configuration
//!
//! Loaded from a YAML or JSON file, then overlaid with `CONTEXTUAL_*`
//! environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

use crate::agent::{
    Agent, CachedProvider, LLMCache, LLMProvider, OllamaProvider, OpenAICompatibleProvider, DEFAULT_CACHE_CAPACITY,
};
use crate::brain::{GenerativeClassifier, GeoPolicy, RuleBasedClassifier, CLASSIFIER_INSTRUCTIONS};

pub const DEFAULT_MODEL: &str = "llama3.2:3b";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Ollama,
    OpenaiCompatible,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Ollama,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
        }
    }
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// The path did not exist.
    Defaults(PathBuf),
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "loaded from {}", path.display()),
            ConfigSource::Defaults(path) => write!(f, "no config at {}, using defaults", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub provider: ProviderConfig,
    pub enable_generative: bool,
    /// Model invocations allowed per top-level request; `None` is unbounded.
    pub max_turns: Option<u32>,
    pub max_tool_rounds: usize,
    pub geo_policy: GeoPolicy,
    pub cache_responses: bool,
    /// Responses kept before the oldest is evicted.
    pub cache_capacity: usize,
    pub log_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            enable_generative: true,
            max_turns: Some(8),
            max_tool_rounds: 4,
            geo_policy: GeoPolicy::default(),
            cache_responses: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            log_dir: None,
        }
    }
}

impl EngineConfig {
    /// Reads `path`, or returns the defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_source(path).map(|(config, _)| config)
    }

    /// Like `load`, also reporting where the values came from. Nothing is
    /// logged here: the subscriber is usually installed from the result.
    pub fn load_with_source(path: impl AsRef<Path>) -> Result<(Self, ConfigSource)> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok((Self::default(), ConfigSource::Defaults(path.to_path_buf())));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok((config, ConfigSource::File(path.to_path_buf())))
    }

    /// Overlays `CONTEXTUAL_*` variables from the process environment.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(kind) = var("CONTEXTUAL_PROVIDER") {
            self.provider.kind = match kind.trim().to_lowercase().as_str() {
                "ollama" => ProviderKind::Ollama,
                "openai" | "openai_compatible" | "openai-compatible" => ProviderKind::OpenaiCompatible,
                other => anyhow::bail!("Unknown CONTEXTUAL_PROVIDER '{}'", other),
            };
        }
        if let Some(url) = var("CONTEXTUAL_BASE_URL") {
            self.provider.base_url = Some(url);
        }
        if let Some(model) = var("CONTEXTUAL_MODEL") {
            self.provider.model = model;
        }
        if let Some(key) = var("CONTEXTUAL_API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Some(turns) = var("CONTEXTUAL_MAX_TURNS") {
            self.max_turns = match turns.trim() {
                "" | "none" | "unbounded" => None,
                n => Some(n.parse().with_context(|| format!("Invalid CONTEXTUAL_MAX_TURNS '{}'", n))?),
            };
        }
        if let Some(flag) = var("CONTEXTUAL_GENERATIVE") {
            self.enable_generative = matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        Ok(self)
    }

    pub fn build_provider(&self) -> Result<Arc<dyn LLMProvider>> {
        let provider: Arc<dyn LLMProvider> = match self.provider.kind {
            ProviderKind::Ollama => {
                let url = self.provider.base_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL);
                let parsed = reqwest::Url::parse(url).with_context(|| format!("Invalid Ollama URL '{}'", url))?;
                let host = parsed
                    .host_str()
                    .with_context(|| format!("Ollama URL '{}' has no host", url))?;
                let port = parsed.port_or_known_default().unwrap_or(11434);
                let client = ollama_rs::Ollama::new(format!("{}://{}", parsed.scheme(), host), port);
                Arc::new(OllamaProvider::new(client))
            }
            ProviderKind::OpenaiCompatible => {
                let Some(url) = self.provider.base_url.clone() else {
                    anyhow::bail!("openai_compatible provider requires base_url");
                };
                if self.provider.api_key.is_none() {
                    warn!(target: "contextual::core", "No API key configured for {}", url);
                }
                Arc::new(OpenAICompatibleProvider::new(url, self.provider.api_key.clone()))
            }
        };

        if self.cache_responses {
            return Ok(Arc::new(CachedProvider::new(provider, Arc::new(LLMCache::with_capacity(self.cache_capacity)))));
        }
        Ok(provider)
    }

    pub fn rules_classifier(&self) -> RuleBasedClassifier {
        RuleBasedClassifier::new().with_geo_policy(self.geo_policy)
    }

    /// `None` when generative classification is switched off.
    pub fn generative_classifier(&self) -> Result<Option<GenerativeClassifier>> {
        if !self.enable_generative {
            return Ok(None);
        }
        let agent = Agent::new(
            "FieldClassifier",
            CLASSIFIER_INSTRUCTIONS,
            self.provider.model.clone(),
            self.build_provider()?,
        )
        .with_max_tool_rounds(self.max_tool_rounds);
        Ok(Some(
            GenerativeClassifier::from_agent(Arc::new(agent)).with_max_turns(self.max_turns),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::load(dir.path().join("contextual.yaml")).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_turns, Some(8));
        assert_eq!(config.provider.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_load_reports_source() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("contextual.yaml");
        let (_, source) = EngineConfig::load_with_source(&missing).unwrap();
        assert_eq!(source, ConfigSource::Defaults(missing.clone()));
        assert!(source.to_string().contains("using defaults"));

        std::fs::write(&missing, "max_turns: 2").unwrap();
        let (config, source) = EngineConfig::load_with_source(&missing).unwrap();
        assert_eq!(config.max_turns, Some(2));
        assert_eq!(source, ConfigSource::File(missing));
    }

    #[test]
    fn test_load_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "provider:\n  kind: openai_compatible\n  base_url: http://localhost:1234/v1\n  model: qwen2.5\ngeo_policy: map\nmax_turns: 3\ncache_responses: true"
        )
        .unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::OpenaiCompatible);
        assert_eq!(config.provider.model, "qwen2.5");
        assert_eq!(config.geo_policy, GeoPolicy::Map);
        assert_eq!(config.max_turns, Some(3));
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert!(config.enable_generative);
        assert!(config.build_provider().is_ok());
    }

    #[test]
    fn test_load_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"enable_generative": false, "max_tool_rounds": 1, "cache_capacity": 16}}"#).unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert!(!config.enable_generative);
        assert_eq!(config.max_tool_rounds, 1);
        assert_eq!(config.cache_capacity, 16);
        assert!(config.generative_classifier().unwrap().is_none());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "max_turns: [not, a, number]").unwrap();
        assert!(EngineConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_env_overlay() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CONTEXTUAL_PROVIDER", "openai"),
            ("CONTEXTUAL_BASE_URL", "http://127.0.0.1:8080/v1"),
            ("CONTEXTUAL_MAX_TURNS", "none"),
            ("CONTEXTUAL_GENERATIVE", "off"),
        ]);
        let config = EngineConfig::default()
            .apply_vars(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.provider.kind, ProviderKind::OpenaiCompatible);
        assert_eq!(config.provider.base_url.as_deref(), Some("http://127.0.0.1:8080/v1"));
        assert_eq!(config.max_turns, None);
        assert!(!config.enable_generative);
    }

    #[test]
    fn test_env_overlay_rejects_garbage() {
        let bad_turns = EngineConfig::default().apply_vars(|k| (k == "CONTEXTUAL_MAX_TURNS").then(|| "lots".to_string()));
        assert!(bad_turns.is_err());

        let bad_kind = EngineConfig::default().apply_vars(|k| (k == "CONTEXTUAL_PROVIDER").then(|| "bard".to_string()));
        assert!(bad_kind.is_err());
    }

    #[test]
    fn test_openai_requires_base_url() {
        let mut config = EngineConfig::default();
        config.provider.kind = ProviderKind::OpenaiCompatible;
        assert!(config.build_provider().is_err());
    }
}
