//! Orchestrator scenarios against scripted language models.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use contextual_agency::agent::{Agent, Availability, CachedProvider, LLMCache, LLMProvider, Tool};
use contextual_agency::brain::{ClassifierError, GenerativeClassifier, CLASSIFIER_INSTRUCTIONS, TURN_BUDGET_HINT};
use contextual_agency::field::NativeControl;
use contextual_agency::orchestrator::{RequestState, TurnContext};
use contextual_agency::{ClassifierOrchestrator, FieldDescriptor, RuleBasedClassifier, Strategy};

/// Replays canned responses in order and counts every invocation.
struct ScriptedProvider {
    responses: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
    availability: Availability,
}

impl ScriptedProvider {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            calls: AtomicUsize::new(0),
            availability: Availability::Available,
        }
    }

    fn unavailable(reason: &str) -> Self {
        Self {
            availability: Availability::Unavailable(reason.to_string()),
            ..Self::new(&[])
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn generate(&self, _model: &str, _prompt: String, _system: Option<String>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| anyhow!("script exhausted"))
    }

    async fn availability(&self, _model: &str) -> Availability {
        self.availability.clone()
    }
}

const GEO_CALL: &str = "Let me check.\n[ACTION]\n{\"name\": \"geo_expert\", \"parameters\": {\"prompt\": \"Is 'Dove abiti?' asking for a place?\"}}";
const GEO_ANSWER: &str = "Yes, it asks for a home address.";
const MAP_DECISION: &str = "```json\n{\"strategy\": \"map\", \"label\": \"Dove abiti?\", \"map\": {\"showUserLocation\": true}}\n```";

/// A classifier agent that consults a geography sub-agent, both backed by
/// the same scripted model.
fn agent_tree(provider: Arc<ScriptedProvider>, max_turns: u32) -> GenerativeClassifier {
    let geo = Arc::new(Agent::new(
        "GeoExpert",
        "You decide whether a question asks for a location.",
        "mock",
        provider.clone(),
    ));
    let classifier = Agent::new("FieldClassifier", CLASSIFIER_INSTRUCTIONS, "mock", provider)
        .with_tool(Arc::new(geo.as_tool("Answers geography questions", Some("geo_expert".to_string()))));
    GenerativeClassifier::from_agent(Arc::new(classifier)).with_max_turns(Some(max_turns))
}

#[tokio::test]
async fn test_budget_of_n_allows_n_inferences() {
    let provider = Arc::new(ScriptedProvider::new(&[GEO_CALL, GEO_ANSWER, MAP_DECISION]));
    let orch = ClassifierOrchestrator::new(RuleBasedClassifier::new(), Some(agent_tree(provider.clone(), 3)));

    let timed = orch
        .classify_generative(&FieldDescriptor::new("Dove abiti?"))
        .await
        .unwrap();
    assert_eq!(timed.decision.strategy(), Strategy::Map);
    assert_eq!(timed.decision.label.as_deref(), Some("Dove abiti?"));
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_inference_past_budget_is_refused() {
    let provider = Arc::new(ScriptedProvider::new(&[GEO_CALL, GEO_ANSWER, MAP_DECISION]));
    let orch = ClassifierOrchestrator::new(RuleBasedClassifier::new(), Some(agent_tree(provider.clone(), 2)));

    let err = orch
        .classify_generative(&FieldDescriptor::new("Dove abiti?"))
        .await
        .unwrap_err();
    assert_eq!(err, ClassifierError::TurnBudgetExceeded { limit: 2 });
    assert_eq!(err.recovery_hint(), Some(TURN_BUDGET_HINT));
    assert!(err.to_string().contains(TURN_BUDGET_HINT));
    // The refused third turn never reached the model.
    assert_eq!(provider.calls(), 2);
    assert!(orch.generative_available());
}

#[tokio::test]
async fn test_sub_agent_sees_budget_error_as_observation() {
    let provider = Arc::new(ScriptedProvider::new(&[GEO_ANSWER]));
    let geo = Arc::new(Agent::new("GeoExpert", "Geography.", "mock", provider.clone()));
    let tool = geo.as_tool("Answers geography questions", None);

    let turns = TurnContext::new(Some(0));
    let output = tool
        .execute(serde_json::json!({"prompt": "Is this an address?"}), &turns)
        .await;
    assert!(!output.success);
    assert!(output.summary.contains(TURN_BUDGET_HINT));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_each_request_gets_a_fresh_budget() {
    let provider = Arc::new(ScriptedProvider::new(&[
        GEO_CALL, GEO_ANSWER, MAP_DECISION, GEO_CALL, GEO_ANSWER, MAP_DECISION,
    ]));
    let orch = ClassifierOrchestrator::new(RuleBasedClassifier::new(), Some(agent_tree(provider.clone(), 3)));

    for _ in 0..2 {
        let decision = orch.classify(&FieldDescriptor::new("Dove abiti?")).await;
        assert_eq!(decision.strategy(), Strategy::Map);
    }
    assert_eq!(provider.calls(), 6);
}

#[tokio::test]
async fn test_comparison_survives_budget_failure() {
    let provider = Arc::new(ScriptedProvider::new(&[GEO_CALL, GEO_ANSWER]));
    let orch = ClassifierOrchestrator::new(RuleBasedClassifier::new(), Some(agent_tree(provider, 1)));

    let comparison = orch.compare(&FieldDescriptor::new("Data di nascita")).await;
    assert_eq!(comparison.state, RequestState::Completed);
    assert!(comparison.generative.is_none());
    assert!(matches!(
        comparison.generative_error,
        Some(ClassifierError::TurnBudgetExceeded { limit: 1 })
    ));
    let rules = comparison.rules.unwrap();
    assert_eq!(rules.decision.native_config().unwrap().control, NativeControl::DatePicker);
}

#[tokio::test]
async fn test_unusable_output_becomes_fallback() {
    let provider = Arc::new(ScriptedProvider::new(&["A date picker, probably."]));
    let generative = GenerativeClassifier::new(provider, "mock");
    let orch = ClassifierOrchestrator::new(RuleBasedClassifier::new(), Some(generative));

    let comparison = orch.compare(&FieldDescriptor::new("Data di nascita")).await;
    let generative = comparison.generative.as_ref().unwrap();
    assert_eq!(generative.decision.strategy(), Strategy::Keyboard);
    assert_eq!(generative.decision.placeholder.as_deref(), Some("Enter Data di nascita"));
    assert!(comparison.generative_error.is_none());
    assert!(comparison.summary().starts_with("[Compare] RuleBased: "));
}

#[tokio::test]
async fn test_transport_error_becomes_fallback() {
    // Empty script: every generate call fails.
    let provider = Arc::new(ScriptedProvider::new(&[]));
    let orch = ClassifierOrchestrator::new(
        RuleBasedClassifier::new(),
        Some(GenerativeClassifier::new(provider.clone(), "mock")),
    );

    let timed = orch.classify_generative(&FieldDescriptor::new("Firma")).await.unwrap();
    assert_eq!(timed.decision.strategy(), Strategy::Keyboard);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_unavailable_model_is_surfaced_then_skipped() {
    let provider = Arc::new(ScriptedProvider::unavailable("model 'mock' not found"));
    let orch = ClassifierOrchestrator::new(
        RuleBasedClassifier::new(),
        Some(GenerativeClassifier::new(provider.clone(), "mock")),
    );

    let err = orch.classify_generative(&FieldDescriptor::new("Email")).await.unwrap_err();
    assert!(matches!(err, ClassifierError::Unavailable(_)));
    assert!(!orch.generative_available());

    let decision = orch.classify(&FieldDescriptor::new("Email")).await;
    assert_eq!(decision.placeholder.as_deref(), Some("email@example.com"));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_concurrent_requests_do_not_share_budgets() {
    struct Fixed;

    #[async_trait]
    impl LLMProvider for Fixed {
        async fn generate(&self, _model: &str, _prompt: String, _system: Option<String>) -> Result<String> {
            tokio::task::yield_now().await;
            Ok("{\"strategy\": \"signature\"}".to_string())
        }
    }

    let generative = GenerativeClassifier::new(Arc::new(Fixed), "mock").with_max_turns(Some(1));
    let orch = Arc::new(ClassifierOrchestrator::new(RuleBasedClassifier::new(), Some(generative)));

    let fields: Vec<_> = (0..16).map(|i| FieldDescriptor::new(format!("Field {}", i))).collect();
    let results = futures::future::join_all(fields.iter().map(|f| orch.classify_generative(f))).await;

    assert_eq!(results.len(), 16);
    for result in results {
        assert_eq!(result.unwrap().decision.strategy(), Strategy::Signature);
    }
}

#[tokio::test]
async fn test_cached_provider_answers_repeat_fields() {
    let inner = Arc::new(ScriptedProvider::new(&["{\"strategy\": \"signature\"}"]));
    let cache = Arc::new(LLMCache::new());
    let provider = Arc::new(CachedProvider::new(inner.clone(), cache.clone()));
    let orch = ClassifierOrchestrator::new(
        RuleBasedClassifier::new(),
        Some(GenerativeClassifier::new(provider, "mock")),
    );

    let descriptor = FieldDescriptor::new("Firma");
    for _ in 0..3 {
        assert_eq!(orch.classify(&descriptor).await.strategy(), Strategy::Signature);
    }
    assert_eq!(inner.calls(), 1);
    assert_eq!(cache.len().await, 1);
}
