//! Orchestrator Module
//!
//! Runs classifiers on behalf of a caller: one at a time, side by side for
//! comparison, or as a never-failing `classify` that prefers the generative
//! classifier and falls back to the keyword rules.

mod budget;
mod events;

pub use budget::{TurnContext, TurnMonitor};
pub use events::{EngineEvent, EventBus, ENGINE_EVENT_BUS};

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::brain::{Classifier, ClassifierError, ClassifierResult, GenerativeClassifier, RuleBasedClassifier};
use crate::field::{Decision, FieldDescriptor};

/// Lifecycle of one top-level classification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// A decision together with who produced it and how long it took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedDecision {
    pub classifier: String,
    pub decision: Decision,
    pub latency_ms: f64,
}

impl TimedDecision {
    /// `[RuleBased] "E-mail:" → keyboard (0ms)`
    pub fn log_line(&self, field: &str) -> String {
        format!(
            "[{}] \"{}\" → {} ({:.0}ms)",
            self.classifier,
            field,
            self.decision.strategy(),
            self.latency_ms
        )
    }
}

/// Outcome of running both classifiers against the same field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub request_id: Uuid,
    pub field: String,
    pub state: RequestState,
    pub rules: Option<TimedDecision>,
    pub generative: Option<TimedDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_error: Option<ClassifierError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generative_error: Option<ClassifierError>,
}

impl Comparison {
    pub fn summary(&self) -> String {
        let side = |timed: &Option<TimedDecision>, fallback: &str| match timed {
            Some(t) => format!("{}: {:.2}ms", t.classifier, t.latency_ms),
            None => format!("{}: n/a", fallback),
        };
        format!(
            "[Compare] {} vs {}",
            side(&self.rules, "RuleBased"),
            side(&self.generative, "Generative")
        )
    }

    /// The generative answer when there is one, otherwise the rules answer.
    pub fn preferred(&self) -> Option<&Decision> {
        self.generative
            .as_ref()
            .or(self.rules.as_ref())
            .map(|t| &t.decision)
    }
}

/// Generic over both classifiers so either side can be swapped for a test
/// double or a `PresetClassifier`.
pub struct ClassifierOrchestrator<R = RuleBasedClassifier, G = GenerativeClassifier> {
    rules: R,
    generative: Option<G>,
    generative_unavailable: AtomicBool,
    events: Arc<EventBus>,
}

impl<R: Classifier> ClassifierOrchestrator<R, GenerativeClassifier> {
    pub fn rules_only(rules: R) -> Self {
        Self::new(rules, None)
    }
}

impl<R: Classifier, G: Classifier> ClassifierOrchestrator<R, G> {
    pub fn new(rules: R, generative: Option<G>) -> Self {
        Self {
            rules,
            generative,
            generative_unavailable: AtomicBool::new(false),
            events: ENGINE_EVENT_BUS.clone(),
        }
    }

    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn generative(&self) -> Option<&G> {
        self.generative.as_ref()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// False when no generative classifier is configured, or once it has
    /// reported itself unavailable during this session.
    pub fn generative_available(&self) -> bool {
        self.active_generative().is_some()
    }

    /// Runs a single classifier as its own request.
    pub async fn run_single<C: Classifier + ?Sized>(
        &self,
        classifier: &C,
        descriptor: &FieldDescriptor,
    ) -> ClassifierResult<TimedDecision> {
        let request_id = self.start_request(descriptor);
        let result = self.timed(request_id, classifier, descriptor).await;
        match &result {
            Ok(timed) => self.events.publish(EngineEvent::RequestCompleted {
                request_id,
                strategy: timed.decision.strategy(),
            }),
            Err(e) => self.events.publish(EngineEvent::RequestFailed {
                request_id,
                reason: e.to_string(),
            }),
        }
        result
    }

    /// Runs the rules and the generative classifier concurrently. A failure
    /// on one side leaves the other side's result intact.
    pub async fn compare(&self, descriptor: &FieldDescriptor) -> Comparison {
        let request_id = self.start_request(descriptor);

        let rules_task = self.timed(request_id, &self.rules, descriptor);
        let generative_task = async {
            match self.active_generative() {
                Some(generative) => Some(self.timed(request_id, generative, descriptor).await),
                None => None,
            }
        };
        let (rules_result, generative_result) = tokio::join!(rules_task, generative_task);

        let (rules, rules_error) = split(rules_result);
        let (generative, generative_error) = match generative_result {
            Some(result) => split(result),
            None => (None, None),
        };
        if let Some(e) = &generative_error {
            self.note_generative_error(e);
        }

        let mut comparison = Comparison {
            request_id,
            field: descriptor.name.clone(),
            state: RequestState::Running,
            rules,
            generative,
            rules_error,
            generative_error,
        };
        comparison.state = match comparison.preferred() {
            Some(decision) => {
                self.events.publish(EngineEvent::RequestCompleted {
                    request_id,
                    strategy: decision.strategy(),
                });
                RequestState::Completed
            }
            None => {
                self.events.publish(EngineEvent::RequestFailed {
                    request_id,
                    reason: "no classifier produced a decision".to_string(),
                });
                RequestState::Failed
            }
        };
        info!(target: "contextual::core", "{}", comparison.summary());
        comparison
    }

    /// Always produces a decision: generative first when available, then
    /// the rules, then the plain keyboard fallback.
    pub async fn classify(&self, descriptor: &FieldDescriptor) -> Decision {
        let request_id = self.start_request(descriptor);

        // A blank name gives the model nothing to work with.
        if let Some(generative) = self.active_generative().filter(|_| !descriptor.is_degenerate()) {
            match self.timed(request_id, generative, descriptor).await {
                Ok(timed) => return self.complete(request_id, timed.decision),
                Err(e) => {
                    self.note_generative_error(&e);
                    warn!(target: "contextual::core", "Generative classification failed ({}), using rules", e);
                }
            }
        }

        let decision = self.rules_or_fallback(request_id, descriptor).await;
        self.complete(request_id, decision)
    }

    /// Rules only, never touching the generative classifier. Used after a
    /// generative failure the caller has already seen, so nothing is retried.
    pub async fn classify_rules(&self, descriptor: &FieldDescriptor) -> Decision {
        let request_id = self.start_request(descriptor);
        let decision = self.rules_or_fallback(request_id, descriptor).await;
        self.complete(request_id, decision)
    }

    /// Runs only the generative classifier, surfacing `Unavailable` and
    /// `TurnBudgetExceeded` to the caller.
    pub async fn classify_generative(&self, descriptor: &FieldDescriptor) -> ClassifierResult<TimedDecision> {
        let Some(generative) = &self.generative else {
            return Err(ClassifierError::Unavailable(
                "generative classification is disabled".to_string(),
            ));
        };
        let result = self.run_single(generative, descriptor).await;
        if let Err(e) = &result {
            self.note_generative_error(e);
        }
        result
    }

    /// Classifies every field of a form, in order.
    pub async fn classify_all(&self, descriptors: &[FieldDescriptor]) -> Vec<Decision> {
        let mut decisions = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            decisions.push(self.classify(descriptor).await);
        }
        info!(target: "contextual::core", "Classified {} fields", decisions.len());
        decisions
    }

    async fn rules_or_fallback(&self, request_id: Uuid, descriptor: &FieldDescriptor) -> Decision {
        match self.timed(request_id, &self.rules, descriptor).await {
            Ok(timed) => timed.decision,
            Err(_) => Decision::fallback(&descriptor.name),
        }
    }

    fn active_generative(&self) -> Option<&G> {
        if self.generative_unavailable.load(Ordering::Acquire) {
            return None;
        }
        self.generative.as_ref()
    }

    fn note_generative_error(&self, error: &ClassifierError) {
        if matches!(error, ClassifierError::Unavailable(_))
            && !self.generative_unavailable.swap(true, Ordering::AcqRel)
        {
            warn!(target: "contextual::core", "Generative classifier unavailable, continuing with rules only: {}", error);
        }
    }

    fn start_request(&self, descriptor: &FieldDescriptor) -> Uuid {
        let request_id = Uuid::new_v4();
        self.events.publish(EngineEvent::RequestStarted {
            request_id,
            field: descriptor.name.clone(),
        });
        request_id
    }

    fn complete(&self, request_id: Uuid, decision: Decision) -> Decision {
        self.events.publish(EngineEvent::RequestCompleted {
            request_id,
            strategy: decision.strategy(),
        });
        decision
    }

    async fn timed<C: Classifier + ?Sized>(
        &self,
        request_id: Uuid,
        classifier: &C,
        descriptor: &FieldDescriptor,
    ) -> ClassifierResult<TimedDecision> {
        let start = Instant::now();
        let result = classifier.classify(descriptor).await;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(decision) => {
                let timed = TimedDecision {
                    classifier: classifier.name().to_string(),
                    decision,
                    latency_ms,
                };
                info!(target: "contextual::core", "{}", timed.log_line(&descriptor.name));
                self.events.publish(EngineEvent::ClassifierFinished {
                    request_id,
                    classifier: timed.classifier.clone(),
                    strategy: timed.decision.strategy(),
                    latency_ms,
                });
                Ok(timed)
            }
            Err(e) => {
                warn!(target: "contextual::core", "[{}] \"{}\" failed after {:.0}ms: {}", classifier.name(), descriptor.name, latency_ms, e);
                self.events.publish(EngineEvent::ClassifierFailed {
                    request_id,
                    classifier: classifier.name().to_string(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

fn split(result: ClassifierResult<TimedDecision>) -> (Option<TimedDecision>, Option<ClassifierError>) {
    match result {
        Ok(timed) => (Some(timed), None),
        Err(e) => (None, Some(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::PresetClassifier;
    use crate::field::{NativeConfig, Strategy};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Barrier;

    struct Failing(ClassifierError);

    #[async_trait]
    impl Classifier for Failing {
        fn name(&self) -> &str {
            "Failing"
        }

        async fn classify(&self, _descriptor: &FieldDescriptor) -> ClassifierResult<Decision> {
            Err(self.0.clone())
        }
    }

    /// Only answers once its sibling has reached the same point.
    struct Rendezvous {
        barrier: Arc<Barrier>,
        decision: Decision,
    }

    #[async_trait]
    impl Classifier for Rendezvous {
        fn name(&self) -> &str {
            "Rendezvous"
        }

        async fn classify(&self, _descriptor: &FieldDescriptor) -> ClassifierResult<Decision> {
            self.barrier.wait().await;
            Ok(self.decision.clone())
        }
    }

    fn orchestrator(generative: ClassifierError) -> ClassifierOrchestrator<RuleBasedClassifier, Failing> {
        ClassifierOrchestrator::new(RuleBasedClassifier::new(), Some(Failing(generative)))
            .with_event_bus(Arc::new(EventBus::new()))
    }

    #[tokio::test]
    async fn test_compare_isolates_generative_failure() {
        let orch = orchestrator(ClassifierError::InferenceFailure("connection reset".into()));
        let comparison = orch.compare(&FieldDescriptor::new("E-mail:")).await;

        assert_eq!(comparison.state, RequestState::Completed);
        assert_eq!(comparison.rules.as_ref().unwrap().decision.strategy(), Strategy::Keyboard);
        assert!(comparison.generative.is_none());
        assert!(matches!(comparison.generative_error, Some(ClassifierError::InferenceFailure(_))));
        assert!(comparison.summary().ends_with("vs Generative: n/a"));
        // Not an availability problem, so generative stays enabled.
        assert!(orch.generative_available());
    }

    #[tokio::test]
    async fn test_unavailable_disables_generative_for_session() {
        let orch = orchestrator(ClassifierError::Unavailable("model not pulled".into()));
        assert!(orch.generative_available());

        let first = orch.compare(&FieldDescriptor::new("Firma")).await;
        assert!(matches!(first.generative_error, Some(ClassifierError::Unavailable(_))));
        assert!(!orch.generative_available());

        let second = orch.compare(&FieldDescriptor::new("Firma")).await;
        assert!(second.generative_error.is_none());
        assert_eq!(second.preferred().unwrap().strategy(), Strategy::Signature);
    }

    #[tokio::test]
    async fn test_classify_falls_back_on_turn_budget() {
        let orch = orchestrator(ClassifierError::TurnBudgetExceeded { limit: 2 });
        let decision = orch.classify(&FieldDescriptor::new("Data di nascita")).await;
        assert_eq!(decision.strategy(), Strategy::Native);
    }

    #[tokio::test]
    async fn test_classify_prefers_generative() {
        let generative = PresetClassifier::new().with_preset("Address", Decision::map(Default::default()));
        let orch = ClassifierOrchestrator::new(RuleBasedClassifier::new(), Some(generative));

        let decision = orch.classify(&FieldDescriptor::new("Address")).await;
        assert_eq!(decision.strategy(), Strategy::Map);
    }

    #[tokio::test]
    async fn test_classify_generative_surfaces_errors() {
        let orch = ClassifierOrchestrator::rules_only(RuleBasedClassifier::new());
        assert!(!orch.generative_available());
        assert!(matches!(
            orch.classify_generative(&FieldDescriptor::new("Email")).await,
            Err(ClassifierError::Unavailable(_))
        ));

        let orch = orchestrator(ClassifierError::TurnBudgetExceeded { limit: 1 });
        let err = orch.classify_generative(&FieldDescriptor::new("Email")).await.unwrap_err();
        assert_eq!(err.recovery_hint(), Some(crate::brain::TURN_BUDGET_HINT));
    }

    /// Fails with a fixed error and counts how often it was asked.
    struct Counting {
        error: ClassifierError,
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl Classifier for Counting {
        fn name(&self) -> &str {
            "Counting"
        }

        async fn classify(&self, _descriptor: &FieldDescriptor) -> ClassifierResult<Decision> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }
    }

    #[tokio::test]
    async fn test_rules_after_budget_error_does_not_retry_generative() {
        let generative = Counting {
            error: ClassifierError::TurnBudgetExceeded { limit: 2 },
            calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let orch = ClassifierOrchestrator::new(RuleBasedClassifier::new(), Some(generative));
        let descriptor = FieldDescriptor::new("Firma");

        assert!(orch.classify_generative(&descriptor).await.is_err());
        let decision = orch.classify_rules(&descriptor).await;

        assert_eq!(decision.strategy(), Strategy::Signature);
        assert_eq!(orch.generative().unwrap().calls.load(Ordering::SeqCst), 1);
        // A budget error does not switch generative off.
        assert!(orch.generative_available());
    }

    #[tokio::test]
    async fn test_blank_field_skips_generative() {
        let generative = Counting {
            error: ClassifierError::InferenceFailure("unreachable".to_string()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let orch = ClassifierOrchestrator::new(RuleBasedClassifier::new(), Some(generative));

        let decision = orch.classify(&FieldDescriptor::new("  \t ")).await;
        assert_eq!(decision.strategy(), Strategy::Keyboard);
        assert_eq!(orch.generative().unwrap().calls.load(Ordering::SeqCst), 0);

        orch.classify(&FieldDescriptor::new("Firma")).await;
        assert_eq!(orch.generative().unwrap().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_compare_runs_classifiers_concurrently() {
        let barrier = Arc::new(Barrier::new(2));
        let rules = Rendezvous { barrier: barrier.clone(), decision: Decision::signature() };
        let generative = Rendezvous { barrier, decision: Decision::native(NativeConfig::date_picker()) };
        let orch = ClassifierOrchestrator::new(rules, Some(generative));

        let comparison = tokio::time::timeout(Duration::from_secs(5), orch.compare(&FieldDescriptor::new("x")))
            .await
            .expect("classifiers were run one after the other");
        assert!(comparison.rules.is_some());
        assert_eq!(comparison.preferred().unwrap().strategy(), Strategy::Native);
    }

    #[tokio::test]
    async fn test_events_published() {
        let bus = Arc::new(EventBus::new());
        let mut rx = bus.subscribe();
        let orch = ClassifierOrchestrator::rules_only(RuleBasedClassifier::new()).with_event_bus(bus);

        let timed = orch.run_single(orch.rules(), &FieldDescriptor::new("Phone")).await.unwrap();
        assert_eq!(timed.classifier, "RuleBased");

        let started = rx.recv().await.unwrap();
        let finished = rx.recv().await.unwrap();
        let completed = rx.recv().await.unwrap();
        assert!(matches!(started, EngineEvent::RequestStarted { .. }));
        assert!(matches!(finished, EngineEvent::ClassifierFinished { .. }));
        assert_eq!(
            completed,
            EngineEvent::RequestCompleted { request_id: started.request_id(), strategy: Strategy::Keyboard }
        );
    }

    #[tokio::test]
    async fn test_classify_all_keeps_order() {
        let orch = ClassifierOrchestrator::rules_only(RuleBasedClassifier::new());
        let fields = vec![
            FieldDescriptor::new("Firma"),
            FieldDescriptor::new("Email"),
            FieldDescriptor::new("Colore preferito"),
        ];
        let strategies: Vec<_> = orch.classify_all(&fields).await.iter().map(|d| d.strategy()).collect();
        assert_eq!(strategies, vec![Strategy::Signature, Strategy::Keyboard, Strategy::Native]);
    }

    #[test]
    fn test_log_line() {
        let timed = TimedDecision {
            classifier: "RuleBased".into(),
            decision: Decision::signature(),
            latency_ms: 3.4,
        };
        assert_eq!(timed.log_line("Firma"), "[RuleBased] \"Firma\" → signature (3ms)");
    }
}
