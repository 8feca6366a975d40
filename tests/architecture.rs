//! Architecture Verification Suite
//!
//! Everything a renderer may hold across tasks must be thread-safe, and
//! any classifier must plug into the orchestrator through the trait alone.

#[cfg(test)]
mod architecture_tests {
    use std::sync::Arc;

    use contextual_agency::agent::{Agent, AgentTool, CachedProvider, LLMProvider};
    use contextual_agency::brain::{Classifier, GenerativeClassifier, PresetClassifier, RuleBasedClassifier};
    use contextual_agency::field::{Decision, FieldDescriptor, FieldValue};
    use contextual_agency::orchestrator::{ClassifierOrchestrator, EventBus, TurnContext, TurnMonitor};

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_classifiers_are_thread_safe() {
        assert_send_sync::<RuleBasedClassifier>();
        assert_send_sync::<GenerativeClassifier>();
        assert_send_sync::<PresetClassifier>();
        assert_send_sync::<ClassifierOrchestrator>();
    }

    #[test]
    fn test_agents_are_thread_safe() {
        assert_send_sync::<Agent>();
        assert_send_sync::<AgentTool>();
        assert_send_sync::<CachedProvider>();
        assert_send_sync::<TurnMonitor>();
        assert_send_sync::<TurnContext>();
        assert_send_sync::<EventBus>();
    }

    #[test]
    fn test_data_is_thread_safe() {
        assert_send_sync::<FieldDescriptor>();
        assert_send_sync::<Decision>();
        assert_send_sync::<FieldValue>();
    }

    // Classifiers and providers are usable as trait objects.
    #[test]
    fn test_trait_objects() {
        let classifiers: Vec<Arc<dyn Classifier>> = vec![
            Arc::new(RuleBasedClassifier::new()),
            Arc::new(PresetClassifier::new()),
        ];
        let names: Vec<&str> = classifiers.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["RuleBased", "Preset"]);

        fn accepts_provider(_: Option<Arc<dyn LLMProvider>>) {}
        accepts_provider(None);
    }

    #[tokio::test]
    async fn test_orchestrator_over_trait_objects() {
        let rules: Arc<dyn Classifier> = Arc::new(RuleBasedClassifier::new());
        let preset: Arc<dyn Classifier> = Arc::new(PresetClassifier::new());
        let orch = ClassifierOrchestrator::new(rules, Some(preset));

        let decision = orch.classify(&FieldDescriptor::new("Firma")).await;
        assert_eq!(decision.label.as_deref(), Some("Signature"));
    }
}
