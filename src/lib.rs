//! Contextual Agency
//!
//! Decides how a form field should be filled in:
//! - Offline keyword rules (English and Italian)
//! - A language-model classifier with JSON repair and a safe fallback
//! - An orchestrator for single runs, side-by-side comparison and
//!   turn-budgeted agent call trees

pub mod agent;
pub mod brain;
pub mod config;
pub mod field;
pub mod orchestrator;
pub mod utils;

// Re-exports for convenience
pub use brain::{Classifier, ClassifierError, ClassifierResult, GenerativeClassifier, GeoPolicy, RuleBasedClassifier};
pub use config::EngineConfig;
pub use field::{Decision, FieldDescriptor, Strategy};
pub use orchestrator::{ClassifierOrchestrator, Comparison, TimedDecision};
