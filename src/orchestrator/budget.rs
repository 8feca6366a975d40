//! Turn budget for agentic call trees.
//!
//! One `TurnMonitor` is created per top-level request and shared by every
//! agent and sub-agent that request reaches. Each model invocation takes a
//! turn; the first invocation past the limit fails with
//! `TurnBudgetExceeded`. The counter sits behind a mutex so sibling
//! sub-agents running concurrently cannot race on it.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::brain::{ClassifierError, ClassifierResult};

#[derive(Debug)]
pub struct TurnMonitor {
    max_turns: u32,
    used: Mutex<u32>,
}

impl TurnMonitor {
    pub fn new(max_turns: u32) -> Self {
        Self {
            max_turns,
            used: Mutex::new(0),
        }
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    pub async fn used(&self) -> u32 {
        *self.used.lock().await
    }

    /// Takes one turn, or fails once the budget is spent.
    pub async fn check_and_increment(&self) -> ClassifierResult<u32> {
        let mut used = self.used.lock().await;
        *used += 1;
        if *used > self.max_turns {
            return Err(ClassifierError::TurnBudgetExceeded {
                limit: self.max_turns,
            });
        }
        Ok(*used)
    }
}

/// The budget handed down a request's call tree. Cloning shares the counter.
#[derive(Debug, Clone, Default)]
pub struct TurnContext {
    monitor: Option<Arc<TurnMonitor>>,
}

impl TurnContext {
    /// Fresh context for a new top-level request. `None` means unbounded.
    pub fn new(max_turns: Option<u32>) -> Self {
        Self {
            monitor: max_turns.map(|max| Arc::new(TurnMonitor::new(max))),
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_bounded(&self) -> bool {
        self.monitor.is_some()
    }

    pub async fn used(&self) -> Option<u32> {
        match &self.monitor {
            Some(monitor) => Some(monitor.used().await),
            None => None,
        }
    }

    pub async fn check_and_increment(&self, agent: &str) -> ClassifierResult<()> {
        let Some(monitor) = &self.monitor else {
            return Ok(());
        };

        match monitor.check_and_increment().await {
            Ok(turn) => {
                debug!(target: "contextual::core", "[Turns] {} took turn {}/{}", agent, turn, monitor.max_turns());
                Ok(())
            }
            Err(e) => {
                warn!(target: "contextual::core", "[Turns] {} refused: {}", agent, e);
                Err(e)
            }
        }
    }
}
