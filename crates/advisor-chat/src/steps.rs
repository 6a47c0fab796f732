//! Thinking step bookkeeping for one in-flight turn

use advisor_wire::{StepEvent, StepIcon, StepStatus};
use serde::{Deserialize, Serialize};

/// Format an elapsed time in milliseconds as seconds with two decimals
pub fn format_duration(elapsed_ms: i64) -> String {
    format!("{:.2}s", elapsed_ms.max(0) as f64 / 1000.0)
}

/// Transient progress indicator shown before the answer starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingStep {
    pub step: String,
    pub status: StepStatus,
    pub message: String,
    pub icon: StepIcon,
    /// Epoch milliseconds of the first event for this step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl ThinkingStep {
    pub fn is_done(&self) -> bool {
        self.status == StepStatus::Result
    }
}

/// Ordered set of thinking steps, unique by step name
#[derive(Debug, Clone, Default)]
pub struct StepTracker {
    steps: Vec<ThinkingStep>,
}

impl StepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a status event into the set.
    ///
    /// A known step is updated in place and keeps its start time; reaching
    /// `result` attaches the elapsed duration. An unknown step is appended and
    /// starts its clock at `now_ms`.
    pub fn apply(&mut self, event: &StepEvent, now_ms: i64) {
        match self.steps.iter_mut().find(|s| s.step == event.step) {
            Some(existing) => {
                let duration = match (event.status, existing.start_time) {
                    (StepStatus::Result, Some(start)) => Some(format_duration(now_ms - start)),
                    _ => None,
                };
                *existing = ThinkingStep {
                    step: event.step.clone(),
                    status: event.status,
                    message: event.message.clone(),
                    icon: event.icon.clone(),
                    start_time: existing.start_time,
                    duration,
                };
            }
            None => {
                tracing::debug!(step = %event.step, "new thinking step");
                self.steps.push(ThinkingStep {
                    step: event.step.clone(),
                    status: event.status,
                    message: event.message.clone(),
                    icon: event.icon.clone(),
                    start_time: Some(now_ms),
                    duration: None,
                });
            }
        }
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    pub fn steps(&self) -> &[ThinkingStep] {
        &self.steps
    }

    pub fn snapshot(&self) -> Vec<ThinkingStep> {
        self.steps.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}
