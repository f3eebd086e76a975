//! Per-step outcomes collected over one walkthrough run.
use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    CreateDatabase,
    CreateCollection,
    InsertDocument,
    ReadAsMap,
    ReadAsRaw,
    ReadAsTree,
    UpdateDocument,
    ReadUpdated,
    DeleteDocument,
    BulkInsert,
    QuerySelect,
    QueryRemove,
    DropDatabase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub step: Step,
    /// Human-readable action, e.g. `create database mydb`.
    pub action: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StepOutcome {
    pub fn ok(step: Step, action: impl Into<String>) -> Self {
        Self {
            step,
            action: action.into(),
            status: StepStatus::Ok,
            message: None,
        }
    }

    pub fn failed(step: Step, action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step,
            action: action.into(),
            status: StepStatus::Failed,
            message: Some(message.into()),
        }
    }

    /// The stderr line for a failed step.
    pub fn failure_line(&self) -> Option<String> {
        let message = self.message.as_deref()?;
        Some(format!("Failed to {}: {}", self.action, message))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkthroughReport {
    pub steps: Vec<StepOutcome>,
    pub succeeded: usize,
    pub failed: usize,
}

impl WalkthroughReport {
    pub fn record(&mut self, outcome: StepOutcome) {
        match outcome.status {
            StepStatus::Ok => self.succeeded += 1,
            StepStatus::Failed => self.failed += 1,
        }
        self.steps.push(outcome);
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Walkthrough finished: {} steps, {} succeeded, {} failed",
            self.steps.len(),
            self.succeeded,
            self.failed
        )
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize walkthrough report")
    }
}
