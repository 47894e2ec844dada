//! Per-item outcomes of an installer run.

use super::object::{ObjectId, ObjectKind};
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the orchestrator attempted for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ApplyLicense,
    EnsurePresent,
    EnsureAbsent,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::ApplyLicense => "apply license",
            Operation::EnsurePresent => "ensure present",
            Operation::EnsureAbsent => "ensure absent",
        })
    }
}

/// Lifecycle of a single item: `Pending -> InFlight -> {Succeeded, Failed}`.
///
/// `NotAttempted` is reached from `Pending` (or from `InFlight` on cancellation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Pending,
    InFlight,
    Succeeded,
    Failed,
    NotAttempted,
}

impl ItemState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ItemState::Succeeded | ItemState::Failed | ItemState::NotAttempted
        )
    }

    /// Returns the next state if the transition is allowed.
    pub fn transition(self, next: ItemState) -> Option<ItemState> {
        use ItemState::*;
        match (self, next) {
            (Pending, InFlight) | (Pending, NotAttempted) => Some(next),
            (InFlight, Succeeded) | (InFlight, Failed) | (InFlight, NotAttempted) => Some(next),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub kind: ObjectKind,
    pub display_name: String,
    pub operation: Operation,
    pub state: ItemState,
    pub object_id: Option<ObjectId>,
    pub error: Option<ApiError>,
}

impl RunResult {
    pub fn pending(kind: ObjectKind, display_name: impl Into<String>, operation: Operation) -> Self {
        Self {
            kind,
            display_name: display_name.into(),
            operation,
            state: ItemState::Pending,
            object_id: None,
            error: None,
        }
    }

    fn advance(&mut self, next: ItemState) {
        debug_assert!(
            self.state.transition(next).is_some(),
            "illegal transition {:?} -> {:?} for {}",
            self.state,
            next,
            self.display_name
        );
        self.state = next;
    }

    pub fn start(&mut self) {
        self.advance(ItemState::InFlight);
    }

    pub fn succeed(&mut self, object_id: Option<ObjectId>) {
        self.advance(ItemState::Succeeded);
        self.object_id = object_id;
    }

    pub fn fail(&mut self, error: ApiError) {
        self.advance(ItemState::Failed);
        self.error = Some(error);
    }

    pub fn skip(&mut self) {
        self.advance(ItemState::NotAttempted);
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' ({}): {:?}",
            self.kind, self.display_name, self.operation, self.state
        )?;
        if let Some(id) = &self.object_id {
            write!(f, " [{}]", id)?;
        }
        if let Some(err) = &self.error {
            write!(f, " - {}", err)?;
        }
        Ok(())
    }
}

/// Ordered results of one run plus summary counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    results: Vec<RunResult>,
}

impl RunReport {
    pub fn new(results: Vec<RunResult>) -> Self {
        Self { results }
    }

    pub fn push(&mut self, result: RunResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    fn count(&self, state: ItemState) -> usize {
        self.results.iter().filter(|r| r.state == state).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(ItemState::Succeeded)
    }

    pub fn failed(&self) -> usize {
        self.count(ItemState::Failed)
    }

    pub fn not_attempted(&self) -> usize {
        self.count(ItemState::NotAttempted)
    }

    /// True when every item succeeded.
    pub fn is_success(&self) -> bool {
        self.results
            .iter()
            .all(|r| r.state == ItemState::Succeeded)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RunResult> {
        self.results
            .iter()
            .filter(|r| r.state == ItemState::Failed)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed, {} not attempted",
            self.succeeded(),
            self.failed(),
            self.not_attempted()
        )
    }
}
