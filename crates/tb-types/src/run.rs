//! Run-level bookkeeping: one record per end-to-end tuning attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::params::Configuration;

/// Unique run identifier.
pub type RunId = Uuid;

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Running,
    Complete,
}

/// Identifies the program being tuned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRef {
    pub project: String,
    pub program: String,
    pub version: String,
}

impl ProgramRef {
    pub fn new(
        project: impl Into<String>,
        program: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            program: program.into(),
            version: version.into(),
        }
    }
}

impl Default for ProgramRef {
    fn default() -> Self {
        Self::new("unknown", "unknown", "0")
    }
}

/// One end-to-end tuning attempt.
///
/// Owns all jobs and measurements transitively; `final_config` stays
/// unset until the search is exhausted or explicitly closed, and is
/// frozen thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningRun {
    pub id: RunId,
    pub label: String,
    pub machine: String,
    /// Name of the objective ordering results (e.g. "minimize_time").
    pub objective: String,
    pub program: ProgramRef,
    pub state: RunState,
    pub final_config: Option<Configuration>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl TuningRun {
    pub fn new(
        label: impl Into<String>,
        machine: impl Into<String>,
        objective: impl Into<String>,
        program: ProgramRef,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            machine: machine.into(),
            objective: objective.into(),
            program,
            state: RunState::Running,
            final_config: None,
            start_date: Utc::now(),
            end_date: None,
        }
    }

    pub fn mark_complete(&mut self) {
        self.state = RunState::Complete;
        self.end_date = Some(Utc::now());
    }

    pub fn is_finalized(&self) -> bool {
        self.final_config.is_some()
    }
}
