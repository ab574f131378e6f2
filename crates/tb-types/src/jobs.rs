//! Requested evaluations and their measured outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::ProtocolError;
use crate::params::Configuration;

/// Lifecycle state of a requested evaluation.
///
/// A job is created `Requested` and moves to `Complete` exactly once,
/// when its measurement is reported. It never reverts and is never
/// deleted during a live run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Requested,
    Complete,
}

/// One requested evaluation of a configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesiredResult {
    pub id: Uuid,
    pub run_id: Uuid,
    /// Batch number assigned at creation; monotonically increasing
    /// across refills of one run.
    pub generation: u64,
    /// Higher priority drains first within a generation.
    pub priority: f64,
    pub state: JobState,
    pub configuration: Configuration,
    pub result: Option<Measurement>,
    pub created_at: DateTime<Utc>,
}

impl DesiredResult {
    pub fn new(
        run_id: Uuid,
        generation: u64,
        priority: f64,
        configuration: Configuration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            generation,
            priority,
            state: JobState::Requested,
            configuration,
            result: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the reported measurement and move to `Complete`.
    ///
    /// Fails if this job already holds a result; the transition happens
    /// at most once.
    pub fn mark_complete(&mut self, measurement: Measurement) -> Result<(), ProtocolError> {
        if self.state == JobState::Complete || self.result.is_some() {
            return Err(ProtocolError::AlreadyReported { job_id: self.id });
        }
        self.result = Some(measurement);
        self.state = JobState::Complete;
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.state == JobState::Complete
    }
}

/// The measured outcome of evaluating one configuration.
///
/// The caller constructs it with the cost metrics; the session fills in
/// the collection bookkeeping and back-references when it is reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Primary objective value (elapsed time, energy, loss, ...).
    pub time: f64,
    /// Secondary named metrics.
    pub metrics: HashMap<String, f64>,
    /// When the session received this measurement.
    pub collection_date: Option<DateTime<Utc>>,
    /// Wall-clock seconds between handing out the configuration and the
    /// report, from the session's lap timer.
    pub collection_cost: Option<f64>,
    /// Whether this measurement strictly improved on the best seen when
    /// it was classified. Unset until classified; set at most once.
    pub was_new_best: Option<bool>,
    pub job_id: Option<Uuid>,
    pub run_id: Option<Uuid>,
    pub machine: Option<String>,
}

impl Measurement {
    pub fn new(time: f64) -> Self {
        Self {
            time,
            metrics: HashMap::new(),
            collection_date: None,
            collection_cost: None,
            was_new_best: None,
            job_id: None,
            run_id: None,
            machine: None,
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    fn sample_job() -> DesiredResult {
        let cfg = Configuration::from_pairs([("x", ParamValue::Int(3))]);
        DesiredResult::new(Uuid::new_v4(), 1, 0.0, cfg)
    }

    #[test]
    fn job_starts_requested() {
        let job = sample_job();
        assert_eq!(job.state, JobState::Requested);
        assert!(job.result.is_none());
        assert!(!job.is_complete());
    }

    #[test]
    fn mark_complete_transitions_once() {
        let mut job = sample_job();
        job.mark_complete(Measurement::new(1.5)).unwrap();
        assert!(job.is_complete());
        assert_eq!(job.result.as_ref().unwrap().time, 1.5);

        let err = job.mark_complete(Measurement::new(2.0)).unwrap_err();
        match err {
            ProtocolError::AlreadyReported { job_id } => assert_eq!(job_id, job.id),
            other => panic!("unexpected error: {other:?}"),
        }
        // First result untouched
        assert_eq!(job.result.as_ref().unwrap().time, 1.5);
    }

    #[test]
    fn measurement_builder() {
        let m = Measurement::new(0.25)
            .with_metric("energy", 12.0)
            .with_metric("accuracy", 0.9);
        assert_eq!(m.time, 0.25);
        assert_eq!(m.metric("energy"), Some(12.0));
        assert_eq!(m.metric("missing"), None);
        assert!(m.was_new_best.is_none());
        assert!(m.collection_date.is_none());
    }
}
