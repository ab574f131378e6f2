//! Generation refills: turning technique proposals into queued jobs.

use tracing::debug;

use tb_types::{Configuration, DesiredResult, Measurement, ParamSpace, RunId, TuneError, TuneResult};

use crate::queue::JobQueue;

/// One proposed evaluation, before it becomes a job.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub configuration: Configuration,
    /// Higher drains first within the generation.
    pub priority: f64,
}

impl Candidate {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            priority: 0.0,
        }
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }
}

/// A search technique supplied by the caller.
///
/// Asked once per generation for a batch of candidates; may return an
/// empty batch when it has nothing to propose right now, and may signal
/// permanent depletion via [`Technique::depleted`].
pub trait Technique: Send {
    /// Produce the next generation's candidates.
    fn propose(&mut self, space: &ParamSpace) -> TuneResult<Vec<Candidate>>;

    /// Feedback hook so adaptive techniques can learn from completed
    /// measurements.
    fn observe(&mut self, _configuration: &Configuration, _measurement: &Measurement) {}

    /// True once this technique will never propose again.
    fn depleted(&self) -> bool {
        false
    }

    /// Human-readable technique name.
    fn name(&self) -> &str;
}

/// Outcome of one refill attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refill {
    /// This many jobs were enqueued.
    Added(usize),
    /// No technique produced a candidate this generation.
    Empty,
    /// Every technique is permanently depleted.
    Exhausted,
}

/// Advances the generation counter and refills the job queue from the
/// registered techniques.
pub struct GenerationScheduler {
    techniques: Vec<Box<dyn Technique>>,
    generation: u64,
}

impl GenerationScheduler {
    pub fn new(techniques: Vec<Box<dyn Technique>>) -> Self {
        Self {
            techniques,
            generation: 0,
        }
    }

    /// Generation number assigned to the most recent refill.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ask every technique for candidates and enqueue them as one
    /// generation.
    ///
    /// Each technique's batch is enqueued before the next technique runs,
    /// so a failing technique never discards jobs already enqueued. A
    /// candidate outside the space is a validation error.
    pub fn refill(
        &mut self,
        space: &ParamSpace,
        queue: &mut JobQueue,
        run_id: RunId,
    ) -> TuneResult<Refill> {
        if self.techniques.is_empty() || self.techniques.iter().all(|t| t.depleted()) {
            return Ok(Refill::Exhausted);
        }

        self.generation += 1;
        let generation = self.generation;
        let mut added = 0usize;

        for technique in &mut self.techniques {
            let candidates = technique.propose(space)?;
            if candidates.is_empty() {
                continue;
            }
            let mut batch = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                if !space.validate(&candidate.configuration) {
                    return Err(TuneError::Validation(format!(
                        "technique {} proposed a configuration outside the space: {}",
                        technique.name(),
                        candidate.configuration
                    )));
                }
                batch.push(DesiredResult::new(
                    run_id,
                    generation,
                    candidate.priority,
                    candidate.configuration,
                ));
            }
            added += batch.len();
            queue.enqueue_batch(batch);
        }

        if added == 0 {
            Ok(Refill::Empty)
        } else {
            debug!(generation, added, "refilled job queue");
            Ok(Refill::Added(added))
        }
    }

    /// Forward a completed measurement to every technique.
    pub fn observe(&mut self, configuration: &Configuration, measurement: &Measurement) {
        for technique in &mut self.techniques {
            technique.observe(configuration, measurement);
        }
    }
}
