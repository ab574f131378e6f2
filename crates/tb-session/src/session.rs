//! The pull/push bridge between a measurement caller and the search
//! process.
//!
//! A [`TuningSession`] owns one run: the caller asks for the next
//! configuration, evaluates it on its own schedule, and reports the
//! measured cost back. Internally the session drains generation batches
//! from the scheduler, tracks the best completed measurement through a
//! pluggable [`Objective`], and batches persistence behind the adapter's
//! commit policy. Once the techniques are exhausted the best
//! configuration is frozen and every further `next_configuration` call
//! returns it.

use std::time::Instant;

use chrono::Utc;
use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use tb_store::{PersistenceAdapter, StoreRecord};
use tb_types::{
    Configuration, DesiredResult, Measurement, ParamSpace, ProgramRef, ProtocolError, RunError,
    RunId, TuneResult, TuningRun,
};

use crate::events::NewBestEvent;
use crate::objective::Objective;
use crate::queue::JobQueue;
use crate::scheduler::{GenerationScheduler, Refill};

/// Caller-facing settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub label: String,
    /// Recorded on the run and on every measurement.
    pub machine: String,
    pub program: ProgramRef,
}

impl SessionConfig {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            machine: "local".to_string(),
            program: ProgramRef::default(),
        }
    }

    pub fn with_machine(mut self, machine: impl Into<String>) -> Self {
        self.machine = machine.into();
        self
    }

    pub fn with_program(mut self, program: ProgramRef) -> Self {
        self.program = program;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new("unnamed")
    }
}

/// Running best measurement and the configuration that produced it.
#[derive(Debug, Clone)]
struct BestSoFar {
    configuration: Configuration,
    measurement: Measurement,
}

/// Session controller for one tuning run.
pub struct TuningSession {
    run: TuningRun,
    space: ParamSpace,
    scheduler: GenerationScheduler,
    objective: Box<dyn Objective>,
    persistence: PersistenceAdapter,
    queue: JobQueue,
    /// Job handed out by the last `next_configuration`, awaiting report.
    awaiting: Option<DesiredResult>,
    /// Completed (and abandoned) jobs: the run's auditable history.
    history: Vec<DesiredResult>,
    best: Option<BestSoFar>,
    events: Option<Sender<NewBestEvent>>,
    lap: Instant,
    consecutive_empty_refills: u32,
    closed: bool,
}

impl TuningSession {
    /// Start a run. Writes and flushes the run record; installs no
    /// process-wide state (call [`crate::init_tracing`] separately).
    pub fn new(
        space: ParamSpace,
        scheduler: GenerationScheduler,
        objective: Box<dyn Objective>,
        persistence: PersistenceAdapter,
        config: SessionConfig,
    ) -> TuneResult<Self> {
        let run = TuningRun::new(config.label, config.machine, objective.name(), config.program);
        info!(run_id = %run.id, label = %run.label, objective = %run.objective, "starting tuning run");

        persistence.write(&StoreRecord::Run(run.clone()))?;
        persistence.flush()?;

        Ok(Self {
            run,
            space,
            scheduler,
            objective,
            persistence,
            queue: JobQueue::new(),
            awaiting: None,
            history: Vec::new(),
            best: None,
            events: None,
            lap: Instant::now(),
            consecutive_empty_refills: 0,
            closed: false,
        })
    }

    /// Attach a sink for new-best notifications.
    pub fn with_event_sink(mut self, sink: Sender<NewBestEvent>) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn run(&self) -> &TuningRun {
        &self.run
    }

    pub fn run_id(&self) -> RunId {
        self.run.id
    }

    /// Completed and abandoned jobs, in the order they left the queue.
    pub fn history(&self) -> &[DesiredResult] {
        &self.history
    }

    /// True once the best configuration is frozen.
    pub fn is_exhausted(&self) -> bool {
        self.run.is_finalized()
    }

    /// log10 of the estimated search-space size, for display only.
    pub fn search_space_order(&self) -> f64 {
        self.space.estimate_size().log10()
    }

    /// Best configuration seen so far, if any result has been classified.
    pub fn best_configuration(&self) -> Option<Configuration> {
        self.best.as_ref().map(|b| b.configuration.clone())
    }

    /// Hand out the next configuration to evaluate.
    ///
    /// Refills the queue from the techniques when it runs dry; two
    /// consecutive empty refills or an explicit depletion signal
    /// finalize the run, after which the frozen best configuration is
    /// returned on every call.
    pub fn next_configuration(&mut self) -> TuneResult<Configuration> {
        if let Some(configuration) = &self.run.final_config {
            return Ok(configuration.clone());
        }

        if let Some(stale) = self.awaiting.take() {
            warn!(
                job_id = %stale.id,
                "configuration handed out twice without a report; abandoning the first job"
            );
            self.history.push(stale);
        }

        loop {
            if let Ok(job) = self.queue.pop_next() {
                let configuration = job.configuration.clone();
                debug!(job_id = %job.id, generation = job.generation, "handing out configuration");
                self.awaiting = Some(job);
                self.lap = Instant::now();
                return Ok(configuration);
            }

            match self
                .scheduler
                .refill(&self.space, &mut self.queue, self.run.id)?
            {
                Refill::Added(count) => {
                    self.consecutive_empty_refills = 0;
                    debug!(generation = self.scheduler.generation(), count, "queue refilled");
                }
                Refill::Empty => {
                    self.consecutive_empty_refills += 1;
                    if self.consecutive_empty_refills >= 2 {
                        return self.finalize();
                    }
                }
                Refill::Exhausted => return self.finalize(),
            }
        }
    }

    /// Report the measurement for the configuration handed out by the
    /// last `next_configuration` call.
    ///
    /// A persistence failure propagates, but the job's in-memory
    /// transition to complete is not rolled back.
    pub fn report_result(&mut self, mut measurement: Measurement) -> TuneResult<()> {
        if self.run.is_finalized() {
            debug!(run_id = %self.run.id, "measurement reported after finalization; ignoring");
            return Ok(());
        }

        let mut job = self.awaiting.take().ok_or(ProtocolError::NoPendingJob)?;

        measurement.collection_date = Some(Utc::now());
        measurement.collection_cost = Some(self.lap.elapsed().as_secs_f64());
        measurement.job_id = Some(job.id);
        measurement.run_id = Some(self.run.id);
        measurement.machine = Some(self.run.machine.clone());

        let feedback = measurement.clone();
        job.mark_complete(measurement)?;
        debug!(job_id = %job.id, time = feedback.time, "job complete");

        let job_record = StoreRecord::Job(job.clone());
        let configuration = job.configuration.clone();
        self.history.push(job);

        self.persistence.write(&job_record)?;
        self.persistence.write(&StoreRecord::Measurement(feedback.clone()))?;
        self.persistence.flush()?;
        self.persistence.commit(false)?;

        classify_unflagged(
            &mut self.history,
            &mut self.best,
            self.objective.as_ref(),
            self.events.as_ref(),
            self.run.id,
        );

        self.scheduler.observe(&configuration, &feedback);
        Ok(())
    }

    /// Explicitly freeze the best-and-final configuration, closing the
    /// run to further evaluations.
    pub fn set_final_configuration(&mut self, configuration: Configuration) {
        info!(run_id = %self.run.id, %configuration, "final configuration set explicitly");
        self.run.final_config = Some(configuration);
    }

    /// Finish the run: freeze the best configuration if not already
    /// frozen, mark the run complete, force a durable commit and release
    /// the persistence connection. Idempotent.
    pub fn close(&mut self) -> TuneResult<Configuration> {
        if let Some(stale) = self.awaiting.take() {
            warn!(job_id = %stale.id, "closing with an unreported configuration outstanding");
            self.history.push(stale);
        }

        let configuration = match &self.run.final_config {
            Some(configuration) => configuration.clone(),
            None => self.finalize()?,
        };

        if self.closed {
            return Ok(configuration);
        }

        self.run.mark_complete();
        info!(run_id = %self.run.id, %configuration, "tuning run complete");

        self.persistence.write(&StoreRecord::Run(self.run.clone()))?;
        self.persistence.close()?;
        self.closed = true;
        Ok(configuration)
    }

    /// Pick the best completed measurement and freeze its configuration.
    fn finalize(&mut self) -> TuneResult<Configuration> {
        let best = match &self.best {
            Some(best) => best,
            None => return Err(RunError::Degenerate.into()),
        };
        info!(
            run_id = %self.run.id,
            configuration = %best.configuration,
            time = best.measurement.time,
            "search exhausted; freezing best configuration"
        );
        self.run.final_config = Some(best.configuration.clone());
        Ok(best.configuration.clone())
    }
}

/// Classify every completed measurement whose `was_new_best` flag is
/// still unset, in ascending collection-date order.
///
/// The first result ever classified seeds the running best with its flag
/// false; each later result gets flag true plus a notification iff it
/// strictly improves on the running best. Flagged results are never
/// revisited, so the scan is idempotent per result and the outcome
/// depends only on (timestamp, cost) pairs, not on report order.
fn classify_unflagged(
    history: &mut [DesiredResult],
    best: &mut Option<BestSoFar>,
    objective: &dyn Objective,
    events: Option<&Sender<NewBestEvent>>,
    run_id: RunId,
) {
    let mut pending: Vec<usize> = history
        .iter()
        .enumerate()
        .filter(|(_, job)| {
            job.is_complete()
                && job
                    .result
                    .as_ref()
                    .is_some_and(|m| m.was_new_best.is_none())
        })
        .map(|(index, _)| index)
        .collect();
    pending.sort_by_key(|&index| {
        history[index]
            .result
            .as_ref()
            .and_then(|m| m.collection_date)
    });

    for index in pending {
        let Some(measurement) = history[index].result.clone() else {
            continue;
        };
        let improved = match best.as_mut() {
            None => {
                *best = Some(BestSoFar {
                    configuration: history[index].configuration.clone(),
                    measurement: measurement.clone(),
                });
                false
            }
            Some(current) => {
                if objective.is_better(&measurement, &current.measurement) {
                    *best = Some(BestSoFar {
                        configuration: history[index].configuration.clone(),
                        measurement: measurement.clone(),
                    });
                    true
                } else {
                    false
                }
            }
        };

        if let Some(stored) = history[index].result.as_mut() {
            stored.was_new_best = Some(improved);
        }

        if improved {
            info!(job_id = %history[index].id, time = measurement.time, "new best result");
            if let Some(sink) = events {
                let event = NewBestEvent::new(
                    run_id,
                    history[index].id,
                    history[index].configuration.clone(),
                    measurement.time,
                );
                if sink.try_send(event).is_err() {
                    warn!("new-best event dropped: sink full or disconnected");
                }
            }
        }
    }
}
