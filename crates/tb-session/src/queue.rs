//! Ordered batch of pending evaluations for the current generations.

use std::cmp::Ordering;
use std::collections::VecDeque;

use tb_types::{DesiredResult, QueueError};

/// FIFO of requested jobs, drained by (generation ascending, priority
/// descending).
///
/// Ordering is applied per batch: `enqueue_batch` sorts only the incoming
/// jobs and appends them, so already-pending jobs are never reordered or
/// interleaved with a newer generation.
#[derive(Debug, Default)]
pub struct JobQueue {
    pending: VecDeque<DesiredResult>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort the batch by (generation ascending, priority descending),
    /// ties keeping their proposal order, and append it.
    pub fn enqueue_batch(&mut self, mut batch: Vec<DesiredResult>) {
        batch.sort_by(|a, b| {
            a.generation.cmp(&b.generation).then_with(|| {
                b.priority
                    .partial_cmp(&a.priority)
                    .unwrap_or(Ordering::Equal)
            })
        });
        self.pending.extend(batch);
    }

    pub fn pop_next(&mut self) -> Result<DesiredResult, QueueError> {
        self.pending.pop_front().ok_or(QueueError::Empty)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
