//! New-best notifications emitted by the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tb_types::{Configuration, RunId};

/// Fired when a classified measurement strictly improves on the running
/// best. Delivery is fire-and-forget; a full or disconnected sink never
/// aborts the report that produced the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBestEvent {
    pub id: Uuid,
    pub run_id: RunId,
    pub job_id: Uuid,
    pub configuration: Configuration,
    /// Primary cost of the new best measurement.
    pub time: f64,
    pub at: DateTime<Utc>,
}

impl NewBestEvent {
    pub fn new(run_id: RunId, job_id: Uuid, configuration: Configuration, time: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            job_id,
            configuration,
            time,
            at: Utc::now(),
        }
    }
}
