//! The transactional store seam.
//!
//! A [`TransactionalStore`] accepts buffered record writes and exposes
//! flush/commit/close semantics: `flush` makes writes visible within the
//! process, `commit` makes them durable. One store instance may be shared
//! by many interleaved runs, so implementations serialize internally and
//! all methods take `&self`.

use serde::{Deserialize, Serialize};

use tb_types::{DesiredResult, Measurement, StoreError, TuningRun};

/// A snapshot of one entity, as persisted.
///
/// Records are append-only: a later snapshot of the same entity
/// supersedes earlier ones on read-back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum StoreRecord {
    Run(TuningRun),
    Job(DesiredResult),
    Measurement(Measurement),
}

/// Storage backend contract consumed by the persistence adapter.
pub trait TransactionalStore: Send + Sync {
    /// Buffer one record. Not visible until `flush`, not durable until
    /// `commit`.
    fn write(&self, record: &StoreRecord) -> Result<(), StoreError>;

    /// Make buffered writes visible to reads within this process.
    fn flush(&self) -> Result<(), StoreError>;

    /// Make all visible writes durable. Implies `flush`.
    fn commit(&self) -> Result<(), StoreError>;

    /// Release the underlying connection. Idempotent; writes after close
    /// fail with [`StoreError::Closed`].
    fn close(&self) -> Result<(), StoreError>;
}
