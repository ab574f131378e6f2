//! Write batching between a session and the transactional store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tb_types::StoreError;

use crate::store::{StoreRecord, TransactionalStore};

/// When unforced commits become durable.
///
/// Per-report durability is too costly for high-frequency evaluation
/// loops; `Buffered` downgrades unforced commits to flushes and relies on
/// the forced commit at session close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitPolicy {
    /// Unforced commits only flush; durability happens at close.
    Buffered,
    /// Every commit is durable.
    Durable,
}

impl Default for CommitPolicy {
    fn default() -> Self {
        Self::Buffered
    }
}

/// One run's connection to a (possibly shared) [`TransactionalStore`].
///
/// The store outlives the adapter: closing the adapter forces a durable
/// commit and releases this connection, leaving the store open for other
/// runs. The store itself is closed by whoever created it.
pub struct PersistenceAdapter {
    store: Arc<dyn TransactionalStore>,
    policy: CommitPolicy,
    released: AtomicBool,
}

impl PersistenceAdapter {
    pub fn new(store: Arc<dyn TransactionalStore>, policy: CommitPolicy) -> Self {
        Self {
            store,
            policy,
            released: AtomicBool::new(false),
        }
    }

    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }

    fn check_open(&self) -> Result<(), StoreError> {
        if self.released.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    /// Buffer one record write.
    pub fn write(&self, record: &StoreRecord) -> Result<(), StoreError> {
        self.check_open()?;
        self.store.write(record)
    }

    /// Make buffered writes visible within this process.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.check_open()?;
        self.store.flush()
    }

    /// Commit, durably only when forced or the policy is
    /// [`CommitPolicy::Durable`].
    pub fn commit(&self, force: bool) -> Result<(), StoreError> {
        self.check_open()?;
        if force || self.policy == CommitPolicy::Durable {
            self.store.commit()
        } else {
            self.store.flush()
        }
    }

    /// Forced commit, then release this connection. Idempotent; the
    /// shared store stays open for other runs.
    pub fn close(&self) -> Result<(), StoreError> {
        if self.released.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        debug!("releasing persistence connection after forced commit");
        self.store.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use tb_types::Measurement;

    fn record() -> StoreRecord {
        StoreRecord::Measurement(Measurement::new(1.0))
    }

    #[test]
    fn buffered_commit_only_flushes() {
        let store = Arc::new(MemoryStore::new());
        let adapter = PersistenceAdapter::new(store.clone(), CommitPolicy::Buffered);

        adapter.write(&record()).unwrap();
        adapter.commit(false).unwrap();
        assert_eq!(store.visible_len(), 1);
        assert_eq!(store.durable_len(), 0);

        adapter.commit(true).unwrap();
        assert_eq!(store.durable_len(), 1);
    }

    #[test]
    fn durable_policy_commits_every_time() {
        let store = Arc::new(MemoryStore::new());
        let adapter = PersistenceAdapter::new(store.clone(), CommitPolicy::Durable);

        adapter.write(&record()).unwrap();
        adapter.commit(false).unwrap();
        assert_eq!(store.durable_len(), 1);
    }

    #[test]
    fn close_forces_commit_and_releases_the_connection() {
        let store = Arc::new(MemoryStore::new());
        let adapter = PersistenceAdapter::new(store.clone(), CommitPolicy::Buffered);

        adapter.write(&record()).unwrap();
        adapter.close().unwrap();
        assert_eq!(store.durable_len(), 1);

        // The connection is gone, the store is not.
        assert!(matches!(
            adapter.write(&record()).unwrap_err(),
            StoreError::Closed
        ));
        assert!(!store.is_closed());

        // Idempotent.
        adapter.close().unwrap();
    }

    #[test]
    fn a_shared_store_survives_one_connection_closing() {
        let store = Arc::new(MemoryStore::new());
        let a = PersistenceAdapter::new(store.clone(), CommitPolicy::Buffered);
        let b = PersistenceAdapter::new(store.clone(), CommitPolicy::Buffered);

        a.write(&record()).unwrap();
        a.close().unwrap();

        b.write(&record()).unwrap();
        b.commit(false).unwrap();
        assert_eq!(store.visible_len(), 2);
    }
}
