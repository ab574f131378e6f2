//! In-memory reference store, used by tests and examples.

use parking_lot::Mutex;

use tb_types::StoreError;

use crate::store::{StoreRecord, TransactionalStore};

#[derive(Debug, Default)]
struct Inner {
    staged: Vec<StoreRecord>,
    visible: Vec<StoreRecord>,
    /// Number of leading `visible` records covered by the last commit.
    durable: usize,
    closed: bool,
}

/// A [`TransactionalStore`] backed by process memory.
///
/// Tracks the staged / visible / durable boundaries explicitly so tests
/// can assert exactly what each flush and commit covered.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records made visible by a flush (committed or not).
    pub fn visible(&self) -> Vec<StoreRecord> {
        self.inner.lock().visible.clone()
    }

    pub fn visible_len(&self) -> usize {
        self.inner.lock().visible.len()
    }

    pub fn staged_len(&self) -> usize {
        self.inner.lock().staged.len()
    }

    /// How many visible records the last commit made durable.
    pub fn durable_len(&self) -> usize {
        self.inner.lock().durable
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}

impl TransactionalStore for MemoryStore {
    fn write(&self, record: &StoreRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(StoreError::Closed);
        }
        inner.staged.push(record.clone());
        Ok(())
    }

    fn flush(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(StoreError::Closed);
        }
        let staged = std::mem::take(&mut inner.staged);
        inner.visible.extend(staged);
        Ok(())
    }

    fn commit(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(StoreError::Closed);
        }
        let staged = std::mem::take(&mut inner.staged);
        inner.visible.extend(staged);
        inner.durable = inner.visible.len();
        Ok(())
    }

    fn close(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.closed {
            let staged = std::mem::take(&mut inner.staged);
            inner.visible.extend(staged);
            inner.closed = true;
        }
        Ok(())
    }
}
