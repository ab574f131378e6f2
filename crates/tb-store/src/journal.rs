//! Append-only JSON-lines record journal.
//!
//! Every record is one JSON object per line, so a run's full audit trail
//! can be replayed or inspected with standard line tools.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use tb_types::StoreError;

use crate::store::{StoreRecord, TransactionalStore};

struct Inner {
    staged: Vec<String>,
    writer: BufWriter<File>,
    closed: bool,
}

impl Inner {
    fn drain_staged(&mut self) -> std::io::Result<()> {
        let staged = std::mem::take(&mut self.staged);
        for line in staged {
            self.writer.write_all(line.as_bytes())?;
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// A [`TransactionalStore`] writing records to a JSON-lines file.
///
/// `flush` moves staged lines into the OS write buffer; `commit`
/// additionally flushes and syncs the file to disk.
pub struct JsonlStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl JsonlStore {
    /// Open (or create) the journal at `path`, appending to any existing
    /// records.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "opened record journal");
        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                staged: Vec::new(),
                writer: BufWriter::new(file),
                closed: false,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TransactionalStore for JsonlStore {
    fn write(&self, record: &StoreRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(StoreError::Closed);
        }
        let line = serde_json::to_string(record)?;
        inner.staged.push(line);
        Ok(())
    }

    fn flush(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(StoreError::Closed);
        }
        inner.drain_staged()?;
        Ok(())
    }

    fn commit(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(StoreError::Closed);
        }
        inner.drain_staged()?;
        inner.writer.flush()?;
        inner.writer.get_ref().sync_all()?;
        Ok(())
    }

    fn close(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Ok(());
        }
        inner.drain_staged()?;
        inner.writer.flush()?;
        inner.closed = true;
        Ok(())
    }
}

/// Read back every record in a journal file, in write order.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<StoreRecord>, StoreError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_types::{Configuration, DesiredResult, Measurement, ParamValue, ProgramRef, TuningRun};
    use uuid::Uuid;

    #[test]
    fn journal_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs").join("bench.jsonl");

        let store = JsonlStore::open(&path).unwrap();
        let run = TuningRun::new("bench", "local", "minimize_time", ProgramRef::default());
        let job = DesiredResult::new(
            run.id,
            1,
            0.0,
            Configuration::from_pairs([("x", ParamValue::Int(3))]),
        );

        store.write(&StoreRecord::Run(run.clone())).unwrap();
        store.write(&StoreRecord::Job(job.clone())).unwrap();
        store.write(&StoreRecord::Measurement(Measurement::new(9.0))).unwrap();
        store.commit().unwrap();
        store.close().unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 3);
        match &records[0] {
            StoreRecord::Run(r) => assert_eq!(r.id, run.id),
            other => panic!("unexpected record: {other:?}"),
        }
        match &records[1] {
            StoreRecord::Job(j) => {
                assert_eq!(j.id, job.id);
                assert_eq!(j.configuration.get_int("x"), Some(3));
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[test]
    fn staged_lines_survive_close_without_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trail.jsonl");

        let store = JsonlStore::open(&path).unwrap();
        store.write(&StoreRecord::Measurement(Measurement::new(1.0))).unwrap();
        store.close().unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn write_after_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::open(dir.path().join("t.jsonl")).unwrap();
        store.close().unwrap();
        let err = store
            .write(&StoreRecord::Measurement(Measurement::new(0.0)))
            .unwrap_err();
        assert!(matches!(err, StoreError::Closed));
    }

    #[test]
    fn appends_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.jsonl");

        for time in [1.0, 2.0] {
            let store = JsonlStore::open(&path).unwrap();
            let mut m = Measurement::new(time);
            m.run_id = Some(Uuid::new_v4());
            store.write(&StoreRecord::Measurement(m)).unwrap();
            store.close().unwrap();
        }

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
    }
}
