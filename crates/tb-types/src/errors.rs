use thiserror::Error;
use uuid::Uuid;

/// Main error type for the TuneBridge system
#[derive(Error, Debug)]
pub enum TuneError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Run error: {0}")]
    Run(#[from] RunError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Technique error: {0}")]
    Technique(#[from] TechniqueError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Caller broke the alternating request/report contract
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("result reported with no configuration outstanding")]
    NoPendingJob,

    #[error("job {job_id} already has a reported result")]
    AlreadyReported { job_id: Uuid },
}

/// Job queue errors
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("pop_next called on an empty job queue")]
    Empty,
}

/// Run-level errors
#[derive(Error, Debug)]
pub enum RunError {
    #[error("search exhausted with no completed results")]
    Degenerate,
}

/// Persistence errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("buffered write failed: {message}")]
    WriteFailed { message: String },

    #[error("commit failed: {message}")]
    CommitFailed { message: String },

    #[error("store is closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Search technique errors surfaced during a refill
#[derive(Error, Debug)]
pub enum TechniqueError {
    #[error("technique {technique} failed to propose candidates: {message}")]
    ProposalFailed { technique: String, message: String },
}

/// Result type alias for TuneBridge operations
pub type TuneResult<T> = Result<T, TuneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let job_id = Uuid::new_v4();
        let error = ProtocolError::AlreadyReported { job_id };
        assert!(error.to_string().contains("already has a reported result"));
        assert!(error.to_string().contains(&job_id.to_string()));
    }

    #[test]
    fn test_error_conversion() {
        let protocol_error = ProtocolError::NoPendingJob;
        let tune_error: TuneError = protocol_error.into();

        match tune_error {
            TuneError::Protocol(_) => (),
            _ => panic!("Expected Protocol error"),
        }
    }

    #[test]
    fn test_store_error_nesting() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let store: StoreError = io.into();
        let tune: TuneError = store.into();
        assert!(tune.to_string().contains("disk full"));
    }
}
