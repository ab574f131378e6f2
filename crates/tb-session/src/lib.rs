//! # tb-session
//!
//! Pull-driven autotuning session core for TuneBridge.
//!
//! Bridges an externally pull-driven measurement caller ("give me a
//! configuration" / "here is its cost") to generation-batched search
//! techniques: priority-ordered job queues, exhaustion detection,
//! pluggable best-result objectives, new-best notifications, and
//! buffered persistence with a forced commit at session close.

pub mod events;
pub mod objective;
pub mod queue;
pub mod scheduler;
pub mod session;

pub use events::NewBestEvent;
pub use objective::{MaximizeMetric, MinimizeTime, Objective};
pub use queue::JobQueue;
pub use scheduler::{Candidate, GenerationScheduler, Refill, Technique};
pub use session::{SessionConfig, TuningSession};

use tracing_subscriber::EnvFilter;

/// Install the process-wide tracing subscriber.
///
/// Call once at program start; later calls are ignored. Sessions never
/// install logging themselves.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
