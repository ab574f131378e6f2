//! Find the minimum of a parabola by reporting measured costs back to a
//! tuning session.
//!
//! Run with: `cargo run -p tb-session --example parabola`

use std::sync::Arc;

use anyhow::Result;
use rand::Rng;

use tb_session::{
    init_tracing, Candidate, GenerationScheduler, MinimizeTime, SessionConfig, Technique,
    TuningSession,
};
use tb_store::{CommitPolicy, MemoryStore, PersistenceAdapter};
use tb_types::{Configuration, Measurement, ParamKind, ParamSpace, ParamValue, TuneResult};

const TRIALS: usize = 200;
const BATCH: usize = 10;

/// Uniform random sampling with a fixed trial budget.
struct RandomSampling {
    remaining: usize,
    batch: usize,
}

impl Technique for RandomSampling {
    fn propose(&mut self, space: &ParamSpace) -> TuneResult<Vec<Candidate>> {
        let mut rng = rand::rng();
        let count = self.batch.min(self.remaining);
        self.remaining -= count;

        let mut candidates = Vec::with_capacity(count);
        for _ in 0..count {
            let pairs: Vec<(String, ParamValue)> = space
                .params
                .iter()
                .map(|param| {
                    let value = match &param.kind {
                        ParamKind::FloatRange { low, high } => {
                            ParamValue::Float(rng.random_range(*low..=*high))
                        }
                        ParamKind::IntRange { low, high } => {
                            ParamValue::Int(rng.random_range(*low..=*high))
                        }
                        ParamKind::LogRange { low, high } => {
                            let v: f64 = rng.random_range(low.ln()..=high.ln());
                            ParamValue::Float(v.exp())
                        }
                        ParamKind::Choice { values } => {
                            ParamValue::Json(values[rng.random_range(0..values.len())].clone())
                        }
                    };
                    (param.name.clone(), value)
                })
                .collect();
            candidates.push(Candidate::new(Configuration::from_pairs(pairs)));
        }
        Ok(candidates)
    }

    fn depleted(&self) -> bool {
        self.remaining == 0
    }

    fn name(&self) -> &str {
        "random_sampling"
    }
}

fn parabola(cfg: &Configuration) -> f64 {
    let x = cfg.get_float("x").unwrap_or(0.0);
    let y = cfg.get_float("y").unwrap_or(0.0);
    x * x + y * y
}

fn main() -> Result<()> {
    init_tracing();

    let space = ParamSpace::new()
        .add_float("x", -1000.0, 1000.0)
        .add_float("y", -1000.0, 1000.0);
    let scheduler = GenerationScheduler::new(vec![Box::new(RandomSampling {
        remaining: TRIALS,
        batch: BATCH,
    })]);
    let store = Arc::new(MemoryStore::new());
    let adapter = PersistenceAdapter::new(store, CommitPolicy::Buffered);

    let mut session = TuningSession::new(
        space,
        scheduler,
        Box::new(MinimizeTime),
        adapter,
        SessionConfig::new("parabola"),
    )?;

    println!(
        "search space size 10^{:.2}, trials {TRIALS}",
        session.search_space_order()
    );

    for _ in 0..TRIALS {
        let cfg = session.next_configuration()?;
        let z = parabola(&cfg);
        session.report_result(Measurement::new(z))?;
    }

    let best = session.close()?;
    println!("best configuration {best} -> {:.3}", parabola(&best));
    Ok(())
}
