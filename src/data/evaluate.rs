//! Parallel remnant evaluation.
//!
//! Draws are evaluated chunk by chunk on a rayon pool. Within a chunk rows are
//! evaluated in parallel; `collect` keeps them in draw order, so the output
//! never depends on the number of workers. Progress is reported and the
//! cancellation token is checked at chunk boundaries.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::data::sample::Sample;
use crate::data::sampler::ProgenitorDraw;
use crate::error::AppError;
use crate::models::{EvaluationFailure, RemnantModel};

pub const DEFAULT_CHUNK_SIZE: usize = 8_192;

/// Receives `(completed, total)` after every evaluated chunk.
pub trait ProgressObserver: Sync {
    fn on_progress(&self, completed: usize, total: usize);
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, usize) + Sync,
{
    fn on_progress(&self, completed: usize, total: usize) {
        self(completed, total)
    }
}

/// Cooperative cancellation flag shared between a caller and a running job.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Rows that survived evaluation plus per-reason drop counts.
#[derive(Debug, Clone, Default)]
pub struct EvaluationOutcome {
    pub samples: Vec<Sample>,
    pub dropped: BTreeMap<String, usize>,
    pub extrapolated: usize,
}

impl EvaluationOutcome {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }
}

pub struct RemnantEvaluator<'a> {
    model: &'a dyn RemnantModel,
    workers: Option<usize>,
    chunk_size: usize,
    observer: Option<&'a dyn ProgressObserver>,
    cancel: Option<CancelToken>,
}

impl<'a> RemnantEvaluator<'a> {
    pub fn new(model: &'a dyn RemnantModel) -> Self {
        Self {
            model,
            workers: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            observer: None,
            cancel: None,
        }
    }

    /// Number of worker threads; `None` or `0` uses rayon's global pool.
    pub fn workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn observer(mut self, observer: Option<&'a dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn cancel(mut self, cancel: Option<CancelToken>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn evaluate(&self, draws: &[ProgenitorDraw]) -> Result<EvaluationOutcome, AppError> {
        match self.workers {
            Some(n) if n > 0 => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| AppError::config(format!("Failed to create worker pool: {e}")))?;
                pool.install(|| self.run(draws))
            }
            _ => self.run(draws),
        }
    }

    fn run(&self, draws: &[ProgenitorDraw]) -> Result<EvaluationOutcome, AppError> {
        let total = draws.len();
        let mut outcome = EvaluationOutcome {
            samples: Vec::with_capacity(total),
            ..Default::default()
        };
        let mut completed = 0usize;

        for chunk in draws.chunks(self.chunk_size) {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                return Err(AppError::Cancelled { completed, total });
            }

            let results: Vec<Result<(Sample, bool), EvaluationFailure>> = chunk
                .par_iter()
                .map(|draw| {
                    self.model
                        .evaluate(&draw.binary())
                        .map(|est| (Sample::from_evaluation(draw, &est), est.extrapolated))
                })
                .collect();

            for result in results {
                match result {
                    Ok((sample, extrapolated)) => {
                        if extrapolated {
                            outcome.extrapolated += 1;
                        }
                        outcome.samples.push(sample);
                    }
                    Err(failure) => {
                        *outcome.dropped.entry(failure.reason().to_string()).or_default() += 1;
                    }
                }
            }

            completed += chunk.len();
            tracing::debug!(completed, total, "evaluated chunk");
            if let Some(observer) = self.observer {
                observer.on_progress(completed, total);
            }
        }

        Ok(outcome)
    }
}
