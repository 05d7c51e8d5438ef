//! Batched evaluation against one-at-a-time evaluation.
//!
//! A model evaluates a batch along two paths: the direct
//! [`BatchEval::call_batch`] and [`BatchEval::eval`], which also fills a
//! state. Both must return one result per element, and each result must
//! match [`Model::call`](fdverify_core::Model::call) on that element alone.
//! Results are compared through [`Distance`], so scalar, integer and vector
//! outputs are handled the same way.

use std::ops::ControlFlow;

use fdverify_core::{Batch, BatchEval, Distance, Observer};
use tracing::debug;

use crate::{
    Action, Check, ConfigError, Error, EvalPath, Event, Location, Report, config::positive,
    error::ensure_batch, report::Recorder,
};

/// Configuration for the batch evaluation check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchConfig {
    tolerance: f64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { tolerance: 1e-7 }
    }
}

impl BatchConfig {
    /// Creates a new config.
    ///
    /// # Errors
    ///
    /// Returns an error if `tolerance` is not finite and positive.
    pub fn new(tolerance: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            tolerance: positive(tolerance, ConfigError::Tolerance)?,
        })
    }

    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

/// Compares both batched evaluation paths against per-element evaluation.
///
/// # Errors
///
/// Returns an error if either path returns the wrong number of results or
/// if the model fails.
pub fn check_batch_eval<M, Obs>(
    model: &M,
    batch: &M::Batch,
    config: &BatchConfig,
    mut observer: Obs,
) -> Result<Report, Error>
where
    M: BatchEval,
    M::Batch: Batch<Element = M::Input>,
    M::OutputBatch: Batch<Element = M::Output>,
    M::Output: Distance,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    let size = batch.batch_size();
    debug!(size, "batch evaluation check");

    let direct = model.call_batch(batch).map_err(Error::model)?;
    let mut state = model.create_state();
    let with_state = model.eval(batch, &mut state).map_err(Error::model)?;

    ensure_batch(EvalPath::Direct, size, direct.batch_size())?;
    ensure_batch(EvalPath::WithState, size, with_state.batch_size())?;

    let mut recorder = Recorder::new(Check::BatchEval, &mut observer);
    for index in 0..size {
        let single = model.call(&batch.element(index)).map_err(Error::model)?;

        for (path, results) in [(EvalPath::Direct, &direct), (EvalPath::WithState, &with_state)] {
            let error = single.distance(&results.element(index));
            let flow = recorder.record(
                Location::BatchElement { index, path },
                error,
                config.tolerance(),
                || None,
            );
            if flow.is_break() {
                return Ok(recorder.finish(flow));
            }
        }
    }

    Ok(recorder.finish(ControlFlow::Continue(())))
}

/// Runs [`check_batch_eval`] without observation.
///
/// # Errors
///
/// See [`check_batch_eval`].
pub fn check_batch_eval_unobserved<M>(
    model: &M,
    batch: &M::Batch,
    config: &BatchConfig,
) -> Result<Report, Error>
where
    M: BatchEval,
    M::Batch: Batch<Element = M::Input>,
    M::OutputBatch: Batch<Element = M::Output>,
    M::Output: Distance,
{
    check_batch_eval(model, batch, config, ())
}
