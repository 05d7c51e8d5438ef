//! Comparison of two derivative tables.
//!
//! Useful when a model offers a second way to obtain a full Jacobian, or to
//! compare estimates made with different steps.

use std::ops::ControlFlow;

use fdverify_core::Observer;

use crate::{
    Action, Check, DerivativeTable, Error, Event, Location, Quantity, Report,
    config::positive,
    error::ensure_len,
    norm::l2_distance,
    report::Recorder,
};

/// Compares two tables entry by entry using the Euclidean norm.
///
/// # Errors
///
/// Returns an error if `tolerance` is not finite and positive, or if the
/// tables differ in entry count or entry length.
pub fn compare_tables<Obs>(
    expected: &DerivativeTable,
    actual: &DerivativeTable,
    tolerance: f64,
    mut observer: Obs,
) -> Result<Report, Error>
where
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    let tolerance = positive(tolerance, crate::ConfigError::Tolerance)?;
    ensure_len(Quantity::TableEntries, expected.len(), actual.len())?;
    ensure_len(
        Quantity::TableEntry,
        expected.output_size(),
        actual.output_size(),
    )?;

    let mut recorder = Recorder::new(Check::DerivativeTable, &mut observer);
    for index in 0..expected.len() {
        let error = l2_distance(expected.entry(index), actual.entry(index));
        let flow = recorder.record(Location::TableEntry { index }, error, tolerance, || None);
        if flow.is_break() {
            return Ok(recorder.finish(flow));
        }
    }

    Ok(recorder.finish(ControlFlow::Continue(())))
}

/// Runs [`compare_tables`] without observation.
///
/// # Errors
///
/// See [`compare_tables`].
pub fn compare_tables_unobserved(
    expected: &DerivativeTable,
    actual: &DerivativeTable,
    tolerance: f64,
) -> Result<Report, Error> {
    compare_tables(expected, actual, tolerance, ())
}
