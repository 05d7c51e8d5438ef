use std::ops::ControlFlow;

use fdverify_core::{Differentiable, Observer};
use ndarray::{ArrayView1, Axis};

use crate::{
    Action, Diagnostic, Error, EvalPath, Event, Location, Quantity,
    error::{ensure_batch, ensure_dim, ensure_len},
    estimate::estimate_input_derivative,
    norm::max_abs_distance,
    report::Recorder,
};

use super::WeightedConfig;

/// Compares the analytic input derivative at `point` against the estimated
/// table weighted by `coefficients`.
pub(super) fn check_point<M, Obs>(
    model: &M,
    point: ArrayView1<'_, f64>,
    coefficients: ArrayView1<'_, f64>,
    config: &WeightedConfig,
    recorder: &mut Recorder<'_, Obs>,
) -> Result<ControlFlow<()>, Error>
where
    M: Differentiable,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    ensure_len(Quantity::Point, model.input_size(), point.len())?;
    ensure_len(Quantity::Coefficients, model.output_size(), coefficients.len())?;

    let batch = point.insert_axis(Axis(0)).to_owned();
    let coefficient_batch = coefficients.insert_axis(Axis(0)).to_owned();

    let mut state = model.create_state();
    let outputs = model.eval(&batch, &mut state).map_err(Error::model)?;
    ensure_batch(EvalPath::WithState, 1, outputs.nrows())?;

    let analytic = model
        .weighted_input_derivative(&batch, &outputs, &coefficient_batch, &state)
        .map_err(Error::model)?;
    ensure_dim(Quantity::InputDerivative, batch.dim(), analytic.dim())?;
    let actual = analytic.index_axis(Axis(0), 0);

    let expected = estimate_input_derivative(model, point, config.estimation_epsilon())?
        .weighted(coefficients);

    let error = max_abs_distance(actual, expected.view());
    Ok(recorder.record(Location::InputGradient, error, config.tolerance(), || {
        Some(Diagnostic {
            point: point.to_owned(),
            coefficients: coefficients.to_owned(),
            actual: actual.to_owned(),
            expected: expected.clone(),
        })
    }))
}
