use std::ops::ControlFlow;

use fdverify_core::{Differentiable, Observer};
use ndarray::{Array2, ArrayView1, Axis};

use crate::{
    Action, Error, EvalPath, Event, Location, Quantity,
    error::{ensure_batch, ensure_len},
    estimate::estimate_parameter_derivative,
    norm::l2_distance,
    report::Recorder,
};

use super::WeightedConfig;

/// Compares the analytic parameter derivative at `point` against the
/// estimate, one output column at a time.
///
/// For output `k` the coefficient batch is `w e_k`, and the analytic result
/// is divided by `w`. A derivative that is linear in the coefficients then
/// yields exactly column `k` of the Jacobian, free of the other outputs.
pub(super) fn check_point<M, Obs>(
    model: &mut M,
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

    // Estimate first: the state from `eval` belongs to the current parameters.
    let estimated = estimate_parameter_derivative(model, point, config.estimation_epsilon())?;

    let batch = point.insert_axis(Axis(0)).to_owned();
    let mut state = model.create_state();
    let outputs = model.eval(&batch, &mut state).map_err(Error::model)?;
    ensure_batch(EvalPath::WithState, 1, outputs.nrows())?;
    ensure_len(Quantity::Outputs, model.output_size(), outputs.ncols())?;

    for (output, &coefficient) in coefficients.iter().enumerate() {
        let weight = isolation_weight(coefficient);
        let mut isolated = Array2::zeros((1, coefficients.len()));
        isolated[[0, output]] = weight;

        let analytic = model
            .weighted_parameter_derivative(&batch, &outputs, &isolated, &state)
            .map_err(Error::model)?
            / weight;
        ensure_len(Quantity::ParameterDerivative, estimated.len(), analytic.len())?;

        let error = l2_distance(analytic.view(), estimated.column(output));
        let flow = recorder.record(
            Location::OutputColumn { output },
            error,
            config.tolerance(),
            || None,
        );
        if flow.is_break() {
            return Ok(flow);
        }
    }

    Ok(ControlFlow::Continue(()))
}

/// Returns the coefficient itself as the isolating weight, or `1.0` if it
/// cannot be divided by safely.
fn isolation_weight(coefficient: f64) -> f64 {
    if coefficient.is_normal() {
        coefficient
    } else {
        1.0
    }
}
