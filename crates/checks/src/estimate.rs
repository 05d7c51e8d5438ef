//! Central finite-difference derivative estimates.
//!
//! Both estimators use the symmetric difference
//!
//! ```text
//! df/dx_i ≈ (f(x + ε e_i) - f(x - ε e_i)) / 2ε
//! ```
//!
//! which cancels the first-order truncation error. The step `ε` is always
//! supplied by the caller: too small and the subtraction loses digits to
//! cancellation, too large and the truncation error dominates.
//! [`DEFAULT_PROBE_EPSILON`] and [`DEFAULT_ESTIMATION_EPSILON`] are reasonable
//! starting points for smooth models in double precision.

mod guard;
mod table;

pub(crate) use guard::ParameterGuard;
pub use table::DerivativeTable;

use fdverify_core::Differentiable;
use ndarray::{Array1, Array2, ArrayView1};

use crate::{
    Error, Quantity,
    error::ensure_len,
};

/// A small step for probing parameters of well-scaled models.
pub const DEFAULT_PROBE_EPSILON: f64 = 1e-10;

/// The step used when estimates are compared against analytic derivatives.
pub const DEFAULT_ESTIMATION_EPSILON: f64 = 1e-5;

/// Estimates the derivative of the model output at `point` with respect to
/// each parameter.
///
/// The returned table has one entry per parameter. The model's parameters
/// are perturbed one at a time and restored before returning, whether or not
/// the estimate succeeds.
///
/// # Errors
///
/// Returns an error if `epsilon` is not finite and positive, if `point` or an
/// output has the wrong length, or if the model call fails.
pub fn estimate_parameter_derivative<M: Differentiable>(
    model: &mut M,
    point: ArrayView1<'_, f64>,
    epsilon: f64,
) -> Result<DerivativeTable, Error> {
    validate_epsilon(epsilon)?;
    ensure_len(Quantity::Point, model.input_size(), point.len())?;
    ensure_len(
        Quantity::Parameters,
        model.number_of_parameters(),
        model.parameters().len(),
    )?;

    let input = point.to_owned();
    let output_size = model.output_size();

    let mut guard = ParameterGuard::new(model);
    let base = guard.saved().clone();
    let mut probe = base.clone();
    let mut values = Array2::zeros((base.len(), output_size));

    for (index, mut entry) in values.rows_mut().into_iter().enumerate() {
        probe[index] = base[index] + epsilon;
        guard.set_parameters(probe.view());
        let plus = guard.call(&input).map_err(Error::model)?;

        probe[index] = base[index] - epsilon;
        guard.set_parameters(probe.view());
        let minus = guard.call(&input).map_err(Error::model)?;

        probe[index] = base[index];

        entry.assign(&central_difference(&plus, &minus, output_size, epsilon)?);
    }

    Ok(DerivativeTable::new(values))
}

/// Estimates the derivative of the model output at `point` with respect to
/// each input coordinate.
///
/// The returned table has one entry per input coordinate. Parameters are
/// left untouched.
///
/// # Errors
///
/// Returns an error if `epsilon` is not finite and positive, if `point` or an
/// output has the wrong length, or if the model call fails.
pub fn estimate_input_derivative<M: Differentiable>(
    model: &M,
    point: ArrayView1<'_, f64>,
    epsilon: f64,
) -> Result<DerivativeTable, Error> {
    validate_epsilon(epsilon)?;
    ensure_len(Quantity::Point, model.input_size(), point.len())?;

    let output_size = model.output_size();
    let mut probe = point.to_owned();
    let mut values = Array2::zeros((point.len(), output_size));

    for (index, mut entry) in values.rows_mut().into_iter().enumerate() {
        probe[index] = point[index] + epsilon;
        let plus = model.call(&probe).map_err(Error::model)?;

        probe[index] = point[index] - epsilon;
        let minus = model.call(&probe).map_err(Error::model)?;

        probe[index] = point[index];

        entry.assign(&central_difference(&plus, &minus, output_size, epsilon)?);
    }

    Ok(DerivativeTable::new(values))
}

fn central_difference(
    plus: &Array1<f64>,
    minus: &Array1<f64>,
    output_size: usize,
    epsilon: f64,
) -> Result<Array1<f64>, Error> {
    ensure_len(Quantity::Outputs, output_size, plus.len())?;
    ensure_len(Quantity::Outputs, output_size, minus.len())?;
    Ok((plus - minus) / (2.0 * epsilon))
}

fn validate_epsilon(epsilon: f64) -> Result<(), Error> {
    if epsilon.is_finite() && epsilon > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidEpsilon { value: epsilon })
    }
}
