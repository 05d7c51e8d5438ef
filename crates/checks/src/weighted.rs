//! Analytic weighted derivatives against finite-difference estimates.
//!
//! # Parameter derivative
//!
//! The model is evaluated on a single-row batch, and the full parameter
//! [`DerivativeTable`](crate::DerivativeTable) is estimated independently.
//! Each output coordinate is then checked in isolation by passing a
//! coefficient batch that is zero except for one entry. Dividing the result
//! by that entry leaves one Jacobian column, which is compared against the
//! estimate using the Euclidean norm. Because the isolating weight is the
//! sampled coefficient, the check also exercises linearity in the
//! coefficients.
//!
//! # Input derivative
//!
//! The analytic input derivative for one point and one coefficient row must
//! equal the estimated input table weighted by the coefficients. The
//! comparison uses the largest absolute difference, and failures carry a
//! [`Diagnostic`](crate::Diagnostic) with the point, coefficients, actual and
//! expected gradients.
//!
//! # Randomized runs
//!
//! [`validate_parameter_derivative`] and [`validate_input_derivative`] repeat
//! the single-point checks with parameters, coefficients and points drawn from
//! the caller's random source, as described by a [`TrialConfig`]. The model's
//! parameters are restored when the run returns.

mod config;
mod input;
mod parameter;


pub use config::{TrialConfig, WeightedConfig};

use std::ops::ControlFlow;

use fdverify_core::{Capability, Differentiable, Observer};
use ndarray::ArrayView1;
use rand::Rng;
use tracing::{debug, info};

use crate::{
    Action, Check, Error, Event, Report,
    error::require,
    estimate::ParameterGuard,
    report::Recorder,
};

/// Checks the weighted parameter derivative at a single point.
///
/// The model's parameters are unchanged when this returns.
///
/// # Errors
///
/// Returns an error if the model lacks a parameter derivative, if a vector
/// has the wrong length, or if the model fails.
pub fn check_parameter_derivative<M, Obs>(
    model: &mut M,
    point: ArrayView1<'_, f64>,
    coefficients: ArrayView1<'_, f64>,
    config: &WeightedConfig,
    mut observer: Obs,
) -> Result<Report, Error>
where
    M: Differentiable,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    require(model, Capability::ParameterDerivative)?;
    let mut recorder = Recorder::new(Check::ParameterDerivative, &mut observer);
    let flow = parameter::check_point(model, point, coefficients, config, &mut recorder)?;
    Ok(recorder.finish(flow))
}

/// Checks the weighted parameter derivative at a single point without
/// observation.
///
/// # Errors
///
/// See [`check_parameter_derivative`].
pub fn check_parameter_derivative_unobserved<M: Differentiable>(
    model: &mut M,
    point: ArrayView1<'_, f64>,
    coefficients: ArrayView1<'_, f64>,
    config: &WeightedConfig,
) -> Result<Report, Error> {
    check_parameter_derivative(model, point, coefficients, config, ())
}

/// Checks the weighted input derivative at a single point.
///
/// # Errors
///
/// Returns an error if the model lacks an input derivative, if a vector or
/// the returned derivative has the wrong shape, or if the model fails.
pub fn check_input_derivative<M, Obs>(
    model: &M,
    point: ArrayView1<'_, f64>,
    coefficients: ArrayView1<'_, f64>,
    config: &WeightedConfig,
    mut observer: Obs,
) -> Result<Report, Error>
where
    M: Differentiable,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    require(model, Capability::InputDerivative)?;
    let mut recorder = Recorder::new(Check::InputDerivative, &mut observer);
    let flow = input::check_point(model, point, coefficients, config, &mut recorder)?;
    Ok(recorder.finish(flow))
}

/// Checks the weighted input derivative at a single point without
/// observation.
///
/// # Errors
///
/// See [`check_input_derivative`].
pub fn check_input_derivative_unobserved<M: Differentiable>(
    model: &M,
    point: ArrayView1<'_, f64>,
    coefficients: ArrayView1<'_, f64>,
    config: &WeightedConfig,
) -> Result<Report, Error> {
    check_input_derivative(model, point, coefficients, config, ())
}

/// Runs [`check_parameter_derivative`] on randomly drawn trials.
///
/// A single failing trial fails the report.
///
/// # Errors
///
/// Returns an error if the model lacks a parameter derivative, or on the
/// first trial that hits a structural problem or model failure.
pub fn validate_parameter_derivative<M, R, Obs>(
    model: &mut M,
    rng: &mut R,
    config: &TrialConfig,
    mut observer: Obs,
) -> Result<Report, Error>
where
    M: Differentiable,
    R: Rng + ?Sized,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    require(model, Capability::ParameterDerivative)?;
    let mut recorder = Recorder::new(Check::ParameterDerivative, &mut observer);
    let flow = run_trials(model, rng, config, &mut recorder, |model, point, coefficients, recorder| {
        parameter::check_point(model, point, coefficients, config.weighted(), recorder)
    })?;
    Ok(summarize(recorder.finish(flow)))
}

/// Runs [`validate_parameter_derivative`] without observation.
///
/// # Errors
///
/// See [`validate_parameter_derivative`].
pub fn validate_parameter_derivative_unobserved<M, R>(
    model: &mut M,
    rng: &mut R,
    config: &TrialConfig,
) -> Result<Report, Error>
where
    M: Differentiable,
    R: Rng + ?Sized,
{
    validate_parameter_derivative(model, rng, config, ())
}

/// Runs [`check_input_derivative`] on randomly drawn trials.
///
/// A single failing trial fails the report.
///
/// # Errors
///
/// Returns an error if the model lacks an input derivative, or on the first
/// trial that hits a structural problem or model failure.
pub fn validate_input_derivative<M, R, Obs>(
    model: &mut M,
    rng: &mut R,
    config: &TrialConfig,
    mut observer: Obs,
) -> Result<Report, Error>
where
    M: Differentiable,
    R: Rng + ?Sized,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    require(model, Capability::InputDerivative)?;
    let mut recorder = Recorder::new(Check::InputDerivative, &mut observer);
    let flow = run_trials(model, rng, config, &mut recorder, |model, point, coefficients, recorder| {
        input::check_point(model, point, coefficients, config.weighted(), recorder)
    })?;
    Ok(summarize(recorder.finish(flow)))
}

/// Runs [`validate_input_derivative`] without observation.
///
/// # Errors
///
/// See [`validate_input_derivative`].
pub fn validate_input_derivative_unobserved<M, R>(
    model: &mut M,
    rng: &mut R,
    config: &TrialConfig,
) -> Result<Report, Error>
where
    M: Differentiable,
    R: Rng + ?Sized,
{
    validate_input_derivative(model, rng, config, ())
}

/// Draws and installs each trial's parameters, then hands the trial's point
/// and coefficients to `check`.
fn run_trials<M, R, Obs, F>(
    model: &mut M,
    rng: &mut R,
    config: &TrialConfig,
    recorder: &mut Recorder<'_, Obs>,
    mut check: F,
) -> Result<ControlFlow<()>, Error>
where
    M: Differentiable,
    R: Rng + ?Sized,
    Obs: for<'a> Observer<Event<'a>, Action>,
    F: FnMut(
        &mut M,
        ArrayView1<'_, f64>,
        ArrayView1<'_, f64>,
        &mut Recorder<'_, Obs>,
    ) -> Result<ControlFlow<()>, Error>,
{
    let sampling = config.sampling();
    let mut guard = ParameterGuard::new(model);

    for trial in 0..config.trials() {
        let parameters = sampling.parameters.draw(rng, guard.number_of_parameters());
        let coefficients = sampling.coefficients.draw(rng, guard.output_size());
        let point = sampling.points.draw(rng, guard.input_size());

        debug!(trial, "weighted derivative trial");
        guard.set_parameters(parameters.view());
        recorder.set_trial(trial);

        let flow = check(&mut *guard, point.view(), coefficients.view(), &mut *recorder)?;
        if flow.is_break() {
            return Ok(flow);
        }
    }

    Ok(ControlFlow::Continue(()))
}

fn summarize(report: Report) -> Report {
    info!(
        check = %report.check,
        comparisons = report.comparisons,
        failures = report.failures.len(),
        "randomized check finished"
    );
    report
}
