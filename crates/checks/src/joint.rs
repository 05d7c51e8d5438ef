//! The fused derivative call against the two separate derivative calls.
//!
//! Models often compute both weighted derivatives in one pass because they
//! share intermediate results. This check makes sure that shortcut returns
//! the same values as [`Differentiable::weighted_parameter_derivative`] and
//! [`Differentiable::weighted_input_derivative`] called one after the other.
//! Both paths run on the same inputs, so the tolerance is tight.
//!
//! Each trial draws the parameters, then a coefficient batch, then a point
//! batch. With the default per-dimension sampling the batch sums stay small
//! enough for an absolute tolerance to be meaningful.

mod config;

pub use config::JointConfig;

use std::ops::ControlFlow;

use fdverify_core::{Capability, Differentiable, Observer};
use rand::Rng;
use tracing::{debug, info};

use crate::{
    Action, Check, Error, EvalPath, Event, Location, Quantity, Report,
    error::{ensure_batch, ensure_dim, ensure_len, require},
    estimate::ParameterGuard,
    norm::{max_abs_distance, max_abs_distance_2d},
    report::Recorder,
};

/// Compares fused and separate weighted derivatives on random batches.
///
/// The model must provide an input derivative, and a parameter derivative
/// unless it has no parameters. The model's parameters are restored when the
/// check returns.
///
/// # Errors
///
/// Returns an error if a required capability is missing, if either path
/// returns a derivative of the wrong shape, or if the model fails.
pub fn check_joint_derivatives<M, R, Obs>(
    model: &mut M,
    rng: &mut R,
    config: &JointConfig,
    mut observer: Obs,
) -> Result<Report, Error>
where
    M: Differentiable,
    R: Rng + ?Sized,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    require(model, Capability::InputDerivative)?;
    if model.number_of_parameters() > 0 {
        require(model, Capability::ParameterDerivative)?;
    }

    let mut recorder = Recorder::new(Check::JointDerivatives, &mut observer);
    let mut guard = ParameterGuard::new(model);
    let sampling = config.sampling();

    let mut flow = ControlFlow::Continue(());
    for trial in 0..config.trials() {
        let parameters = sampling.parameters.draw(rng, guard.number_of_parameters());
        let coefficients = sampling
            .coefficients
            .draw_batch(rng, config.batch_size(), guard.output_size());
        let batch = sampling
            .points
            .draw_batch(rng, config.batch_size(), guard.input_size());

        debug!(trial, "joint derivative trial");
        guard.set_parameters(parameters.view());
        recorder.set_trial(trial);

        let mut state = guard.create_state();
        let outputs = guard.eval(&batch, &mut state).map_err(Error::model)?;
        ensure_batch(EvalPath::WithState, batch.nrows(), outputs.nrows())?;

        let input = guard
            .weighted_input_derivative(&batch, &outputs, &coefficients, &state)
            .map_err(Error::model)?;
        let parameter = guard
            .weighted_parameter_derivative(&batch, &outputs, &coefficients, &state)
            .map_err(Error::model)?;
        let (fused_parameter, fused_input) = guard
            .weighted_derivatives(&batch, &outputs, &coefficients, &state)
            .map_err(Error::model)?;

        let n = guard.number_of_parameters();
        ensure_len(Quantity::ParameterDerivative, n, parameter.len())?;
        ensure_len(Quantity::ParameterDerivative, n, fused_parameter.len())?;
        ensure_dim(Quantity::InputDerivative, batch.dim(), input.dim())?;
        ensure_dim(Quantity::InputDerivative, batch.dim(), fused_input.dim())?;

        let error = max_abs_distance_2d(input.view(), fused_input.view());
        flow = recorder.record(Location::InputMatrix, error, config.tolerance(), || None);
        if flow.is_break() {
            break;
        }

        if n > 0 {
            let error = max_abs_distance(parameter.view(), fused_parameter.view());
            flow = recorder.record(Location::ParameterVector, error, config.tolerance(), || None);
            if flow.is_break() {
                break;
            }
        }
    }

    drop(guard);
    let report = recorder.finish(flow);
    info!(
        comparisons = report.comparisons,
        failures = report.failures.len(),
        "joint derivative check finished"
    );
    Ok(report)
}

/// Runs [`check_joint_derivatives`] without observation.
///
/// # Errors
///
/// See [`check_joint_derivatives`].
pub fn check_joint_derivatives_unobserved<M, R>(
    model: &mut M,
    rng: &mut R,
    config: &JointConfig,
) -> Result<Report, Error>
where
    M: Differentiable,
    R: Rng + ?Sized,
{
    check_joint_derivatives(model, rng, config, ())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::{
        Status,
        test_models::{AffineTanh, Defect, Elementwise, Identity},
    };

    #[test]
    fn default_fused_path_agrees() {
        let mut model = Elementwise::new(ndarray::array![0.5, -0.25, 2.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(17);

        let report =
            check_joint_derivatives_unobserved(&mut model, &mut rng, &JointConfig::default())
                .unwrap();

        assert!(report.passed(), "{report}");
        assert_eq!(report.comparisons, 200);
        assert_eq!(model.parameters(), ndarray::array![0.5, -0.25, 2.0]);
    }

    #[test]
    fn overridden_fused_path_agrees() {
        let mut model = AffineTanh::new(4, 3);
        let mut rng = ChaCha8Rng::seed_from_u64(23);

        let report =
            check_joint_derivatives_unobserved(&mut model, &mut rng, &JointConfig::default())
                .unwrap();

        assert!(report.passed(), "{report}");
    }

    #[test]
    fn parameterless_model_compares_only_inputs() {
        let mut model = Identity::new(3);
        let mut rng = ChaCha8Rng::seed_from_u64(29);

        let report =
            check_joint_derivatives_unobserved(&mut model, &mut rng, &JointConfig::default())
                .unwrap();

        assert!(report.passed(), "{report}");
        assert_eq!(report.comparisons, 100);
    }

    #[test]
    fn offset_in_fused_input_is_caught() {
        let mut model = AffineTanh::new(2, 2).with_defect(Defect::FusedInputOffset(1e-6));
        let mut rng = ChaCha8Rng::seed_from_u64(31);

        let report =
            check_joint_derivatives_unobserved(&mut model, &mut rng, &JointConfig::default())
                .unwrap();

        assert_eq!(report.failures.len(), 100);
        assert!(
            report
                .failures
                .iter()
                .all(|f| f.comparison.location == Location::InputMatrix)
        );
        assert!((report.worst().unwrap().comparison.error - 1e-6).abs() < 1e-12);
    }

    #[test]
    fn offset_in_fused_parameters_is_caught() {
        let mut model = AffineTanh::new(2, 2).with_defect(Defect::FusedParameterOffset(1e-6));
        let mut rng = ChaCha8Rng::seed_from_u64(33);

        let report =
            check_joint_derivatives_unobserved(&mut model, &mut rng, &JointConfig::default())
                .unwrap();

        assert_eq!(report.comparisons, 200);
        assert_eq!(report.failures.len(), 100);
        assert!(
            report
                .failures
                .iter()
                .all(|f| f.comparison.location == Location::ParameterVector)
        );
        assert!((report.worst().unwrap().comparison.error - 1e-6).abs() < 1e-12);
    }

    #[test]
    fn short_parameter_derivative_is_fatal() {
        let mut model = AffineTanh::new(2, 2).with_defect(Defect::ParameterTruncated);
        let before = model.parameters();
        let mut rng = ChaCha8Rng::seed_from_u64(35);

        let result =
            check_joint_derivatives_unobserved(&mut model, &mut rng, &JointConfig::default());

        assert!(matches!(
            result,
            Err(Error::ShapeMismatch {
                quantity: Quantity::ParameterDerivative,
                expected: 6,
                actual: 5,
            })
        ));
        assert_eq!(model.parameters(), before);
    }

    #[test]
    fn extra_input_rows_are_fatal_without_inputs() {
        let mut model = AffineTanh::new(0, 2).with_defect(Defect::InputExtraRows(3));
        let mut rng = ChaCha8Rng::seed_from_u64(39);

        let result =
            check_joint_derivatives_unobserved(&mut model, &mut rng, &JointConfig::default());

        assert!(matches!(
            result,
            Err(Error::MatrixShapeMismatch {
                quantity: Quantity::InputDerivative,
                expected: (10, 0),
                actual: (13, 0),
            })
        ));
    }

    #[test]
    fn observer_stop_restores_parameters() {
        let mut model = AffineTanh::new(2, 2).with_defect(Defect::FusedInputOffset(1.0));
        let before = model.parameters();
        let mut rng = ChaCha8Rng::seed_from_u64(37);

        let report = check_joint_derivatives(
            &mut model,
            &mut rng,
            &JointConfig::default(),
            |_: &Event<'_>| Some(Action::StopEarly),
        )
        .unwrap();

        assert_eq!(report.status, Status::StoppedByObserver);
        assert_eq!(report.comparisons, 1);
        assert_eq!(model.parameters(), before);
    }

    #[test]
    fn requires_input_derivative() {
        let mut model = Identity::without_derivatives(2);
        let mut rng = ChaCha8Rng::seed_from_u64(41);

        let result =
            check_joint_derivatives_unobserved(&mut model, &mut rng, &JointConfig::default());

        assert!(matches!(
            result,
            Err(Error::Unsupported(Capability::InputDerivative))
        ));
    }
}
