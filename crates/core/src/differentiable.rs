use std::fmt;

use ndarray::{Array1, Array2, ArrayView1};

use crate::BatchEval;

/// A derivative a [`Differentiable`] model may or may not provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Weighted derivative with respect to the model parameters.
    ParameterDerivative,
    /// Weighted derivative with respect to the model inputs.
    InputDerivative,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParameterDerivative => f.write_str("parameter derivative"),
            Self::InputDerivative => f.write_str("input derivative"),
        }
    }
}

/// A parameterized, vector-valued model with analytic weighted derivatives.
///
/// Inputs and outputs are vectors, and batches hold one element per row.
/// A weighted derivative is a vector-Jacobian product: the derivative of
/// `sum_b sum_k coefficients[b, k] * outputs[b, k]` with respect to either the
/// parameters or each input row. It must be linear in the coefficients.
///
/// The `outputs` and `state` passed to the derivative methods must come from
/// a preceding [`BatchEval::eval`] on the same batch with the current
/// parameters.
pub trait Differentiable:
    BatchEval<
        Input = Array1<f64>,
        Output = Array1<f64>,
        Batch = Array2<f64>,
        OutputBatch = Array2<f64>,
    >
{
    /// Returns the length of an input point.
    fn input_size(&self) -> usize;

    /// Returns the length of an output vector.
    fn output_size(&self) -> usize;

    /// Returns the length of the parameter vector.
    fn number_of_parameters(&self) -> usize;

    /// Returns a copy of the current parameter vector.
    fn parameters(&self) -> Array1<f64>;

    /// Replaces the parameter vector.
    ///
    /// Callers guarantee that `parameters` has length
    /// [`Differentiable::number_of_parameters`].
    fn set_parameters(&mut self, parameters: ArrayView1<'_, f64>);

    /// Returns `true` if [`Differentiable::weighted_parameter_derivative`]
    /// is implemented.
    fn has_parameter_derivative(&self) -> bool;

    /// Returns `true` if [`Differentiable::weighted_input_derivative`]
    /// is implemented.
    fn has_input_derivative(&self) -> bool;

    /// Returns whether the model provides the given derivative.
    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::ParameterDerivative => self.has_parameter_derivative(),
            Capability::InputDerivative => self.has_input_derivative(),
        }
    }

    /// Computes the weighted derivative with respect to the parameters,
    /// summed over the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the derivative cannot be computed.
    fn weighted_parameter_derivative(
        &self,
        batch: &Array2<f64>,
        outputs: &Array2<f64>,
        coefficients: &Array2<f64>,
        state: &Self::State,
    ) -> Result<Array1<f64>, Self::Error>;

    /// Computes the weighted derivative with respect to each input row.
    ///
    /// The result has the same shape as `batch`.
    ///
    /// # Errors
    ///
    /// Returns an error if the derivative cannot be computed.
    fn weighted_input_derivative(
        &self,
        batch: &Array2<f64>,
        outputs: &Array2<f64>,
        coefficients: &Array2<f64>,
        state: &Self::State,
    ) -> Result<Array2<f64>, Self::Error>;

    /// Computes both weighted derivatives in one call.
    ///
    /// Models with a fused implementation override this; the default calls
    /// the two separate derivative methods.
    ///
    /// # Errors
    ///
    /// Returns an error if either derivative cannot be computed.
    fn weighted_derivatives(
        &self,
        batch: &Array2<f64>,
        outputs: &Array2<f64>,
        coefficients: &Array2<f64>,
        state: &Self::State,
    ) -> Result<(Array1<f64>, Array2<f64>), Self::Error> {
        let parameter = self.weighted_parameter_derivative(batch, outputs, coefficients, state)?;
        let input = self.weighted_input_derivative(batch, outputs, coefficients, state)?;
        Ok((parameter, input))
    }
}
