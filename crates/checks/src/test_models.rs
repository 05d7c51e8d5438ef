//! Small models with known derivatives, plus deliberately broken variants.

use fdverify_core::{BatchEval, Differentiable, Model};
use ndarray::{Array1, Array2, ArrayView1, Axis, s};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum ModelError {
    #[error("expected {expected} values, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("parameter {value} exceeds limit {limit}")]
    OutOfRange { value: f64, limit: f64 },
}

fn check_len(expected: usize, actual: usize) -> Result<(), ModelError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ModelError::Shape { expected, actual })
    }
}

/// `f(x) = theta * x`, elementwise.
///
/// With a limit set, every call fails while some parameter exceeds it.
#[derive(Debug, Clone)]
pub(crate) struct Elementwise {
    theta: Array1<f64>,
    limit: Option<f64>,
}

impl Elementwise {
    pub(crate) fn new(theta: Array1<f64>) -> Self {
        Self { theta, limit: None }
    }

    pub(crate) fn fragile(theta: Array1<f64>, limit: f64) -> Self {
        Self {
            theta,
            limit: Some(limit),
        }
    }

    fn check_limit(&self) -> Result<(), ModelError> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        match self.theta.iter().find(|&&value| value > limit) {
            Some(&value) => Err(ModelError::OutOfRange { value, limit }),
            None => Ok(()),
        }
    }
}

impl Model for Elementwise {
    type Input = Array1<f64>;
    type Output = Array1<f64>;
    type Error = ModelError;

    fn call(&self, input: &Array1<f64>) -> Result<Array1<f64>, ModelError> {
        check_len(self.theta.len(), input.len())?;
        self.check_limit()?;
        Ok(&self.theta * input)
    }
}

impl BatchEval for Elementwise {
    type Batch = Array2<f64>;
    type OutputBatch = Array2<f64>;
    type State = ();

    fn create_state(&self) {}

    fn call_batch(&self, batch: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        check_len(self.theta.len(), batch.ncols())?;
        self.check_limit()?;
        Ok(batch * &self.theta)
    }

    fn eval(&self, batch: &Array2<f64>, _state: &mut ()) -> Result<Array2<f64>, ModelError> {
        self.call_batch(batch)
    }
}

impl Differentiable for Elementwise {
    fn input_size(&self) -> usize {
        self.theta.len()
    }

    fn output_size(&self) -> usize {
        self.theta.len()
    }

    fn number_of_parameters(&self) -> usize {
        self.theta.len()
    }

    fn parameters(&self) -> Array1<f64> {
        self.theta.clone()
    }

    fn set_parameters(&mut self, parameters: ArrayView1<'_, f64>) {
        self.theta.assign(&parameters);
    }

    fn has_parameter_derivative(&self) -> bool {
        true
    }

    fn has_input_derivative(&self) -> bool {
        true
    }

    fn weighted_parameter_derivative(
        &self,
        batch: &Array2<f64>,
        _outputs: &Array2<f64>,
        coefficients: &Array2<f64>,
        _state: &(),
    ) -> Result<Array1<f64>, ModelError> {
        Ok((coefficients * batch).sum_axis(Axis(0)))
    }

    fn weighted_input_derivative(
        &self,
        _batch: &Array2<f64>,
        _outputs: &Array2<f64>,
        coefficients: &Array2<f64>,
        _state: &(),
    ) -> Result<Array2<f64>, ModelError> {
        Ok(coefficients * &self.theta)
    }
}

/// `f(x) = x`, without parameters.
#[derive(Debug, Clone)]
pub(crate) struct Identity {
    size: usize,
    derivatives: bool,
}

impl Identity {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            size,
            derivatives: true,
        }
    }

    /// An identity that claims to provide no derivatives.
    pub(crate) fn without_derivatives(size: usize) -> Self {
        Self {
            size,
            derivatives: false,
        }
    }
}

impl Model for Identity {
    type Input = Array1<f64>;
    type Output = Array1<f64>;
    type Error = ModelError;

    fn call(&self, input: &Array1<f64>) -> Result<Array1<f64>, ModelError> {
        check_len(self.size, input.len())?;
        Ok(input.clone())
    }
}

impl BatchEval for Identity {
    type Batch = Array2<f64>;
    type OutputBatch = Array2<f64>;
    type State = ();

    fn create_state(&self) {}

    fn call_batch(&self, batch: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        check_len(self.size, batch.ncols())?;
        Ok(batch.clone())
    }

    fn eval(&self, batch: &Array2<f64>, _state: &mut ()) -> Result<Array2<f64>, ModelError> {
        self.call_batch(batch)
    }
}

impl Differentiable for Identity {
    fn input_size(&self) -> usize {
        self.size
    }

    fn output_size(&self) -> usize {
        self.size
    }

    fn number_of_parameters(&self) -> usize {
        0
    }

    fn parameters(&self) -> Array1<f64> {
        Array1::zeros(0)
    }

    fn set_parameters(&mut self, _parameters: ArrayView1<'_, f64>) {}

    fn has_parameter_derivative(&self) -> bool {
        self.derivatives
    }

    fn has_input_derivative(&self) -> bool {
        self.derivatives
    }

    fn weighted_parameter_derivative(
        &self,
        _batch: &Array2<f64>,
        _outputs: &Array2<f64>,
        _coefficients: &Array2<f64>,
        _state: &(),
    ) -> Result<Array1<f64>, ModelError> {
        Ok(Array1::zeros(0))
    }

    fn weighted_input_derivative(
        &self,
        _batch: &Array2<f64>,
        _outputs: &Array2<f64>,
        coefficients: &Array2<f64>,
        _state: &(),
    ) -> Result<Array2<f64>, ModelError> {
        Ok(coefficients.clone())
    }
}

/// A way to break [`AffineTanh`] on purpose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Defect {
    /// Multiplies the parameter derivative.
    ParameterScale(f64),
    /// Multiplies the input derivative.
    InputScale(f64),
    /// Adds to the input derivative returned by the fused call only.
    FusedInputOffset(f64),
    /// Adds to the parameter derivative returned by the fused call only.
    FusedParameterOffset(f64),
    /// Drops the last entry of the parameter derivative on every path.
    ParameterTruncated,
    /// Appends zero rows to the input derivative on every path.
    InputExtraRows(usize),
    /// Adds to every output of the direct batch call.
    DirectBatchOffset(f64),
    /// Drops the last row from batches evaluated with a state.
    StateBatchTruncated,
}

/// `f(x) = tanh(W x + b)`.
///
/// Parameters are the rows of `W` followed by `b`.
#[derive(Debug, Clone)]
pub(crate) struct AffineTanh {
    weights: Array2<f64>,
    bias: Array1<f64>,
    defect: Option<Defect>,
}

/// Activations recorded by [`AffineTanh`] during a batch evaluation.
#[derive(Debug, Default)]
pub(crate) struct TanhState {
    activations: Array2<f64>,
}

impl AffineTanh {
    /// Creates a layer with zero weights and bias.
    pub(crate) fn new(inputs: usize, outputs: usize) -> Self {
        Self {
            weights: Array2::zeros((outputs, inputs)),
            bias: Array1::zeros(outputs),
            defect: None,
        }
    }

    pub(crate) fn with_defect(mut self, defect: Defect) -> Self {
        self.defect = Some(defect);
        self
    }

    /// Returns `coefficients * tanh'`, the derivative at the pre-activation.
    fn delta(&self, coefficients: &Array2<f64>, state: &TanhState) -> Result<Array2<f64>, ModelError> {
        check_len(state.activations.nrows(), coefficients.nrows())?;
        check_len(self.bias.len(), coefficients.ncols())?;
        Ok(coefficients * &state.activations.mapv(|y| 1.0 - y * y))
    }

    fn parameter_part(&self, batch: &Array2<f64>, delta: &Array2<f64>) -> Array1<f64> {
        let weights = delta.t().dot(batch);
        let bias = delta.sum_axis(Axis(0));
        let mut derivative: Array1<f64> = weights.iter().chain(bias.iter()).copied().collect();
        match self.defect {
            Some(Defect::ParameterScale(scale)) => derivative *= scale,
            Some(Defect::ParameterTruncated) if !derivative.is_empty() => {
                derivative = derivative.slice(s![..-1]).to_owned();
            }
            _ => {}
        }
        derivative
    }

    fn input_part(&self, delta: &Array2<f64>) -> Array2<f64> {
        let mut derivative = delta.dot(&self.weights);
        match self.defect {
            Some(Defect::InputScale(scale)) => derivative *= scale,
            Some(Defect::InputExtraRows(extra)) => {
                let (rows, cols) = derivative.dim();
                let mut padded = Array2::zeros((rows + extra, cols));
                padded.slice_mut(s![..rows, ..]).assign(&derivative);
                derivative = padded;
            }
            _ => {}
        }
        derivative
    }

    fn forward(&self, batch: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        check_len(self.weights.ncols(), batch.ncols())?;
        Ok((batch.dot(&self.weights.t()) + &self.bias).mapv(f64::tanh))
    }
}

impl Model for AffineTanh {
    type Input = Array1<f64>;
    type Output = Array1<f64>;
    type Error = ModelError;

    fn call(&self, input: &Array1<f64>) -> Result<Array1<f64>, ModelError> {
        check_len(self.weights.ncols(), input.len())?;
        Ok((self.weights.dot(input) + &self.bias).mapv(f64::tanh))
    }
}

impl BatchEval for AffineTanh {
    type Batch = Array2<f64>;
    type OutputBatch = Array2<f64>;
    type State = TanhState;

    fn create_state(&self) -> TanhState {
        TanhState::default()
    }

    fn call_batch(&self, batch: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        let mut outputs = self.forward(batch)?;
        if let Some(Defect::DirectBatchOffset(offset)) = self.defect {
            outputs += offset;
        }
        Ok(outputs)
    }

    fn eval(&self, batch: &Array2<f64>, state: &mut TanhState) -> Result<Array2<f64>, ModelError> {
        let mut outputs = self.forward(batch)?;
        if self.defect == Some(Defect::StateBatchTruncated) && outputs.nrows() > 0 {
            outputs = outputs.slice(s![..-1, ..]).to_owned();
        }
        state.activations = outputs.clone();
        Ok(outputs)
    }
}

impl Differentiable for AffineTanh {
    fn input_size(&self) -> usize {
        self.weights.ncols()
    }

    fn output_size(&self) -> usize {
        self.weights.nrows()
    }

    fn number_of_parameters(&self) -> usize {
        self.weights.len() + self.bias.len()
    }

    fn parameters(&self) -> Array1<f64> {
        self.weights.iter().chain(self.bias.iter()).copied().collect()
    }

    fn set_parameters(&mut self, parameters: ArrayView1<'_, f64>) {
        let split = self.weights.len();
        for (w, &p) in self.weights.iter_mut().zip(parameters.slice(s![..split])) {
            *w = p;
        }
        self.bias.assign(&parameters.slice(s![split..]));
    }

    fn has_parameter_derivative(&self) -> bool {
        true
    }

    fn has_input_derivative(&self) -> bool {
        true
    }

    fn weighted_parameter_derivative(
        &self,
        batch: &Array2<f64>,
        _outputs: &Array2<f64>,
        coefficients: &Array2<f64>,
        state: &TanhState,
    ) -> Result<Array1<f64>, ModelError> {
        let delta = self.delta(coefficients, state)?;
        Ok(self.parameter_part(batch, &delta))
    }

    fn weighted_input_derivative(
        &self,
        _batch: &Array2<f64>,
        _outputs: &Array2<f64>,
        coefficients: &Array2<f64>,
        state: &TanhState,
    ) -> Result<Array2<f64>, ModelError> {
        let delta = self.delta(coefficients, state)?;
        Ok(self.input_part(&delta))
    }

    fn weighted_derivatives(
        &self,
        batch: &Array2<f64>,
        _outputs: &Array2<f64>,
        coefficients: &Array2<f64>,
        state: &TanhState,
    ) -> Result<(Array1<f64>, Array2<f64>), ModelError> {
        let delta = self.delta(coefficients, state)?;
        let mut parameter = self.parameter_part(batch, &delta);
        let mut input = self.input_part(&delta);
        match self.defect {
            Some(Defect::FusedInputOffset(offset)) => input += offset,
            Some(Defect::FusedParameterOffset(offset)) => parameter += offset,
            _ => {}
        }
        Ok((parameter, input))
    }
}

/// Doubles unsigned integers; its batches are plain vectors.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Doubler {
    /// Added to the batched results of the direct path only.
    pub(crate) skew: u32,
}

impl Model for Doubler {
    type Input = u32;
    type Output = u32;
    type Error = ModelError;

    fn call(&self, input: &u32) -> Result<u32, ModelError> {
        Ok(input * 2)
    }
}

impl BatchEval for Doubler {
    type Batch = Vec<u32>;
    type OutputBatch = Vec<u32>;
    /// Number of batch evaluations made with this state.
    type State = usize;

    fn create_state(&self) -> usize {
        0
    }

    fn call_batch(&self, batch: &Vec<u32>) -> Result<Vec<u32>, ModelError> {
        Ok(batch.iter().map(|x| x * 2 + self.skew).collect())
    }

    fn eval(&self, batch: &Vec<u32>, state: &mut usize) -> Result<Vec<u32>, ModelError> {
        *state += 1;
        Ok(batch.iter().map(|x| x * 2).collect())
    }
}
