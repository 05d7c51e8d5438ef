/// A model that maps a single input to a single output.
pub trait Model {
    type Input;
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Calls the model with a single input.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// A model that can evaluate a whole batch of inputs at once.
///
/// Batched evaluation comes in two flavors. [`BatchEval::call_batch`] is the
/// direct operator, while [`BatchEval::eval`] additionally fills a
/// [`BatchEval::State`] that derivative computations consume afterwards.
/// Both must agree with calling [`Model::call`] on each element.
pub trait BatchEval: Model {
    /// A batch of inputs.
    type Batch;

    /// A batch of outputs, one per input element.
    type OutputBatch;

    /// Auxiliary data produced by [`BatchEval::eval`].
    ///
    /// A state belongs to one evaluation and must not be reused once the
    /// model's parameters have changed.
    type State;

    /// Creates an empty state for use with [`BatchEval::eval`].
    fn create_state(&self) -> Self::State;

    /// Evaluates every element of the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails.
    fn call_batch(&self, batch: &Self::Batch) -> Result<Self::OutputBatch, Self::Error>;

    /// Evaluates every element of the batch and records the state needed by
    /// a subsequent derivative call.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails.
    fn eval(
        &self,
        batch: &Self::Batch,
        state: &mut Self::State,
    ) -> Result<Self::OutputBatch, Self::Error>;
}
