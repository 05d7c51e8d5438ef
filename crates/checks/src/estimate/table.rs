use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Derivatives of every output with respect to a set of variables.
///
/// Entry `i` holds `df/dx_i`, one value per output component. The variables
/// are either the model parameters or the coordinates of an input point.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeTable {
    values: Array2<f64>,
}

impl DerivativeTable {
    /// Creates a table from a matrix with one row per variable and one
    /// column per output.
    #[must_use]
    pub fn new(values: Array2<f64>) -> Self {
        Self { values }
    }

    /// Returns the number of entries (variables).
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    /// Returns `true` if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of outputs per entry.
    #[must_use]
    pub fn output_size(&self) -> usize {
        self.values.ncols()
    }

    /// Returns `df/dx_index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[must_use]
    pub fn entry(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.index_axis(Axis(0), index)
    }

    /// Returns `df_output/dx_i` for every variable `i`.
    ///
    /// # Panics
    ///
    /// Panics if `output >= self.output_size()`.
    #[must_use]
    pub fn column(&self, output: usize) -> ArrayView1<'_, f64> {
        self.values.index_axis(Axis(1), output)
    }

    /// Returns `sum_k coefficients[k] * df_k/dx_i` for every variable `i`.
    ///
    /// # Panics
    ///
    /// Panics if `coefficients.len() != self.output_size()`.
    #[must_use]
    pub fn weighted(&self, coefficients: ArrayView1<'_, f64>) -> Array1<f64> {
        self.values.dot(&coefficients)
    }

    /// Returns the underlying matrix.
    #[must_use]
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Consumes the table and returns the underlying matrix, one row per
    /// variable and one column per output.
    #[must_use]
    pub fn into_inner(self) -> Array2<f64> {
        self.values
    }
}
