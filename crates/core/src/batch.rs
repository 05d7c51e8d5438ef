use ndarray::{Array1, Array2, Axis};

/// An ordered collection of same-shaped elements processed together.
///
/// The batch check uses this to pull single elements out of a batch so it can
/// compare batched results against one-at-a-time evaluation.
pub trait Batch {
    /// The type of one element of the batch.
    type Element;

    /// Returns the number of elements in the batch.
    fn batch_size(&self) -> usize;

    /// Returns a copy of the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.batch_size()`.
    fn element(&self, index: usize) -> Self::Element;
}

/// A matrix batch holds one element per row.
impl Batch for Array2<f64> {
    type Element = Array1<f64>;

    fn batch_size(&self) -> usize {
        self.nrows()
    }

    fn element(&self, index: usize) -> Array1<f64> {
        self.index_axis(Axis(0), index).to_owned()
    }
}

impl<T: Clone> Batch for Vec<T> {
    type Element = T;

    fn batch_size(&self) -> usize {
        self.len()
    }

    fn element(&self, index: usize) -> T {
        self[index].clone()
    }
}
