use std::ops::{Deref, DerefMut};

use fdverify_core::Differentiable;
use ndarray::Array1;

/// Exclusive access to a model that puts its parameters back when dropped.
///
/// Anything holding the guard may overwrite the parameters freely; the
/// parameters captured at construction are restored on every exit path,
/// including early returns and unwinding.
pub(crate) struct ParameterGuard<'m, M: Differentiable> {
    model: &'m mut M,
    saved: Array1<f64>,
}

impl<'m, M: Differentiable> ParameterGuard<'m, M> {
    pub(crate) fn new(model: &'m mut M) -> Self {
        let saved = model.parameters();
        Self { model, saved }
    }

    /// Returns the parameters that will be restored.
    pub(crate) fn saved(&self) -> &Array1<f64> {
        &self.saved
    }
}

impl<M: Differentiable> Deref for ParameterGuard<'_, M> {
    type Target = M;

    fn deref(&self) -> &M {
        &*self.model
    }
}

impl<M: Differentiable> DerefMut for ParameterGuard<'_, M> {
    fn deref_mut(&mut self) -> &mut M {
        &mut *self.model
    }
}

impl<M: Differentiable> Drop for ParameterGuard<'_, M> {
    fn drop(&mut self) {
        self.model.set_parameters(self.saved.view());
    }
}
