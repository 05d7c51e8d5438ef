use std::{error::Error as StdError, fmt};

use fdverify_core::Capability;
use thiserror::Error;

use crate::ConfigError;

/// A vector or matrix whose length a check validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Parameters,
    Point,
    Coefficients,
    Outputs,
    ParameterDerivative,
    InputDerivative,
    TableEntries,
    TableEntry,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parameters => "parameter vector",
            Self::Point => "point",
            Self::Coefficients => "coefficient vector",
            Self::Outputs => "model output",
            Self::ParameterDerivative => "parameter derivative",
            Self::InputDerivative => "input derivative",
            Self::TableEntries => "derivative table",
            Self::TableEntry => "derivative table entry",
        };
        f.write_str(name)
    }
}

/// The two batched evaluation paths of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalPath {
    /// `BatchEval::call_batch`.
    Direct,
    /// `BatchEval::eval` with an explicit state.
    WithState,
}

impl fmt::Display for EvalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct batch call"),
            Self::WithState => f.write_str("batch eval with state"),
        }
    }
}

/// Fatal errors that abort a check.
#[derive(Debug, Error)]
pub enum Error {
    #[error("model does not provide the {0}")]
    Unsupported(Capability),

    #[error("{quantity} has length {actual}, expected {expected}")]
    ShapeMismatch {
        quantity: Quantity,
        expected: usize,
        actual: usize,
    },

    #[error("{quantity} has shape {actual:?}, expected {expected:?}")]
    MatrixShapeMismatch {
        quantity: Quantity,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("{path} returned {actual} results for a batch of {expected}")]
    BatchSize {
        path: EvalPath,
        expected: usize,
        actual: usize,
    },

    #[error("epsilon must be finite and positive, got {value}")]
    InvalidEpsilon { value: f64 },

    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("model call failed")]
    Model(#[source] Box<dyn StdError + Send + Sync>),
}

impl Error {
    /// Boxes a model error.
    pub(crate) fn model(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::Model(Box::new(error))
    }
}

/// Fails with [`Error::ShapeMismatch`] unless `actual == expected`.
pub(crate) fn ensure_len(quantity: Quantity, expected: usize, actual: usize) -> Result<(), Error> {
    if actual == expected {
        Ok(())
    } else {
        Err(Error::ShapeMismatch {
            quantity,
            expected,
            actual,
        })
    }
}

/// Fails with [`Error::MatrixShapeMismatch`] unless the `(rows, cols)` shapes
/// agree.
pub(crate) fn ensure_dim(
    quantity: Quantity,
    expected: (usize, usize),
    actual: (usize, usize),
) -> Result<(), Error> {
    if actual == expected {
        Ok(())
    } else {
        Err(Error::MatrixShapeMismatch {
            quantity,
            expected,
            actual,
        })
    }
}

/// Fails with [`Error::BatchSize`] unless `actual == expected`.
pub(crate) fn ensure_batch(path: EvalPath, expected: usize, actual: usize) -> Result<(), Error> {
    if actual == expected {
        Ok(())
    } else {
        Err(Error::BatchSize {
            path,
            expected,
            actual,
        })
    }
}

/// Fails with [`Error::Unsupported`] unless the model provides `capability`.
pub(crate) fn require<M>(model: &M, capability: Capability) -> Result<(), Error>
where
    M: fdverify_core::Differentiable + ?Sized,
{
    if model.supports(capability) {
        Ok(())
    } else {
        Err(Error::Unsupported(capability))
    }
}
