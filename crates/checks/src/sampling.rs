//! Random sampling of parameters, coefficients, and points.
//!
//! Every randomized check draws from a caller-supplied [`Rng`], so a run is
//! reproducible from its seed and separate runs never share a stream.
//!
//! # Scaling convention
//!
//! A [`Sampling`] is a draw rule plus a [`Magnitude`]. The magnitude is either
//! absolute, or divided by the length `n` of the vector being drawn (the row
//! length for batches). Dividing by `n` bounds sums such as `W x` whose terms
//! grow with the dimension, which matters when the check compares results at
//! a tight tolerance.

use ndarray::{Array1, Array2};
use rand::Rng;

use crate::{ConfigError, config::positive};

/// The size of sampled values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Magnitude {
    /// Used as is.
    Absolute(f64),
    /// Divided by the dimension of the sampled vector.
    PerDimension(f64),
}

impl Magnitude {
    /// Resolves the magnitude for a vector of length `dimension`.
    ///
    /// A zero dimension leaves the magnitude unscaled.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn resolve(self, dimension: usize) -> f64 {
        match self {
            Self::Absolute(value) => value,
            Self::PerDimension(value) if dimension == 0 => value,
            Self::PerDimension(value) => value / dimension as f64,
        }
    }

    fn value(self) -> f64 {
        match self {
            Self::Absolute(value) | Self::PerDimension(value) => value,
        }
    }
}

/// How to fill a vector or batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sampling {
    /// Each component is drawn uniformly from `[-m, m]`.
    Uniform(Magnitude),
    /// Every component is set to `m`.
    Fixed(Magnitude),
}

impl Sampling {
    /// Uniform draws from `[-1, 1]`.
    pub const UNIT: Self = Self::Uniform(Magnitude::Absolute(1.0));

    /// Uniform draws from `[-1/n, 1/n]`.
    pub const UNIT_PER_DIMENSION: Self = Self::Uniform(Magnitude::PerDimension(1.0));

    /// Validates the magnitude.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Sampling`] if a uniform magnitude is not finite
    /// and positive, or a fixed magnitude is not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Uniform(magnitude) => positive(magnitude.value(), ConfigError::Sampling).map(drop),
            Self::Fixed(magnitude) if magnitude.value().is_finite() => Ok(()),
            Self::Fixed(_) => Err(ConfigError::Sampling),
        }
    }

    /// Draws a vector of length `len`.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, len: usize) -> Array1<f64> {
        match *self {
            Self::Uniform(magnitude) => {
                let m = magnitude.resolve(len);
                Array1::from_shape_fn(len, |_| rng.gen_range(-1.0_f64..=1.0) * m)
            }
            Self::Fixed(magnitude) => Array1::from_elem(len, magnitude.resolve(len)),
        }
    }

    /// Draws a batch with `rows` elements of length `cols`.
    ///
    /// Rows are drawn in order, so a batch of one row matches [`Sampling::draw`].
    pub fn draw_batch<R: Rng + ?Sized>(&self, rng: &mut R, rows: usize, cols: usize) -> Array2<f64> {
        match *self {
            Self::Uniform(magnitude) => {
                let m = magnitude.resolve(cols);
                Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-1.0_f64..=1.0) * m)
            }
            Self::Fixed(magnitude) => Array2::from_elem((rows, cols), magnitude.resolve(cols)),
        }
    }
}

/// Sampling rules for one randomized trial.
///
/// Each trial draws the parameters, then the coefficients, then the points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialSampling {
    pub parameters: Sampling,
    pub coefficients: Sampling,
    pub points: Sampling,
}

impl TrialSampling {
    /// Validates all three rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Sampling`] if any rule is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parameters.validate()?;
        self.coefficients.validate()?;
        self.points.validate()
    }
}
