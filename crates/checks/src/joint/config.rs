use crate::{
    ConfigError,
    config::positive,
    sampling::{Sampling, TrialSampling},
};

/// Configuration for the joint derivative check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointConfig {
    trials: usize,
    batch_size: usize,
    tolerance: f64,
    sampling: TrialSampling,
}

impl Default for JointConfig {
    /// 100 trials of 10-element batches compared at `1e-10`, with everything
    /// drawn from `[-1/n, 1/n]`.
    fn default() -> Self {
        Self {
            trials: 100,
            batch_size: 10,
            tolerance: 1e-10,
            sampling: TrialSampling {
                parameters: Sampling::UNIT_PER_DIMENSION,
                coefficients: Sampling::UNIT_PER_DIMENSION,
                points: Sampling::UNIT_PER_DIMENSION,
            },
        }
    }
}

impl JointConfig {
    /// Creates a new config.
    ///
    /// # Errors
    ///
    /// Returns an error if `trials` or `batch_size` is zero, if `tolerance`
    /// is not finite and positive, or if a sampling rule is invalid.
    pub fn new(
        trials: usize,
        batch_size: usize,
        tolerance: f64,
        sampling: TrialSampling,
    ) -> Result<Self, ConfigError> {
        if trials == 0 {
            return Err(ConfigError::Trials);
        }
        if batch_size == 0 {
            return Err(ConfigError::BatchSize);
        }
        sampling.validate()?;
        Ok(Self {
            trials,
            batch_size,
            tolerance: positive(tolerance, ConfigError::Tolerance)?,
            sampling,
        })
    }

    #[must_use]
    pub fn trials(&self) -> usize {
        self.trials
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    #[must_use]
    pub fn sampling(&self) -> &TrialSampling {
        &self.sampling
    }
}
