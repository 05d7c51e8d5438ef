use crate::{
    ConfigError,
    config::positive,
    estimate::DEFAULT_ESTIMATION_EPSILON,
    sampling::{Magnitude, Sampling, TrialSampling},
};

/// Tolerances for comparing a weighted derivative at a single point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedConfig {
    tolerance: f64,
    estimation_epsilon: f64,
}

impl Default for WeightedConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            estimation_epsilon: DEFAULT_ESTIMATION_EPSILON,
        }
    }
}

impl WeightedConfig {
    /// Creates a new config.
    ///
    /// # Errors
    ///
    /// Returns an error if either value is not finite and positive.
    pub fn new(tolerance: f64, estimation_epsilon: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            tolerance: positive(tolerance, ConfigError::Tolerance)?,
            estimation_epsilon: positive(estimation_epsilon, ConfigError::Epsilon)?,
        })
    }

    /// Returns the largest accepted error.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Returns the finite-difference step of the estimate.
    #[must_use]
    pub fn estimation_epsilon(&self) -> f64 {
        self.estimation_epsilon
    }
}

/// Configuration for a randomized weighted-derivative run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialConfig {
    trials: usize,
    weighted: WeightedConfig,
    sampling: TrialSampling,
}

impl TrialConfig {
    /// Creates a new config.
    ///
    /// # Errors
    ///
    /// Returns an error if `trials` is zero or a sampling rule is invalid.
    pub fn new(
        trials: usize,
        weighted: WeightedConfig,
        sampling: TrialSampling,
    ) -> Result<Self, ConfigError> {
        if trials == 0 {
            return Err(ConfigError::Trials);
        }
        sampling.validate()?;
        Ok(Self {
            trials,
            weighted,
            sampling,
        })
    }

    /// Defaults for the parameter-derivative run: 1000 trials with
    /// parameters, coefficients and points all drawn from `[-1, 1]`.
    #[must_use]
    pub fn parameter_derivative() -> Self {
        Self {
            trials: 1000,
            weighted: WeightedConfig::default(),
            sampling: TrialSampling {
                parameters: Sampling::UNIT,
                coefficients: Sampling::UNIT,
                points: Sampling::UNIT,
            },
        }
    }

    /// Defaults for the input-derivative run: 1000 trials with every
    /// parameter fixed at `1/n` and coefficients and points drawn from
    /// `[-1, 1]`.
    #[must_use]
    pub fn input_derivative() -> Self {
        Self {
            trials: 1000,
            weighted: WeightedConfig::default(),
            sampling: TrialSampling {
                parameters: Sampling::Fixed(Magnitude::PerDimension(1.0)),
                coefficients: Sampling::UNIT,
                points: Sampling::UNIT,
            },
        }
    }

    /// Returns a copy with a different trial count.
    ///
    /// # Errors
    ///
    /// Returns an error if `trials` is zero.
    pub fn with_trials(self, trials: usize) -> Result<Self, ConfigError> {
        Self::new(trials, self.weighted, self.sampling)
    }

    #[must_use]
    pub fn trials(&self) -> usize {
        self.trials
    }

    #[must_use]
    pub fn weighted(&self) -> &WeightedConfig {
        &self.weighted
    }

    #[must_use]
    pub fn sampling(&self) -> &TrialSampling {
        &self.sampling
    }
}
