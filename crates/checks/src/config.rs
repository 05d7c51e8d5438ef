use thiserror::Error;

/// Errors that can occur when validating a check config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tolerance must be finite and positive")]
    Tolerance,

    #[error("estimation epsilon must be finite and positive")]
    Epsilon,

    #[error("trial count must be non-zero")]
    Trials,

    #[error("batch size must be non-zero")]
    BatchSize,

    #[error("uniform sampling needs a finite positive magnitude, fixed sampling a finite one")]
    Sampling,
}

/// Returns `Ok(value)` if it is finite and strictly positive.
pub(crate) fn positive(value: f64, error: ConfigError) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(error)
    }
}
