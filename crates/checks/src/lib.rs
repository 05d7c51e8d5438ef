//! Finite-difference checks for differentiable models.
//!
//! The checks drive a model through the traits in `fdverify-core` and compare
//! what it reports against independent estimates:
//!
//! - [`estimate`]: central finite-difference derivative tables
//! - [`weighted`]: analytic weighted derivatives against the estimates,
//!   at a single point or over randomized trials
//! - [`joint`]: the fused derivative call against the two separate calls
//! - [`batch`]: batched evaluation against one-at-a-time evaluation
//! - [`compare`]: two derivative tables against each other
//!
//! Structural problems (wrong lengths, missing capabilities, model failures)
//! abort a check with an [`Error`]. Tolerance violations do not: they are
//! collected as [`Failure`]s in the returned [`Report`] so later comparisons
//! can still surface further discrepancies.
//!
//! Every comparison is also announced to an [`Observer`](fdverify_core::Observer)
//! as an [`Event`]. Returning [`Action::StopEarly`] ends the check with
//! [`Status::StoppedByObserver`].

pub mod batch;
pub mod compare;
pub mod estimate;
pub mod joint;
pub mod sampling;
pub mod weighted;

mod config;
mod error;
mod norm;
mod report;

#[cfg(test)]
mod test_models;

pub use config::ConfigError;
pub use error::{Error, EvalPath, Quantity};
pub use estimate::DerivativeTable;
pub use report::{Action, Check, Comparison, Diagnostic, Event, Failure, Location, Report, Status};
pub use sampling::{Magnitude, Sampling, TrialSampling};
