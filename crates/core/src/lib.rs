//! Core traits for finite-difference derivative verification.
//!
//! This crate defines the capabilities a model exposes to the checks in
//! `fdverify-checks`:
//!
//! - [`Model`]: a callable that maps a single input to an output
//! - [`BatchEval`]: batched evaluation, with and without an explicit state
//! - [`Differentiable`]: parameter access and weighted derivatives for
//!   vector-valued models
//! - [`Batch`] and [`Distance`]: the adapters the batch check uses to split
//!   batches into elements and to compare results
//! - [`Observer`]: receives check events and optionally returns control actions

mod batch;
mod differentiable;
mod distance;
mod model;
mod observer;

pub use batch::Batch;
pub use differentiable::{Capability, Differentiable};
pub use distance::Distance;
pub use model::{BatchEval, Model};
pub use observer::Observer;
