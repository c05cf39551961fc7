//! Model artifacts and the per-department registry.
//!
//! Artifacts are opaque to the predictor beyond the `Regressor`/`Scaler`
//! contracts, so alternative model kinds only need a trait impl.

pub mod artifact;
pub mod registry;

#[cfg(test)]
pub(crate) mod fixtures;

pub use artifact::*;
pub use registry::*;
