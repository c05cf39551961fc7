//! Inference over feature matrices.
//!
//! - per-row dispatch to department bundles (`batch`)
//! - marketplace listing adapter (`listing`)

pub mod batch;
pub mod listing;

pub use batch::*;
pub use listing::*;
