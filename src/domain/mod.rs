//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the closed department set (`Department`)
//! - request shapes (`RawRecord`, `FeatureOverrides`, `ListingRequest`)
//! - outputs (`PredictionResult`, `ModelInfo`, `HealthReport`, `ListingQuote`)

pub mod types;

pub use types::*;
