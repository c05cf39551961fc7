//! Reporting: sweep statistics and formatted terminal output.
//!
//! Formatting lives in one place so the predictor stays free of presentation
//! and output changes are localized.

pub mod format;
pub mod summary;

pub use format::*;
pub use summary::*;
