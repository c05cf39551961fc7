//! Feature construction.
//!
//! - column contract shared with the model artifacts (`columns`)
//! - ISO date parsing and calendar fields (`calendar`)
//! - batch validation and matrix building (`builder`)

pub mod builder;
pub mod calendar;
pub mod columns;

pub use builder::*;
pub use calendar::*;
pub use columns::*;
