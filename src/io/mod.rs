//! Input/output helpers.
//!
//! - JSON request files + default date fill (`request`)
//! - result exports (CSV/JSON) (`export`)

pub mod export;
pub mod request;

pub use export::*;
pub use request::*;
