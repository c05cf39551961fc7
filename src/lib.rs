//! `expiry-pricer` library crate.
//!
//! Predicts prices for perishable grocery items from days-to-expiry, product
//! department and date, using one pre-trained model/scaler bundle per
//! department.
//!
//! The binary (`xp`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the predictor can be embedded behind another surface (HTTP, queue worker)

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod features;
pub mod io;
pub mod models;
pub mod plot;
pub mod predict;
pub mod report;
