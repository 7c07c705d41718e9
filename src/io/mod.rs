//! Input/output helpers.
//!
//! - observation CSV ingest (`observations`)
//! - model routing and loaders for HRD text / CMD JSON (`model`)
//! - result exports (PDF CSV, JSON report) (`export`)

pub mod export;
pub mod model;
pub mod observations;

pub use export::*;
pub use model::*;
pub use observations::*;
