//! Age estimation engine.
//!
//! Stages, in the order the wizard runs them:
//!
//! - nearest-cell coordinate resolution (`coords`)
//! - per-source age PDFs (`pdf`)
//! - joint population PDF (`combine`)
//! - orchestration and summary statistics (`wizard`)

pub mod combine;
pub mod coords;
pub mod pdf;
pub mod wizard;

pub use combine::*;
pub use coords::*;
pub use pdf::*;
pub use wizard::*;
