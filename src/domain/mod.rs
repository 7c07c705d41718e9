//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - diagram/abundance/unit enums (`DiagramKind`, `Abundance`, `AgeUnit`)
//! - the raw observation table (`ObservationTable`)
//! - non-fatal batch diagnostics (`Diagnostic`)
//! - run configuration (`AgeConfig`) and report outputs (`AgeReport`, etc.)

pub mod observations;
pub mod types;

pub use observations::*;
pub use types::*;
