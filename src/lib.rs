//! `stellar-ages` library crate.
//!
//! Age estimates for stellar populations: observed sources are matched to the
//! nearest cell of an HR-diagram or colour-magnitude-diagram model grid, each
//! source gets a probability distribution over 51 log-age bins, and the
//! per-source distributions are combined into one population age.
//!
//! The binary (`ages`) is a thin wrapper around this library so the engine is
//! testable without spawning processes.

pub mod age;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod grid;
pub mod io;
pub mod math;
pub mod report;
