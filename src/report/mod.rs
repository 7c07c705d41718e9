//! Terminal reporting of age results.

pub mod format;

pub use format::*;
