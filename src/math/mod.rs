//! Mathematical utilities: nearest-cell search and distribution normalisation.

pub mod normalise;
pub mod search;

pub use normalise::*;
pub use search::*;
