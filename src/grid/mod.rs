//! Population model grids.
//!
//! Responsibilities:
//!
//! - the 51-bin BPASS age axis and its time weights (`time_bins`)
//! - the time-weighted three-abundance grid with stacking (`age_grid`)
//! - HRD / CMD model containers behind one closed enum (`model`)

pub mod age_grid;
pub mod model;
pub mod time_bins;

pub use age_grid::*;
pub use model::*;
pub use time_bins::*;
