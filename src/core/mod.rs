//! Core raster operations

pub mod correction;
pub mod crop;
pub mod render;

pub use correction::{radiometric_calibration, remove_thermal_noise};
pub use crop::crop;
pub use render::{render_grid, render_thumbnail, show, Artifact};
