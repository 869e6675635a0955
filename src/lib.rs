//! scenescout: STAC scene discovery, Sentinel-1 GRD band loading and AOI clipping
//!
//! A thin, synchronous client for exploring satellite imagery over an area
//! of interest: query a STAC catalog for matching scenes, fetch thumbnails
//! and raster bands, apply the standard GRD corrections, and clip grids to
//! the AOI. Sequencing is left entirely to the caller; no operation
//! retries, caches, or keeps state between calls.
//!
//! ```no_run
//! use scenescout::{AreaOfInterest, AssetLoader, BoundingBox, SceneQuery, StacClient};
//!
//! # fn main() -> scenescout::ExplorerResult<()> {
//! let aoi = AreaOfInterest::from_bbox(BoundingBox::new(10.0, 45.0, 10.5, 45.5)?);
//! let query = SceneQuery::new("sentinel-1-grd", aoi.clone(), None)?;
//!
//! let client = StacClient::new("https://earth-search.aws.element84.com/v1")?;
//! let scenes = client.search(&query)?;
//!
//! if let Some(scene) = scenes.first() {
//!     let loader = AssetLoader::new()?;
//!     let bands = loader.load_bands(scene, &["VV", "VH"])?;
//!     let clipped = scenescout::crop(&bands["VV"], &aoi)?;
//!     scenescout::show(scenescout::Artifact::Grid(&clipped), "vv_preview.png")?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    AreaOfInterest, AssetRef, BandArray, BandReal, BoundingBox, ExplorerError, ExplorerResult,
    GeoTransform, Polarization, RasterGrid, SceneQuery, SceneResult,
};

pub use catalog::StacClient;
pub use core::{
    crop, radiometric_calibration, remove_thermal_noise, render_grid, render_thumbnail, show,
    Artifact,
};
pub use io::{AssetLoader, CalibrationKind, LookupTable, SafeReader};
