use crate::types::{
    BandArray, ExplorerError, ExplorerResult, GeoTransform, RasterGrid, SceneResult,
};
use gdal::Dataset;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Fetches scene assets over HTTP and decodes raster bands with GDAL.
///
/// Each asset is downloaded into a temporary file which is removed when
/// the load returns, on success and on failure alike.
pub struct AssetLoader {
    client: reqwest::blocking::Client,
}

impl AssetLoader {
    pub fn new() -> ExplorerResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(300))
            .user_agent(concat!("scenescout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ExplorerError::AssetReadFailure(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { client })
    }

    /// Load the requested bands of a scene into raster grids.
    ///
    /// Every band name is resolved against the scene's asset mapping
    /// before the first byte is fetched, so an unknown name fails with
    /// `AssetNotFound` without any network activity.
    pub fn load_bands(
        &self,
        scene: &SceneResult,
        band_names: &[&str],
    ) -> ExplorerResult<HashMap<String, RasterGrid>> {
        let mut resolved = Vec::with_capacity(band_names.len());
        for name in band_names {
            resolved.push((*name, scene.asset(name)?));
        }

        let mut grids = HashMap::with_capacity(resolved.len());
        for (name, asset) in resolved {
            log::info!("Loading band '{}' from {}", name, asset.href);
            let grid = self.fetch_grid(&asset.href)?;
            log::debug!(
                "Band '{}': {}x{} pixels, extent {:?}",
                name,
                grid.rows(),
                grid.cols(),
                grid.extent()
            );
            grids.insert(name.to_string(), grid);
        }
        Ok(grids)
    }

    /// Fetch raw bytes of an asset URL (thumbnails, metadata documents)
    pub fn fetch_bytes(&self, url: &str) -> ExplorerResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ExplorerError::AssetReadFailure(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExplorerError::AssetReadFailure(format!(
                "{} returned {}",
                url, status
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| ExplorerError::AssetReadFailure(format!("{}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }

    /// Fetch one raster asset and decode it into a grid
    fn fetch_grid(&self, url: &str) -> ExplorerResult<RasterGrid> {
        let bytes = self.fetch_bytes(url)?;

        let mut tmp = tempfile::NamedTempFile::new()?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;

        read_raster(tmp.path())
            .map_err(|e| ExplorerError::AssetReadFailure(format!("Failed to decode {}: {}", url, e)))
    }
}

/// Read the first band of a GDAL-readable raster into a grid.
///
/// The grid's shape and geotransform are taken as-is from the source;
/// no resampling is performed.
pub fn read_raster<P: AsRef<Path>>(path: P) -> ExplorerResult<RasterGrid> {
    let dataset = Dataset::open(path.as_ref())?;

    let geo_transform = dataset.geo_transform()?;
    let (width, height) = dataset.raster_size();
    let crs = dataset.projection();

    log::debug!(
        "Raster {}: {}x{}",
        path.as_ref().display(),
        width,
        height
    );

    let rasterband = dataset.rasterband(1)?;
    let band_data = rasterband.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

    let data: BandArray = ndarray::Array2::from_shape_vec((height, width), band_data.data)
        .map_err(|e| ExplorerError::InvalidFormat(format!("Failed to reshape band data: {}", e)))?;

    Ok(RasterGrid {
        data,
        transform: GeoTransform::from_gdal(geo_transform),
        crs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetRef;

    fn scene_without_hh() -> SceneResult {
        let mut assets = HashMap::new();
        assets.insert(
            "VV".to_string(),
            AssetRef {
                href: "https://example.com/vv.tiff".to_string(),
                media_type: Some("image/tiff".to_string()),
                title: None,
            },
        );
        SceneResult {
            id: "scene-1".to_string(),
            bbox: None,
            properties: HashMap::new(),
            assets,
        }
    }

    #[test]
    fn test_missing_band_fails_before_any_fetch() {
        let loader = AssetLoader::new().unwrap();
        let scene = scene_without_hh();
        // "VV" resolves but "HH" does not; the whole call must fail with
        // AssetNotFound and never touch example.com
        let result = loader.load_bands(&scene, &["VV", "HH"]);
        assert!(matches!(result, Err(ExplorerError::AssetNotFound(_))));
    }
}
