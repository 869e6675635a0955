use chrono::{DateTime, Utc};
use geo::{BoundingRect, Coord, Intersects, Line, LineString, Polygon};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Real-valued band data (digital numbers or backscatter)
pub type BandReal = f32;

/// 2D band data array (rows x columns)
pub type BandArray = Array2<BandReal>;

/// Polarization channels for Sentinel-1 GRD products
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarization {
    VV,
    VH,
    HV,
    HH,
}

impl Polarization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarization::VV => "VV",
            Polarization::VH => "VH",
            Polarization::HV => "HV",
            Polarization::HH => "HH",
        }
    }

    /// Detect the polarization embedded in a SAFE file name
    /// (e.g. "s1a-iw-grd-vh-...tiff" -> VH)
    pub fn from_file_name(name: &str) -> Option<Polarization> {
        let lower = name.to_lowercase();
        for pol in [
            Polarization::VV,
            Polarization::VH,
            Polarization::HV,
            Polarization::HH,
        ] {
            if lower.contains(&pol.as_str().to_lowercase()) {
                return Some(pol);
            }
        }
        None
    }
}

impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Polarization {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "VV" => Ok(Polarization::VV),
            "VH" => Ok(Polarization::VH),
            "HV" => Ok(Polarization::HV),
            "HH" => Ok(Polarization::HH),
            other => Err(ExplorerError::InvalidFormat(format!(
                "Invalid polarization: {}",
                other
            ))),
        }
    }
}

/// Geographic bounding box in lon/lat degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> ExplorerResult<Self> {
        if !(min_lon < max_lon && min_lat < max_lat) {
            return Err(ExplorerError::InvalidGeometry(format!(
                "Degenerate bounding box: [{}, {}, {}, {}]",
                min_lon, min_lat, max_lon, max_lat
            )));
        }
        Ok(BoundingBox {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// Parse a STAC-style [min_lon, min_lat, max_lon, max_lat] array
    pub fn from_slice(bbox: &[f64]) -> ExplorerResult<Self> {
        if bbox.len() != 4 {
            return Err(ExplorerError::InvalidGeometry(format!(
                "Expected 4 bbox values, got {}",
                bbox.len()
            )));
        }
        BoundingBox::new(bbox[0], bbox[1], bbox[2], bbox[3])
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon < other.max_lon
            && self.max_lon > other.min_lon
            && self.min_lat < other.max_lat
            && self.max_lat > other.min_lat
    }

    /// Intersection of two boxes, None when they are disjoint
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }
        Some(BoundingBox {
            min_lon: self.min_lon.max(other.min_lon),
            min_lat: self.min_lat.max(other.min_lat),
            max_lon: self.max_lon.min(other.max_lon),
            max_lat: self.max_lat.min(other.max_lat),
        })
    }

    /// True when `other` lies entirely inside this box, with a small
    /// tolerance for pixel-snapping round-off
    pub fn contains(&self, other: &BoundingBox) -> bool {
        const EPS: f64 = 1e-9;
        other.min_lon >= self.min_lon - EPS
            && other.max_lon <= self.max_lon + EPS
            && other.min_lat >= self.min_lat - EPS
            && other.max_lat <= self.max_lat + EPS
    }
}

/// Area of interest: a validated polygon in geographic coordinates.
///
/// Construction checks ring closure and rejects self-intersecting
/// exteriors, so downstream code never sees an invalid geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaOfInterest {
    polygon: Polygon<f64>,
    bbox: BoundingBox,
}

impl AreaOfInterest {
    pub fn from_polygon(polygon: Polygon<f64>) -> ExplorerResult<Self> {
        let exterior = polygon.exterior();
        if exterior.0.len() < 4 {
            return Err(ExplorerError::InvalidGeometry(
                "AOI polygon needs at least 3 distinct vertices".to_string(),
            ));
        }
        if Self::ring_self_intersects(exterior) {
            return Err(ExplorerError::InvalidGeometry(
                "AOI polygon is self-intersecting".to_string(),
            ));
        }
        let rect = polygon
            .bounding_rect()
            .ok_or_else(|| ExplorerError::InvalidGeometry("AOI polygon has no extent".to_string()))?;
        let bbox = BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)?;
        Ok(AreaOfInterest { polygon, bbox })
    }

    pub fn from_bbox(bbox: BoundingBox) -> Self {
        let polygon = Polygon::new(
            LineString::from(vec![
                (bbox.min_lon, bbox.min_lat),
                (bbox.max_lon, bbox.min_lat),
                (bbox.max_lon, bbox.max_lat),
                (bbox.min_lon, bbox.max_lat),
                (bbox.min_lon, bbox.min_lat),
            ]),
            vec![],
        );
        AreaOfInterest { polygon, bbox }
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    /// GeoJSON geometry object for the STAC search request body
    pub fn to_geojson(&self) -> serde_json::Value {
        let ring: Vec<[f64; 2]> = self
            .polygon
            .exterior()
            .0
            .iter()
            .map(|c| [c.x, c.y])
            .collect();
        serde_json::json!({
            "type": "Polygon",
            "coordinates": [ring],
        })
    }

    /// Check the exterior ring for proper (non-adjacent) segment crossings
    fn ring_self_intersects(ring: &LineString<f64>) -> bool {
        let coords: &[Coord<f64>] = &ring.0;
        let n = coords.len() - 1; // closed ring repeats the first vertex
        if n < 4 {
            return false; // a triangle cannot self-intersect
        }
        for i in 0..n {
            let a = Line::new(coords[i], coords[i + 1]);
            for j in (i + 1)..n {
                // skip adjacent segments, including the first/last pair
                if j == i + 1 || (i == 0 && j == n - 1) {
                    continue;
                }
                let b = Line::new(coords[j], coords[j + 1]);
                if a.intersects(&b) {
                    return true;
                }
            }
        }
        false
    }
}

/// One catalog search request: which collection, where, and optionally when.
///
/// Fields are validated at construction rather than at call time.
#[derive(Debug, Clone)]
pub struct SceneQuery {
    pub collection: String,
    pub aoi: AreaOfInterest,
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl SceneQuery {
    pub fn new(
        collection: impl Into<String>,
        aoi: AreaOfInterest,
        date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> ExplorerResult<Self> {
        let collection = collection.into();
        if collection.trim().is_empty() {
            return Err(ExplorerError::QueryRejected(
                "Collection identifier must not be empty".to_string(),
            ));
        }
        if let Some((start, stop)) = &date_range {
            if start > stop {
                return Err(ExplorerError::QueryRejected(format!(
                    "Date range start {} is after stop {}",
                    start, stop
                )));
            }
        }
        Ok(SceneQuery {
            collection,
            aoi,
            date_range,
        })
    }
}

/// Reference to one retrievable asset of a scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRef {
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// One scene returned by a catalog search: identifier, acquisition
/// properties, and named asset references. Read-only after return.
#[derive(Debug, Clone)]
pub struct SceneResult {
    pub id: String,
    pub bbox: Option<BoundingBox>,
    pub properties: HashMap<String, serde_json::Value>,
    pub assets: HashMap<String, AssetRef>,
}

impl SceneResult {
    pub fn asset(&self, name: &str) -> ExplorerResult<&AssetRef> {
        self.assets.get(name).ok_or_else(|| {
            ExplorerError::AssetNotFound(format!(
                "Asset '{}' not present in scene '{}'",
                name, self.id
            ))
        })
    }
}

/// Affine geotransform, GDAL field order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        GeoTransform {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    /// Geographic extent covered by a grid of the given shape.
    /// Rotation terms are not supported and are treated as zero.
    pub fn extent(&self, rows: usize, cols: usize) -> BoundingBox {
        let x0 = self.top_left_x;
        let x1 = self.top_left_x + cols as f64 * self.pixel_width;
        let y0 = self.top_left_y;
        let y1 = self.top_left_y + rows as f64 * self.pixel_height;
        BoundingBox {
            min_lon: x0.min(x1),
            max_lon: x0.max(x1),
            min_lat: y0.min(y1),
            max_lat: y0.max(y1),
        }
    }
}

/// One band's pixel values over geographic space: data plus the
/// geotransform and CRS needed to place it. Treated as an immutable
/// snapshot; cropping produces a new grid.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    pub data: BandArray,
    pub transform: GeoTransform,
    pub crs: String,
}

impl RasterGrid {
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn extent(&self) -> BoundingBox {
        self.transform.extent(self.rows(), self.cols())
    }
}

/// Error taxonomy for the explorer. Every condition is terminal for the
/// operation that raises it; nothing is retried locally.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Query rejected by catalog: {0}")]
    QueryRejected(String),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Asset read failure: {0}")]
    AssetReadFailure(String),

    #[error("Empty intersection: {0}")]
    EmptyIntersection(String),

    #[error("Render failure: {0}")]
    RenderFailure(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("XML parsing error: {0}")]
    XmlParsing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for explorer operations
pub type ExplorerResult<T> = Result<T, ExplorerError>;
