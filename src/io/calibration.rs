use crate::types::{BandArray, ExplorerError, ExplorerResult};
use ndarray::Array2;
use quick_xml::de::from_str;
use serde::Deserialize;

/// Which calibration annotation column to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationKind {
    SigmaNought,
    BetaNought,
    Gamma,
    Dn,
}

/// Space-separated numeric list element, e.g.
/// `<pixel count="6">0 200 400 600 800 1000</pixel>`
#[derive(Debug, Deserialize)]
struct ValueList {
    #[serde(rename = "$text", default)]
    text: String,
}

impl ValueList {
    fn parse_f64(&self) -> ExplorerResult<Vec<f64>> {
        self.text
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|e| {
                    ExplorerError::XmlParsing(format!("Invalid numeric value '{}': {}", token, e))
                })
            })
            .collect()
    }

    fn parse_f32(&self) -> ExplorerResult<Vec<f32>> {
        self.text
            .split_whitespace()
            .map(|token| {
                token.parse::<f32>().map_err(|e| {
                    ExplorerError::XmlParsing(format!("Invalid numeric value '{}': {}", token, e))
                })
            })
            .collect()
    }
}

/// Structures for the thermal noise annotation
/// (root <noise> element of noise-*.xml)
#[derive(Debug, Deserialize)]
struct NoiseAnnotation {
    #[serde(rename = "noiseRangeVectorList")]
    noise_range_vector_list: NoiseRangeVectorList,
}

#[derive(Debug, Deserialize)]
struct NoiseRangeVectorList {
    #[serde(rename = "noiseRangeVector", default)]
    vectors: Vec<NoiseRangeVector>,
}

#[derive(Debug, Deserialize)]
struct NoiseRangeVector {
    #[serde(rename = "line")]
    line: usize,
    #[serde(rename = "pixel")]
    pixel: ValueList,
    #[serde(rename = "noiseRangeLut")]
    noise_range_lut: ValueList,
}

/// Structures for the radiometric calibration annotation
/// (root <calibration> element of calibration-*.xml)
#[derive(Debug, Deserialize)]
struct CalibrationAnnotation {
    #[serde(rename = "calibrationVectorList")]
    calibration_vector_list: CalibrationVectorList,
}

#[derive(Debug, Deserialize)]
struct CalibrationVectorList {
    #[serde(rename = "calibrationVector", default)]
    vectors: Vec<CalibrationVector>,
}

#[derive(Debug, Deserialize)]
struct CalibrationVector {
    #[serde(rename = "line")]
    line: usize,
    #[serde(rename = "pixel")]
    pixel: ValueList,
    #[serde(rename = "sigmaNought")]
    sigma_nought: ValueList,
    #[serde(rename = "betaNought")]
    beta_nought: ValueList,
    #[serde(rename = "gamma")]
    gamma: ValueList,
    #[serde(rename = "dn")]
    dn: ValueList,
}

/// A sparse annotation grid: correction values sampled at a subset of
/// image lines and pixels, evaluated anywhere by bilinear interpolation
/// with clamping past the first/last node.
#[derive(Debug, Clone)]
pub struct LookupTable {
    pub lines: Vec<f64>,
    pub pixels: Vec<f64>,
    pub values: Array2<f32>,
}

impl LookupTable {
    fn from_vectors(
        lines: Vec<f64>,
        pixels: Vec<f64>,
        rows: Vec<Vec<f32>>,
    ) -> ExplorerResult<Self> {
        if lines.is_empty() || pixels.is_empty() {
            return Err(ExplorerError::XmlParsing(
                "Annotation contains no vectors".to_string(),
            ));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != pixels.len() {
                return Err(ExplorerError::XmlParsing(format!(
                    "Vector {} has {} values for {} pixels",
                    i,
                    row.len(),
                    pixels.len()
                )));
            }
        }
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let values = Array2::from_shape_vec((lines.len(), pixels.len()), flat)
            .map_err(|e| ExplorerError::XmlParsing(format!("Bad LUT shape: {}", e)))?;
        Ok(LookupTable {
            lines,
            pixels,
            values,
        })
    }

    /// Bilinear evaluation at an arbitrary (line, pixel) position
    pub fn evaluate(&self, line: f64, pixel: f64) -> f32 {
        let (l0, l1, lw) = bracket(&self.lines, line);
        let (p0, p1, pw) = bracket(&self.pixels, pixel);

        let top = self.values[[l0, p0]] * (1.0 - pw) + self.values[[l0, p1]] * pw;
        let bottom = self.values[[l1, p0]] * (1.0 - pw) + self.values[[l1, p1]] * pw;
        top * (1.0 - lw) + bottom * lw
    }

    /// Interpolate the LUT onto a full image grid of the given shape.
    ///
    /// Axis brackets are computed once per row and column rather than
    /// per pixel.
    pub fn interpolate_to(&self, rows: usize, cols: usize) -> BandArray {
        let row_brackets: Vec<(usize, usize, f32)> = (0..rows)
            .map(|r| bracket(&self.lines, r as f64))
            .collect();
        let col_brackets: Vec<(usize, usize, f32)> = (0..cols)
            .map(|c| bracket(&self.pixels, c as f64))
            .collect();

        let mut out = Array2::zeros((rows, cols));
        for (r, &(l0, l1, lw)) in row_brackets.iter().enumerate() {
            for (c, &(p0, p1, pw)) in col_brackets.iter().enumerate() {
                let top = self.values[[l0, p0]] * (1.0 - pw) + self.values[[l0, p1]] * pw;
                let bottom = self.values[[l1, p0]] * (1.0 - pw) + self.values[[l1, p1]] * pw;
                out[[r, c]] = top * (1.0 - lw) + bottom * lw;
            }
        }
        out
    }
}

/// Binary search for the axis nodes surrounding `x`, with the
/// interpolation weight between them. Positions outside the axis clamp
/// to the first/last node.
fn bracket(axis: &[f64], x: f64) -> (usize, usize, f32) {
    let mut left = 0;
    let mut right = axis.len();
    while left < right {
        let mid = (left + right) / 2;
        if axis[mid] <= x {
            left = mid + 1;
        } else {
            right = mid;
        }
    }

    let before = if left > 0 { left - 1 } else { 0 };
    let after = if left < axis.len() { left } else { axis.len() - 1 };

    if before == after || axis[after] == axis[before] {
        return (before, after, 0.0);
    }
    let weight = ((x - axis[before]) / (axis[after] - axis[before])).clamp(0.0, 1.0) as f32;
    (before, after, weight)
}

/// Parse a noise-*.xml annotation into a thermal noise LUT
pub fn parse_noise_lut(xml_content: &str) -> ExplorerResult<LookupTable> {
    let annotation: NoiseAnnotation = from_str(xml_content)
        .map_err(|e| ExplorerError::XmlParsing(format!("Failed to parse noise XML: {}", e)))?;

    let mut lines = Vec::new();
    let mut pixels: Option<Vec<f64>> = None;
    let mut rows = Vec::new();

    for vector in &annotation.noise_range_vector_list.vectors {
        lines.push(vector.line as f64);
        let pixel_axis = vector.pixel.parse_f64()?;
        if pixels.is_none() {
            pixels = Some(pixel_axis);
        }
        rows.push(vector.noise_range_lut.parse_f32()?);
    }

    let pixels = pixels.ok_or_else(|| {
        ExplorerError::XmlParsing("No noiseRangeVector entries found".to_string())
    })?;
    let lut = LookupTable::from_vectors(lines, pixels, rows)?;
    log::debug!(
        "Noise LUT: {} lines x {} pixels",
        lut.lines.len(),
        lut.pixels.len()
    );
    Ok(lut)
}

/// Parse a calibration-*.xml annotation into a calibration LUT for the
/// requested backscatter representation
pub fn parse_calibration_lut(
    xml_content: &str,
    kind: CalibrationKind,
) -> ExplorerResult<LookupTable> {
    let annotation: CalibrationAnnotation = from_str(xml_content).map_err(|e| {
        ExplorerError::XmlParsing(format!("Failed to parse calibration XML: {}", e))
    })?;

    let mut lines = Vec::new();
    let mut pixels: Option<Vec<f64>> = None;
    let mut rows = Vec::new();

    for vector in &annotation.calibration_vector_list.vectors {
        lines.push(vector.line as f64);
        let pixel_axis = vector.pixel.parse_f64()?;
        if pixels.is_none() {
            pixels = Some(pixel_axis);
        }
        let values = match kind {
            CalibrationKind::SigmaNought => &vector.sigma_nought,
            CalibrationKind::BetaNought => &vector.beta_nought,
            CalibrationKind::Gamma => &vector.gamma,
            CalibrationKind::Dn => &vector.dn,
        };
        rows.push(values.parse_f32()?);
    }

    let pixels = pixels.ok_or_else(|| {
        ExplorerError::XmlParsing("No calibrationVector entries found".to_string())
    })?;
    let lut = LookupTable::from_vectors(lines, pixels, rows)?;
    log::debug!(
        "{:?} LUT: {} lines x {} pixels",
        kind,
        lut.lines.len(),
        lut.pixels.len()
    );
    Ok(lut)
}
