use crate::io::assets::read_raster;
use crate::io::calibration::{
    parse_calibration_lut, parse_noise_lut, CalibrationKind, LookupTable,
};
use crate::types::{ExplorerError, ExplorerResult, Polarization, RasterGrid};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Reader for an unzipped Sentinel-1 GRD product in SAFE format.
///
/// Measurement GeoTIFFs live under `measurement/`, noise and calibration
/// annotation XML under `annotation/calibration/`. File names carry the
/// polarization (e.g. "s1a-iw-grd-vh-...tiff").
pub struct SafeReader {
    safe_path: PathBuf,
}

impl SafeReader {
    pub fn new<P: AsRef<Path>>(safe_path: P) -> ExplorerResult<Self> {
        let safe_path = safe_path.as_ref().to_path_buf();
        if !safe_path.is_dir() {
            return Err(ExplorerError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("SAFE directory not found: {}", safe_path.display()),
            )));
        }
        Ok(Self { safe_path })
    }

    /// Map each polarization to its measurement GeoTIFF
    pub fn measurement_files(&self) -> ExplorerResult<HashMap<Polarization, PathBuf>> {
        let measurement_path = self.safe_path.join("measurement");
        if !measurement_path.is_dir() {
            return Err(ExplorerError::InvalidFormat(format!(
                "'measurement' folder not found inside {}",
                self.safe_path.display()
            )));
        }

        let mut files = HashMap::new();
        for entry in std::fs::read_dir(&measurement_path)? {
            let entry = entry?;
            let path = entry.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            if !(name.ends_with(".tiff") || name.ends_with(".tif")) {
                continue;
            }
            let pol = Polarization::from_file_name(&name).ok_or_else(|| {
                ExplorerError::InvalidFormat(format!(
                    "Polarization not found in file name: {}",
                    name
                ))
            })?;
            files.insert(pol, path);
        }

        if files.is_empty() {
            return Err(ExplorerError::InvalidFormat(
                "No GeoTIFF files found in 'measurement' folder".to_string(),
            ));
        }
        Ok(files)
    }

    /// Polarizations present in the product, in no particular order
    pub fn available_polarizations(&self) -> ExplorerResult<Vec<Polarization>> {
        Ok(self.measurement_files()?.into_keys().collect())
    }

    /// Read one polarization's measurement band into a raster grid
    pub fn read_band(&self, pol: Polarization) -> ExplorerResult<RasterGrid> {
        let files = self.measurement_files()?;
        let path = files.get(&pol).ok_or_else(|| {
            ExplorerError::InvalidFormat(format!(
                "Polarization {} not present in {}",
                pol,
                self.safe_path.display()
            ))
        })?;

        log::info!("Reading {} band from {}", pol, path.display());
        read_raster(path)
    }

    /// Thermal noise removal LUT for one polarization
    pub fn noise_lut(&self, pol: Polarization) -> ExplorerResult<LookupTable> {
        let path = self.find_annotation_file("noise", pol)?;
        log::info!("Reading noise annotation for {} band", pol);
        let xml = std::fs::read_to_string(path)?;
        parse_noise_lut(&xml)
    }

    /// Radiometric calibration LUT for one polarization
    pub fn calibration_lut(
        &self,
        pol: Polarization,
        kind: CalibrationKind,
    ) -> ExplorerResult<LookupTable> {
        let path = self.find_annotation_file("calibration", pol)?;
        log::info!("Reading {:?} calibration for {} band", kind, pol);
        let xml = std::fs::read_to_string(path)?;
        parse_calibration_lut(&xml, kind)
    }

    /// Locate the annotation XML with the given prefix ("noise" or
    /// "calibration") for one polarization
    fn find_annotation_file(&self, prefix: &str, pol: Polarization) -> ExplorerResult<PathBuf> {
        let calibration_path = self.safe_path.join("annotation").join("calibration");
        if !calibration_path.is_dir() {
            return Err(ExplorerError::InvalidFormat(format!(
                "'calibration' folder not found inside {}",
                self.safe_path.display()
            )));
        }

        for entry in std::fs::read_dir(&calibration_path)? {
            let entry = entry?;
            let path = entry.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_lowercase(),
                None => continue,
            };
            if name.starts_with(prefix)
                && name.ends_with(".xml")
                && Polarization::from_file_name(&name) == Some(pol)
            {
                return Ok(path);
            }
        }

        Err(ExplorerError::InvalidFormat(format!(
            "No {} annotation XML for polarization {} in {}",
            prefix,
            pol,
            calibration_path.display()
        )))
    }
}
