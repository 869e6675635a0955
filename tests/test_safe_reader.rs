use scenescout::io::calibration::CalibrationKind;
use scenescout::{ExplorerError, Polarization, SafeReader};
use std::fs;
use std::path::Path;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Build a minimal SAFE directory tree. Measurement files are empty
/// placeholders; tests that need decodable rasters are skipped when no
/// real product is available, the annotation paths are exercised with
/// synthetic XML.
fn make_safe_tree(root: &Path) {
    let measurement = root.join("measurement");
    fs::create_dir_all(&measurement).unwrap();
    fs::write(
        measurement.join("s1a-iw-grd-vv-20200103t170815-001.tiff"),
        b"",
    )
    .unwrap();
    fs::write(
        measurement.join("s1a-iw-grd-vh-20200103t170815-002.tiff"),
        b"",
    )
    .unwrap();

    let calibration = root.join("annotation").join("calibration");
    fs::create_dir_all(&calibration).unwrap();
    let noise_xml = r#"<noise><noiseRangeVectorList count="1">
        <noiseRangeVector>
          <azimuthTime>t</azimuthTime>
          <line>0</line>
          <pixel count="2">0 10</pixel>
          <noiseRangeLut count="2">5.0 6.0</noiseRangeLut>
        </noiseRangeVector>
      </noiseRangeVectorList></noise>"#;
    let cal_xml = r#"<calibration><calibrationVectorList count="1">
        <calibrationVector>
          <azimuthTime>t</azimuthTime>
          <line>0</line>
          <pixel count="2">0 10</pixel>
          <sigmaNought count="2">100.0 110.0</sigmaNought>
          <betaNought count="2">120.0 120.0</betaNought>
          <gamma count="2">90.0 95.0</gamma>
          <dn count="2">1.0 1.0</dn>
        </calibrationVector>
      </calibrationVectorList></calibration>"#;
    fs::write(
        calibration.join("noise-s1a-iw-grd-vv-20200103t170815-001.xml"),
        noise_xml,
    )
    .unwrap();
    fs::write(
        calibration.join("calibration-s1a-iw-grd-vv-20200103t170815-001.xml"),
        cal_xml,
    )
    .unwrap();
}

#[test]
fn test_measurement_discovery() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    make_safe_tree(dir.path());

    let reader = SafeReader::new(dir.path()).unwrap();
    let files = reader.measurement_files().unwrap();

    assert_eq!(files.len(), 2);
    assert!(files.contains_key(&Polarization::VV));
    assert!(files.contains_key(&Polarization::VH));

    let mut pols = reader.available_polarizations().unwrap();
    pols.sort_by_key(|p| p.as_str());
    assert_eq!(pols, vec![Polarization::VH, Polarization::VV]);
}

#[test]
fn test_missing_measurement_folder() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let reader = SafeReader::new(dir.path()).unwrap();
    let result = reader.measurement_files();
    assert!(matches!(result, Err(ExplorerError::InvalidFormat(_))));
}

#[test]
fn test_missing_safe_directory() {
    init_logging();
    let result = SafeReader::new("/nonexistent/product.SAFE");
    assert!(result.is_err());
}

#[test]
fn test_file_without_polarization_rejected() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let measurement = dir.path().join("measurement");
    fs::create_dir_all(&measurement).unwrap();
    fs::write(measurement.join("quicklook.tiff"), b"").unwrap();

    let reader = SafeReader::new(dir.path()).unwrap();
    let result = reader.measurement_files();
    assert!(matches!(result, Err(ExplorerError::InvalidFormat(_))));
}

#[test]
fn test_annotation_luts_from_tree() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    make_safe_tree(dir.path());

    let reader = SafeReader::new(dir.path()).unwrap();

    let noise = reader.noise_lut(Polarization::VV).unwrap();
    assert_eq!(noise.pixels, vec![0.0, 10.0]);
    assert_eq!(noise.values[[0, 1]], 6.0);

    let sigma = reader
        .calibration_lut(Polarization::VV, CalibrationKind::SigmaNought)
        .unwrap();
    assert_eq!(sigma.values[[0, 0]], 100.0);

    let gamma = reader
        .calibration_lut(Polarization::VV, CalibrationKind::Gamma)
        .unwrap();
    assert_eq!(gamma.values[[0, 1]], 95.0);

    // no annotation for VH in this tree
    let result = reader.noise_lut(Polarization::VH);
    assert!(matches!(result, Err(ExplorerError::InvalidFormat(_))));
}

#[test]
fn test_read_band_with_real_product() {
    init_logging();
    // Real SAFE products are multi-GB; exercise GDAL decoding only when
    // one is provided by the environment
    let product = std::env::var("SCENESCOUT_TEST_SAFE").ok();
    let Some(product) = product else {
        println!("SCENESCOUT_TEST_SAFE not set, skipping GDAL read test");
        return;
    };

    let reader = SafeReader::new(&product).expect("Failed to open SAFE product");
    let pols = reader.available_polarizations().expect("No polarizations");
    let grid = reader.read_band(pols[0]).expect("Failed to read band");
    assert!(grid.rows() > 0);
    assert!(grid.cols() > 0);
}
