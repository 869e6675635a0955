//! Input/Output: remote asset retrieval, local SAFE products,
//! calibration annotation parsing

pub mod assets;
pub mod calibration;
pub mod safe;

pub use assets::AssetLoader;
pub use calibration::{parse_calibration_lut, parse_noise_lut, CalibrationKind, LookupTable};
pub use safe::SafeReader;
