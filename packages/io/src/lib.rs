#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Flat-file input and output for the ground-motion pipeline.
//!
//! Vector data is read and written as `GeoJSON` feature collections. A CRS
//! other than WGS84 is carried in the legacy named `crs` member so projected
//! outputs can be read back without guessing. Point tables are CSV.
//!
//! Every writer renders its whole file in memory and then renames it into
//! place, so a failed stage never leaves a truncated output behind.

pub mod table;
pub mod vector;

use std::path::{Path, PathBuf};

use infra_motion_crs::CrsError;
use infra_motion_models::PointSet;
use thiserror::Error;

/// Errors that can occur while reading or writing pipeline files.
#[derive(Debug, Error)]
pub enum IoError {
    /// An input file does not exist.
    #[error("Input not found: {path}")]
    InputNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// Filesystem operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// `GeoJSON` parsing or conversion failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// JSON handling failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file declared a CRS that cannot be resolved.
    #[error("CRS error: {0}")]
    Crs(#[from] CrsError),

    /// A feature or row is malformed.
    #[error("Invalid feature {index} in {path}: {message}")]
    InvalidFeature {
        /// File containing the feature.
        path: PathBuf,
        /// Zero-based feature or row index.
        index: usize,
        /// Description of what went wrong.
        message: String,
    },
}

/// Fails with [`IoError::InputNotFound`] if `path` does not exist.
///
/// # Errors
///
/// Returns an error if the file is missing.
pub fn ensure_input(path: &Path) -> Result<(), IoError> {
    if path.exists() {
        Ok(())
    } else {
        Err(IoError::InputNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Reads a point file, choosing the format from the extension.
///
/// `.csv` files are read with [`table::read_points_csv`] in `csv_crs`;
/// anything else is treated as `GeoJSON`.
///
/// # Errors
///
/// Returns an error if the file is missing or malformed.
pub fn read_points(path: &Path, csv_crs: infra_motion_crs::Crs) -> Result<PointSet, IoError> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        table::read_points_csv(path, csv_crs)
    } else {
        vector::read_points(path)
    }
}

/// Writes `contents` to `path` via a sibling temporary file.
///
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns an I/O error if the directory, the temporary file or the rename
/// fails.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), IoError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    log::debug!("Wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use infra_motion_crs::Crs;

    use super::*;

    #[test]
    fn missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.geojson");
        assert!(matches!(
            ensure_input(&path),
            Err(IoError::InputNotFound { .. })
        ));
        assert!(matches!(
            read_points(&path, Crs::wgs84()),
            Err(IoError::InputNotFound { .. })
        ));
    }

    #[test]
    fn atomic_write_creates_parents_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/out.csv");
        write_atomic(&path, b"x,y\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x,y\n");
        assert!(!dir.path().join("a/b/out.csv.tmp").exists());
    }

    #[test]
    fn dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pts.CSV");
        std::fs::write(&path, "x,y,velocity\n700000,730000,-1.5\n").unwrap();
        let set = read_points(&path, Crs::itm()).unwrap();
        assert_eq!(set.crs, Crs::itm());
        assert_eq!(set.len(), 1);
    }
}
