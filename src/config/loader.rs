// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{MatrixFile, RawMatrixFile};
use crate::errors::Result;

/// Read and deserialize a matrix file without semantic validation.
///
/// Use [`load_and_validate`] unless you need the raw shape.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawMatrixFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_str(&contents)
}

/// Deserialize a matrix from TOML text without semantic validation.
pub fn parse_str(contents: &str) -> Result<RawMatrixFile> {
    let config: RawMatrixFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a matrix file and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - empty matrices and empty or duplicate job names,
///   - self-dependencies and cycles,
///   - `[run]` sanity.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<MatrixFile> {
    let raw_config = load_from_path(&path)?;
    MatrixFile::try_from(raw_config)
}

/// Matrix file used when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Jobmatrix.toml")
}
