// src/config/mod.rs

//! Matrix file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a matrix file from disk (`loader.rs`).
//! - Validate structural invariants like unique names and acyclicity
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{JobConfig, MatrixFile, RawMatrixFile, RunSection};
