//! # Error Module
//!
//! Hard failures are limited to structural problems: an unreadable config file, a
//! volume too small to hold a single cell, a duplicate chunk in the world, or a
//! march worker that went away. Numeric edge cases inside the extraction engine are
//! resolved where they occur and never surface here.

use cgmath::Point3;
use thiserror::Error;

/// Result type alias for terrain operations.
pub type TerrainResult<T> = Result<T, TerrainError>;

/// Errors that can occur while configuring or generating terrain.
#[derive(Debug, Error)]
pub enum TerrainError {
    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for a `TerrainConfig`.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A volume needs at least two lattice points per axis to contain a cell.
    #[error("volume size {0} is too small, at least 2 lattice points per axis are required")]
    InvalidVolumeSize(u32),

    /// A volume already occupies this grid coordinate.
    #[error("a chunk already exists at ({}, {}, {})", .0.x, .0.y, .0.z)]
    DuplicateChunk(Point3<i32>),

    /// A march worker hung up before returning its result.
    #[error("march worker {0} disconnected")]
    WorkerDisconnected(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TerrainError::InvalidVolumeSize(1);
        assert_eq!(
            err.to_string(),
            "volume size 1 is too small, at least 2 lattice points per axis are required"
        );

        let err = TerrainError::DuplicateChunk(Point3::new(1, 0, -2));
        assert_eq!(err.to_string(), "a chunk already exists at (1, 0, -2)");

        let err = TerrainError::WorkerDisconnected(3);
        assert_eq!(err.to_string(), "march worker 3 disconnected");
    }

    #[test]
    fn test_parse_error_converts() {
        let parse_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: TerrainError = parse_err.into();
        assert!(matches!(err, TerrainError::Parse(_)));
    }
}
