// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

/// Errors that can occur during solver setup, I/O, or interface localization.
#[derive(Debug)]
pub enum FmmError {
    /// Number of spatial dimensions is unsupported (must be 1, 2, or 3).
    InvalidDimension(usize),
    /// Grid shape is invalid (dimension too small).
    InvalidGridShape {
        /// The axis index.
        axis: usize,
        /// The size provided.
        size: usize,
    },
    /// Grid spacing is not positive and finite.
    InvalidGridSpacing {
        /// The axis index.
        axis: usize,
        /// The spacing provided.
        value: f64,
    },
    /// Fillbox is empty or extends past the ghostbox.
    InvalidFillbox {
        /// The axis index.
        axis: usize,
        /// Lower end of the fillbox range (half-open).
        lo: usize,
        /// Upper end of the fillbox range.
        hi: usize,
        /// The ghostbox size on that axis.
        size: usize,
    },
    /// Spatial derivative order is unsupported (must be 1 or 2).
    InvalidSpatialOrder(usize),
    /// Distance cutoff is not positive and finite.
    InvalidCutoff(f64),
    /// Array length does not match the grid shape.
    ShapeMismatch {
        /// The expected shape.
        expected: Vec<usize>,
        /// The actual shape encountered.
        got: Vec<usize>,
    },
    /// The level set function has no sign change anywhere in the fillbox.
    InterfaceNotFound,
    /// Degenerate tetrahedron passed to the line-finding utility.
    DegenerateTetrahedron(String),
    /// Unsupported data type in file.
    UnsupportedDtype(String),
    /// Unsupported file format (unrecognized extension).
    UnsupportedFileFormat(String),
    /// Expected MAT variable not found in file.
    MatVariableNotFound {
        /// The variable name that was requested.
        expected: String,
        /// The variable names that are available.
        available: Vec<String>,
    },
    /// I/O error occurred.
    IoError(std::io::Error),
    /// Other error with a descriptive message.
    Other(String),
}

impl fmt::Display for FmmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FmmError::InvalidDimension(n) => {
                write!(f, "invalid dimension: {} (must be 1, 2, or 3)", n)
            }
            FmmError::InvalidGridShape { axis, size } => {
                write!(
                    f,
                    "invalid grid shape: axis {} has size {} (must be >= 2)",
                    axis, size
                )
            }
            FmmError::InvalidGridSpacing { axis, value } => {
                write!(
                    f,
                    "invalid grid spacing on axis {}: {} (must be positive and finite)",
                    axis, value
                )
            }
            FmmError::InvalidFillbox { axis, lo, hi, size } => {
                write!(
                    f,
                    "invalid fillbox on axis {}: [{}, {}) does not fit in ghostbox of size {}",
                    axis, lo, hi, size
                )
            }
            FmmError::InvalidSpatialOrder(order) => {
                write!(
                    f,
                    "invalid spatial derivative order: {} (must be 1 or 2)",
                    order
                )
            }
            FmmError::InvalidCutoff(cutoff) => {
                write!(
                    f,
                    "invalid distance cutoff: {} (must be positive and finite)",
                    cutoff
                )
            }
            FmmError::ShapeMismatch { expected, got } => {
                write!(f, "shape mismatch: expected {:?}, got {:?}", expected, got)
            }
            FmmError::InterfaceNotFound => {
                write!(
                    f,
                    "no interface found: phi does not change sign in the fillbox"
                )
            }
            FmmError::DegenerateTetrahedron(reason) => {
                write!(f, "degenerate tetrahedron: {}", reason)
            }
            FmmError::UnsupportedDtype(dtype) => {
                write!(f, "unsupported dtype: {}", dtype)
            }
            FmmError::UnsupportedFileFormat(ext) => {
                write!(f, "unsupported file format: {}", ext)
            }
            FmmError::MatVariableNotFound {
                expected,
                available,
            } => {
                write!(
                    f,
                    "MAT variable '{}' not found; available variables: {:?}",
                    expected, available
                )
            }
            FmmError::IoError(e) => write!(f, "I/O error: {}", e),
            FmmError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for FmmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FmmError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FmmError {
    fn from(e: std::io::Error) -> Self {
        FmmError::IoError(e)
    }
}

/// Convenience type alias for Results with FmmError.
pub type Result<T> = std::result::Result<T, FmmError>;
