// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! A Fast Marching Method (FMM) signed distance solver for level set fields.
//!
//! This library reinitializes an implicit level set function φ on 1D, 2D, and
//! 3D Cartesian grids: it locates the zero level set of φ, then solves the
//! Eikonal equation |∇d| = 1 outward from that interface to produce the
//! signed distance function d with the same zero level set and sign as φ.
//! It can also extend an auxiliary field off the interface in the same front
//! order, and provides a geometric helper that intersects two implicit
//! surfaces inside a tetrahedron.

#![warn(missing_docs)]

/// Error types for the library.
pub mod error;
/// Grid geometry, index boxes, and point status.
pub mod grid;
/// Indexed binary min-heap for the trial front.
pub mod heap;
/// Interface localization and tetrahedron line intersection.
pub mod interface;
/// File I/O for loading level set fields and saving distance fields.
pub mod io;
/// The serial marching driver.
pub mod solver;
/// Per-point Eikonal update stencil.
pub mod stencil;

pub use crate::error::{FmmError, Result};
pub use crate::grid::{GridGeometry, IndexBox, PointStatus};
pub use crate::interface::{find_line_in_tetrahedron, TetLine};
pub use crate::solver::{
    DistanceField, FmmSolver, MissingInterfacePolicy, SpatialOrder,
};

/// Compute the signed distance function to the zero level set of `phi`.
///
/// One-call wrapper around [`FmmSolver`] for a grid of the given shape and
/// spacing: points with a negative `mask` value are excluded, `order`
/// selects the stencil accuracy, and every grid point is marched (no
/// cutoff).
///
/// # Errors
/// Returns an error on invalid grid parameters, shape mismatches, or when
/// `phi` has no sign change.
pub fn compute_distance_function<const N: usize>(
    phi: Vec<f64>,
    mask: Option<Vec<f64>>,
    order: SpatialOrder,
    shape: [usize; N],
    dx: [f64; N],
) -> Result<DistanceField<N>> {
    let grid = GridGeometry::new(shape, dx)?;
    let mut solver = FmmSolver::new(grid, phi)?.with_order(order);
    if let Some(mask) = mask {
        solver = solver.with_mask(mask)?;
    }
    solver.march()
}

/// Compute the signed distance function and extend `field` off the zero
/// level set of `phi` along the marching front.
///
/// # Errors
/// Returns an error on invalid grid parameters, shape mismatches, or when
/// `phi` has no sign change.
pub fn compute_extension_field<const N: usize>(
    phi: Vec<f64>,
    field: &[f64],
    mask: Option<Vec<f64>>,
    order: SpatialOrder,
    shape: [usize; N],
    dx: [f64; N],
) -> Result<(DistanceField<N>, Vec<f64>)> {
    let grid = GridGeometry::new(shape, dx)?;
    let mut solver = FmmSolver::new(grid, phi)?.with_order(order);
    if let Some(mask) = mask {
        solver = solver.with_mask(mask)?;
    }
    solver.march_with_extension(field)
}
