// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{FmmError, Result};

/// Marching status of a single grid point.
///
/// Every point starts `Far` (or `Known` when seeded by interface
/// localization), becomes `Trial` when first touched by an update from a
/// known neighbor, and is promoted to `Known`, irreversibly, when extracted
/// as the heap minimum. Known points are never revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PointStatus {
    /// Not yet touched by the front; holds the unreached sentinel.
    Far,
    /// Tentative distance assigned; owned by the trial heap.
    Trial,
    /// Distance finalized; terminal state.
    Known,
}

/// Axis-aligned index range, half-open on each axis: `lo[d] <= i[d] < hi[d]`.
///
/// Used to describe the fillbox (the region where valid output is required)
/// inside the ghostbox (the full allocated extent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBox<const N: usize> {
    /// Inclusive lower corner.
    pub lo: [usize; N],
    /// Exclusive upper corner.
    pub hi: [usize; N],
}

impl<const N: usize> IndexBox<N> {
    /// Create a box from its corners.
    pub fn new(lo: [usize; N], hi: [usize; N]) -> Self {
        IndexBox { lo, hi }
    }

    /// Whether the box contains the given multi-index.
    pub fn contains(&self, idx: [usize; N]) -> bool {
        (0..N).all(|d| idx[d] >= self.lo[d] && idx[d] < self.hi[d])
    }

    /// Number of points in the box.
    pub fn num_points(&self) -> usize {
        (0..N)
            .map(|d| self.hi[d].saturating_sub(self.lo[d]))
            .product()
    }
}

/// Index geometry of a regular N-dimensional grid.
///
/// Stores the grid shape, row-major strides, per-axis spacing, and the
/// fillbox. The generic parameter `N` is the number of spatial dimensions
/// (1, 2, or 3). The ghostbox is the full `[0, shape)` extent; the fillbox
/// defaults to the whole ghostbox and can be shrunk with
/// [`GridGeometry::with_fillbox`].
#[derive(Debug, Clone)]
pub struct GridGeometry<const N: usize> {
    shape: [usize; N],
    strides: [usize; N],
    dx: [f64; N],
    fillbox: IndexBox<N>,
}

impl<const N: usize> GridGeometry<N> {
    /// Create a new grid geometry with the given shape and spacing.
    ///
    /// # Parameters
    /// - `shape`: Number of points along each axis (each must be >= 2)
    /// - `dx`: Grid spacing along each axis (each must be positive and finite)
    ///
    /// # Errors
    /// Returns an error if `N` is not 1, 2, or 3, or if any shape or
    /// spacing entry is invalid.
    pub fn new(shape: [usize; N], dx: [f64; N]) -> Result<Self> {
        if N == 0 || N > 3 {
            return Err(FmmError::InvalidDimension(N));
        }

        for (axis, &size) in shape.iter().enumerate() {
            if size < 2 {
                return Err(FmmError::InvalidGridShape { axis, size });
            }
        }

        for (axis, &h) in dx.iter().enumerate() {
            if !h.is_finite() || h <= 0.0 {
                return Err(FmmError::InvalidGridSpacing { axis, value: h });
            }
        }

        // Row-major strides
        let mut strides = [0usize; N];
        strides[N - 1] = 1;
        for d in (0..N - 1).rev() {
            strides[d] = strides[d + 1] * shape[d + 1];
        }

        Ok(GridGeometry {
            shape,
            strides,
            dx,
            fillbox: IndexBox::new([0; N], shape),
        })
    }

    /// Restrict the fillbox (builder method).
    ///
    /// # Errors
    /// Returns an error if the fillbox is empty or not contained in the
    /// ghostbox.
    pub fn with_fillbox(mut self, fillbox: IndexBox<N>) -> Result<Self> {
        for d in 0..N {
            if fillbox.lo[d] >= fillbox.hi[d] || fillbox.hi[d] > self.shape[d] {
                return Err(FmmError::InvalidFillbox {
                    axis: d,
                    lo: fillbox.lo[d],
                    hi: fillbox.hi[d],
                    size: self.shape[d],
                });
            }
        }
        self.fillbox = fillbox;
        Ok(self)
    }

    /// Grid shape (number of points along each axis).
    pub fn shape(&self) -> [usize; N] {
        self.shape
    }

    /// Per-axis grid spacing.
    pub fn dx(&self) -> [f64; N] {
        self.dx
    }

    /// Total number of points in the ghostbox.
    pub fn num_nodes(&self) -> usize {
        self.shape.iter().product()
    }

    /// The full allocated index range.
    pub fn ghostbox(&self) -> IndexBox<N> {
        IndexBox::new([0; N], self.shape)
    }

    /// The index range where valid output is required.
    pub fn fillbox(&self) -> IndexBox<N> {
        self.fillbox
    }

    /// Whether the multi-index lies in the fillbox.
    pub fn in_fillbox(&self, idx: [usize; N]) -> bool {
        self.fillbox.contains(idx)
    }

    /// Convert a flat index to an N-dimensional index.
    #[allow(clippy::needless_range_loop)]
    pub fn flat_to_nd(&self, flat: usize) -> [usize; N] {
        let mut idx = [0usize; N];
        let mut remainder = flat;
        for d in 0..N {
            idx[d] = remainder / self.strides[d];
            remainder %= self.strides[d];
        }
        idx
    }

    /// Convert an N-dimensional index to a flat index.
    pub fn nd_to_flat(&self, idx: [usize; N]) -> usize {
        let mut flat = 0;
        for d in 0..N {
            flat += idx[d] * self.strides[d];
        }
        flat
    }

    /// Step `offset` points along `axis` from `idx`.
    ///
    /// Returns `None` when the step leaves the ghostbox; callers must treat
    /// this as "no neighbor on that side". The step never wraps.
    pub fn neighbor(&self, idx: [usize; N], axis: usize, offset: isize) -> Option<[usize; N]> {
        let pos = idx[axis] as isize + offset;
        if pos < 0 || pos >= self.shape[axis] as isize {
            return None;
        }
        let mut out = idx;
        out[axis] = pos as usize;
        Some(out)
    }

    /// Visit every multi-index in the fillbox in row-major order.
    pub fn for_each_fillbox_point(&self, mut visit: impl FnMut([usize; N])) {
        let mut idx = self.fillbox.lo;
        loop {
            visit(idx);
            // Row-major increment with per-axis carry
            let mut d = N;
            loop {
                if d == 0 {
                    return;
                }
                d -= 1;
                idx[d] += 1;
                if idx[d] < self.fillbox.hi[d] {
                    break;
                }
                idx[d] = self.fillbox.lo[d];
            }
        }
    }
}
