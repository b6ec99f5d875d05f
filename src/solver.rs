// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{FmmError, Result};
use crate::grid::{GridGeometry, PointStatus};
use crate::heap::TrialHeap;
use crate::interface::{locate_interface, Seed};
use crate::stencil::{solve_eikonal, AxisStencil};

/// Spatial derivative order of the marching stencil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpatialOrder {
    /// First-order upwind differences.
    #[default]
    One,
    /// Second-order one-sided differences where enough marching history
    /// exists, degrading to first order otherwise.
    Two,
}

impl TryFrom<usize> for SpatialOrder {
    type Error = FmmError;

    fn try_from(order: usize) -> Result<Self> {
        match order {
            1 => Ok(SpatialOrder::One),
            2 => Ok(SpatialOrder::Two),
            other => Err(FmmError::InvalidSpatialOrder(other)),
        }
    }
}

/// Policy when the level set function has no sign change in the fillbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingInterfacePolicy {
    /// Fail the solve with [`FmmError::InterfaceNotFound`].
    #[default]
    Fail,
    /// Seed the fillbox boundary at distance zero and measure distance from
    /// the domain boundary instead.
    SeedBoundary,
}

/// Result of a marching run: signed distances plus per-point status.
///
/// The sign of each finalized value matches the sign of the input level set
/// function at that point. Points never finalized — masked out, unreachable
/// through the mask, or beyond the distance cutoff — hold the unreached
/// sentinel (signed infinity) and a non-`Known` status.
#[derive(Debug)]
pub struct DistanceField<const N: usize> {
    grid: GridGeometry<N>,
    values: Vec<f64>,
    status: Vec<PointStatus>,
}

impl<const N: usize> DistanceField<N> {
    /// The grid geometry the field lives on.
    pub fn grid(&self) -> &GridGeometry<N> {
        &self.grid
    }

    /// Signed distance values in row-major order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Per-point marching status in row-major order.
    pub fn status(&self) -> &[PointStatus] {
        &self.status
    }

    /// Signed distance at a multi-index.
    pub fn value_at(&self, idx: [usize; N]) -> f64 {
        self.values[self.grid.nd_to_flat(idx)]
    }

    /// Marching status at a multi-index.
    pub fn status_at(&self, idx: [usize; N]) -> PointStatus {
        self.status[self.grid.nd_to_flat(idx)]
    }

    /// Whether the point was never finalized and holds the sentinel.
    pub fn is_unreached(&self, idx: [usize; N]) -> bool {
        self.status_at(idx) != PointStatus::Known
    }

    /// Number of points that were never finalized.
    pub fn unreached_count(&self) -> usize {
        self.status
            .iter()
            .filter(|&&s| s != PointStatus::Known)
            .count()
    }

    /// Consume the field, returning the signed distance values.
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// A Fast Marching Method solver for the Eikonal equation |∇d| = 1.
///
/// Computes the signed distance function to the zero level set of an
/// implicit field `phi`, optionally extending an auxiliary field off the
/// interface in the same front order.
///
/// The march is strictly serial: correctness depends on totally ordered
/// finalization of grid points (known points are never revisited), so there
/// is no internal parallelism and a solver instance owns all of its mutable
/// state for the duration of one run. Repeat runs on identical inputs
/// produce bit-identical output.
#[derive(Debug)]
pub struct FmmSolver<const N: usize> {
    grid: GridGeometry<N>,
    phi: Vec<f64>,
    mask: Option<Vec<f64>>,
    order: SpatialOrder,
    cutoff: Option<f64>,
    missing_interface: MissingInterfacePolicy,
}

impl<const N: usize> FmmSolver<N> {
    /// Create a new solver for the given grid and level set function.
    ///
    /// # Errors
    /// Returns an error if the length of `phi` does not match the grid.
    pub fn new(grid: GridGeometry<N>, phi: Vec<f64>) -> Result<Self> {
        if phi.len() != grid.num_nodes() {
            return Err(FmmError::ShapeMismatch {
                expected: grid.shape().to_vec(),
                got: vec![phi.len()],
            });
        }
        Ok(FmmSolver {
            grid,
            phi,
            mask: None,
            order: SpatialOrder::default(),
            cutoff: None,
            missing_interface: MissingInterfacePolicy::default(),
        })
    }

    /// Exclude grid points via a mask (builder method). Points with a
    /// negative mask value do not participate: they are never finalized and
    /// never contribute to a neighbor's update.
    ///
    /// # Errors
    /// Returns an error if the mask length does not match the grid.
    pub fn with_mask(mut self, mask: Vec<f64>) -> Result<Self> {
        if mask.len() != self.grid.num_nodes() {
            return Err(FmmError::ShapeMismatch {
                expected: self.grid.shape().to_vec(),
                got: vec![mask.len()],
            });
        }
        self.mask = Some(mask);
        Ok(self)
    }

    /// Set the spatial derivative order (builder method). Default is first
    /// order.
    pub fn with_order(mut self, order: SpatialOrder) -> Self {
        self.order = order;
        self
    }

    /// Stop marching once the extracted minimum distance exceeds `cutoff`
    /// (builder method). Points beyond the cutoff keep the unreached
    /// sentinel; this is the narrow-band variant, not an error path.
    ///
    /// # Errors
    /// Returns an error if the cutoff is not positive and finite.
    pub fn with_cutoff(mut self, cutoff: f64) -> Result<Self> {
        if !cutoff.is_finite() || cutoff <= 0.0 {
            return Err(FmmError::InvalidCutoff(cutoff));
        }
        self.cutoff = Some(cutoff);
        Ok(self)
    }

    /// Set the policy for fields with no sign change (builder method).
    /// Default is to fail the solve.
    pub fn on_missing_interface(mut self, policy: MissingInterfacePolicy) -> Self {
        self.missing_interface = policy;
        self
    }

    /// Get a reference to the grid.
    pub fn grid(&self) -> &GridGeometry<N> {
        &self.grid
    }

    /// Compute the signed distance function.
    ///
    /// # Errors
    /// Returns an error if no interface is found and the policy is
    /// [`MissingInterfacePolicy::Fail`].
    pub fn march(&self) -> Result<DistanceField<N>> {
        let mut marcher = Marcher::new(self, None);
        marcher.run()?;
        Ok(marcher.into_distance_field(&self.grid))
    }

    /// Compute the signed distance function and extend `field` off the
    /// interface along the front, producing a field constant in the
    /// direction normal to the interface.
    ///
    /// # Errors
    /// Returns an error if the field length does not match the grid, or if
    /// no interface is found and the policy is
    /// [`MissingInterfacePolicy::Fail`].
    pub fn march_with_extension(&self, field: &[f64]) -> Result<(DistanceField<N>, Vec<f64>)> {
        if field.len() != self.grid.num_nodes() {
            return Err(FmmError::ShapeMismatch {
                expected: self.grid.shape().to_vec(),
                got: vec![field.len()],
            });
        }
        let mut marcher = Marcher::new(self, Some(field));
        marcher.run()?;
        let extension = marcher.extension.take().expect("extension state present");
        Ok((marcher.into_distance_field(&self.grid), extension))
    }

    fn included(&self, flat: usize) -> bool {
        self.mask.as_ref().map_or(true, |m| m[flat] >= 0.0)
    }
}

/// Mutable state of one marching run. All per-point arrays are owned here
/// and dropped or moved into the result when the run ends.
struct Marcher<'a, const N: usize> {
    solver: &'a FmmSolver<N>,
    status: Vec<PointStatus>,
    /// Distance magnitudes; infinity marks unreached points.
    dist: Vec<f64>,
    heap: TrialHeap,
    extension: Option<Vec<f64>>,
}

impl<'a, const N: usize> Marcher<'a, N> {
    fn new(solver: &'a FmmSolver<N>, ext_input: Option<&[f64]>) -> Self {
        let num_nodes = solver.grid.num_nodes();
        Marcher {
            solver,
            status: vec![PointStatus::Far; num_nodes],
            dist: vec![f64::INFINITY; num_nodes],
            heap: TrialHeap::new(num_nodes),
            extension: ext_input.map(<[f64]>::to_vec),
        }
    }

    fn run(&mut self) -> Result<()> {
        let solver = self.solver;
        let grid = &solver.grid;

        let mut seeds = locate_interface(grid, &solver.phi, solver.mask.as_deref());
        if seeds.is_empty() {
            match solver.missing_interface {
                MissingInterfacePolicy::Fail => return Err(FmmError::InterfaceNotFound),
                MissingInterfacePolicy::SeedBoundary => seeds = self.boundary_seeds(),
            }
        }

        for seed in &seeds {
            self.status[seed.node] = PointStatus::Known;
            self.dist[seed.node] = seed.distance;
        }
        for seed in &seeds {
            self.update_neighbors(seed.node);
        }

        while let Some((node, key)) = self.heap.pop_min() {
            if let Some(cutoff) = solver.cutoff {
                if key > cutoff {
                    break;
                }
            }
            self.status[node] = PointStatus::Known;
            self.dist[node] = key;
            if self.extension.is_some() {
                self.extend_value(node, key);
            }
            self.update_neighbors(node);
        }

        Ok(())
    }

    /// Seed the boundary faces of the fillbox at distance zero.
    fn boundary_seeds(&self) -> Vec<Seed> {
        let grid = &self.solver.grid;
        let fillbox = grid.fillbox();
        let mut seeds = Vec::new();
        grid.for_each_fillbox_point(|idx| {
            let on_face = (0..N).any(|d| idx[d] == fillbox.lo[d] || idx[d] + 1 == fillbox.hi[d]);
            if !on_face {
                return;
            }
            let flat = grid.nd_to_flat(idx);
            if self.solver.included(flat) {
                seeds.push(Seed {
                    node: flat,
                    distance: 0.0,
                });
            }
        });
        seeds
    }

    /// Recompute tentative distances for the far/trial neighbors of a
    /// freshly finalized point.
    fn update_neighbors(&mut self, node: usize) {
        let grid = &self.solver.grid;
        let idx = grid.flat_to_nd(node);
        for axis in 0..N {
            for offset in [-1isize, 1] {
                let Some(nb) = grid.neighbor(idx, axis, offset) else {
                    continue;
                };
                if !grid.in_fillbox(nb) {
                    continue;
                }
                let nb_flat = grid.nd_to_flat(nb);
                if !self.solver.included(nb_flat) {
                    continue;
                }
                match self.status[nb_flat] {
                    PointStatus::Known => {}
                    PointStatus::Far => {
                        let tentative = self.tentative_distance(nb);
                        if tentative.is_finite() {
                            self.status[nb_flat] = PointStatus::Trial;
                            self.heap.insert(nb_flat, tentative);
                        }
                    }
                    PointStatus::Trial => {
                        let tentative = self.tentative_distance(nb);
                        self.heap.decrease_key(nb_flat, tentative);
                    }
                }
            }
        }
    }

    /// Solve the update stencil at `idx` from its currently known neighbors.
    fn tentative_distance(&self, idx: [usize; N]) -> f64 {
        let grid = &self.solver.grid;
        let dx = grid.dx();
        let mut axes: [Option<AxisStencil>; N] = [None; N];

        for axis in 0..N {
            let mut best: Option<(f64, isize)> = None;
            for offset in [-1isize, 1] {
                if let Some(d1) = self.known_distance(idx, axis, offset) {
                    if best.map_or(true, |(b, _)| d1 < b) {
                        best = Some((d1, offset));
                    }
                }
            }
            let Some((d1, offset)) = best else {
                continue;
            };

            // Second-order history: the next point on the same side must be
            // known and not larger, or the axis degrades to first order.
            let d2 = match self.solver.order {
                SpatialOrder::One => None,
                SpatialOrder::Two => self
                    .known_distance(idx, axis, 2 * offset)
                    .filter(|&d2| d2 <= d1),
            };

            axes[axis] = Some(AxisStencil {
                h: dx[axis],
                d1,
                d2,
            });
        }

        solve_eikonal(&axes)
    }

    /// Distance magnitude of the point `offset` steps along `axis`, if that
    /// point exists, participates, and is known.
    fn known_distance(&self, idx: [usize; N], axis: usize, offset: isize) -> Option<f64> {
        let nb = self.solver.grid.neighbor(idx, axis, offset)?;
        let flat = self.solver.grid.nd_to_flat(nb);
        if self.solver.included(flat) && self.status[flat] == PointStatus::Known {
            Some(self.dist[flat])
        } else {
            None
        }
    }

    /// Assign the extension value at a freshly finalized point as the
    /// upwind-weighted average of its known neighbors' values, weighted by
    /// how strongly each axis drives the local front.
    fn extend_value(&mut self, node: usize, d: f64) {
        let grid = &self.solver.grid;
        let dx = grid.dx();
        let idx = grid.flat_to_nd(node);

        let mut weighted = 0.0;
        let mut weight_sum = 0.0;
        let mut nearest: Option<(f64, usize)> = None;

        for axis in 0..N {
            let mut best: Option<(f64, usize)> = None;
            for offset in [-1isize, 1] {
                if let Some(nb) = grid.neighbor(idx, axis, offset) {
                    let flat = grid.nd_to_flat(nb);
                    if self.solver.included(flat) && self.status[flat] == PointStatus::Known {
                        let d1 = self.dist[flat];
                        if best.map_or(true, |(b, _)| d1 < b) {
                            best = Some((d1, flat));
                        }
                    }
                }
            }
            let Some((d1, flat)) = best else {
                continue;
            };
            if nearest.map_or(true, |(b, _)| d1 < b) {
                nearest = Some((d1, flat));
            }
            if d1 < d {
                let w = (d - d1) / (dx[axis] * dx[axis]);
                let ext = self.extension.as_ref().expect("extension state present");
                weighted += w * ext[flat];
                weight_sum += w;
            }
        }

        let ext = self.extension.as_mut().expect("extension state present");
        if weight_sum > 0.0 {
            ext[node] = weighted / weight_sum;
        } else if let Some((_, flat)) = nearest {
            // Degenerate tie with the upwind neighbor: carry its value.
            ext[node] = ext[flat];
        }
    }

    fn into_distance_field(self, grid: &GridGeometry<N>) -> DistanceField<N> {
        let phi = &self.solver.phi;
        let values = self
            .dist
            .iter()
            .zip(phi.iter())
            .map(|(&mag, &p)| if p < 0.0 { -mag } else { mag })
            .collect();
        DistanceField {
            grid: grid.clone(),
            values,
            status: self.status,
        }
    }
}
