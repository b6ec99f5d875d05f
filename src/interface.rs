// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{FmmError, Result};
use crate::grid::GridGeometry;

/// A grid point seeded by interface localization: flat index plus the
/// sub-cell distance magnitude to the zero level set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seed {
    /// Flat index of the seeded point.
    pub node: usize,
    /// Unsigned distance estimate to the interface.
    pub distance: f64,
}

/// Locate grid points adjacent to the zero level set of `phi` and compute
/// sub-cell-accurate initial distance estimates for them.
///
/// A fillbox point is seeded when `phi` is exactly zero there, or when
/// `phi` changes sign between the point and an axis neighbor. The crossing
/// position along each axis comes from linear interpolation of `phi`; the
/// per-axis crossing distances `delta_i` are combined into the distance to
/// the locally planar interface, `1/sqrt(sum 1/delta_i^2)`, which is more
/// accurate than defaulting to one grid spacing.
///
/// Masked-out points are never seeded and never contribute a crossing.
/// Returns an empty vector when `phi` has no sign change anywhere, which
/// means the whole field lies on one side of the interface; the caller
/// decides whether that is an error.
pub fn locate_interface<const N: usize>(
    grid: &GridGeometry<N>,
    phi: &[f64],
    mask: Option<&[f64]>,
) -> Vec<Seed> {
    let dx = grid.dx();
    let included = |flat: usize| mask.map_or(true, |m| m[flat] >= 0.0);

    let mut seeds = Vec::new();
    grid.for_each_fillbox_point(|idx| {
        let flat = grid.nd_to_flat(idx);
        if !included(flat) {
            return;
        }
        let p = phi[flat];
        if p == 0.0 {
            seeds.push(Seed {
                node: flat,
                distance: 0.0,
            });
            return;
        }

        // Inverse-square accumulation of per-axis crossing distances
        let mut inv_sq_sum = 0.0;
        for axis in 0..N {
            let mut delta = f64::INFINITY;
            for offset in [-1isize, 1] {
                let Some(nb) = grid.neighbor(idx, axis, offset) else {
                    continue;
                };
                let nb_flat = grid.nd_to_flat(nb);
                if !included(nb_flat) {
                    continue;
                }
                let q = phi[nb_flat];
                if p * q < 0.0 {
                    let crossing = dx[axis] * p.abs() / (p.abs() + q.abs());
                    if crossing < delta {
                        delta = crossing;
                    }
                }
            }
            if delta.is_finite() {
                inv_sq_sum += 1.0 / (delta * delta);
            }
        }

        if inv_sq_sum > 0.0 {
            seeds.push(Seed {
                node: flat,
                distance: 1.0 / inv_sq_sum.sqrt(),
            });
        }
    });
    seeds
}

/// Intersection of the line {phi = 0, psi = 0} with a tetrahedron.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TetLine {
    /// The line misses the tetrahedron.
    None,
    /// The line grazes the tetrahedron at a single point (e.g., through an
    /// edge or corner).
    Touch([f64; 3]),
    /// The contained line segment; when the segment is non-degenerate,
    /// `endpoints[1] - endpoints[0]` points along grad(phi) x grad(psi).
    Segment([f64; 3], [f64; 3]),
}

fn det3(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> f64 {
    a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
        + a[2] * (b[0] * c[1] - b[1] * c[0])
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Solve the 3x3 system M x = rhs by Cramer's rule; `None` when the
/// determinant vanishes relative to the row magnitudes.
fn solve3(rows: [[f64; 3]; 3], rhs: [f64; 3]) -> Option<[f64; 3]> {
    let det = det3(rows[0], rows[1], rows[2]);
    let scale = rows
        .iter()
        .map(|r| r.iter().fold(0.0f64, |m, v| m.max(v.abs())))
        .fold(1.0, |acc, m| acc * m.max(1e-30));
    if det.abs() <= 16.0 * f64::EPSILON * scale {
        return None;
    }
    let col = |k: usize| -> f64 {
        let mut m = rows;
        for (row, &r) in m.iter_mut().zip(rhs.iter()) {
            row[k] = r;
        }
        det3(m[0], m[1], m[2]) / det
    };
    Some([col(0), col(1), col(2)])
}

/// Gradient of the linear interpolant of `values` over the tetrahedron.
fn linear_gradient(corners: &[[f64; 3]; 4], values: &[f64; 4]) -> Option<[f64; 3]> {
    let rows = [
        sub(corners[1], corners[0]),
        sub(corners[2], corners[0]),
        sub(corners[3], corners[0]),
    ];
    let rhs = [
        values[1] - values[0],
        values[2] - values[0],
        values[3] - values[0],
    ];
    solve3(rows, rhs)
}

/// Determine where the line {phi = 0, psi = 0} intersects the faces of a
/// tetrahedron.
///
/// `phi` and `psi` hold the corner values, in corner order, and are
/// interpolated linearly over each triangular face. Each face is solved for
/// the barycentric point where both interpolants vanish; points inside the
/// face are collected and deduplicated across faces.
///
/// A face lying exactly in the {phi = 0} or {psi = 0} plane carries a whole
/// line of candidates rather than a single point; such faces are skipped so
/// that only the remaining well-defined intersections are reported, never
/// fabricated ones.
///
/// # Errors
/// Degenerate input is rejected: coincident/coplanar corners (zero volume)
/// or all four corner values of `phi` (or `psi`) identical.
pub fn find_line_in_tetrahedron(
    corners: &[[f64; 3]; 4],
    phi: &[f64; 4],
    psi: &[f64; 4],
) -> Result<TetLine> {
    let e1 = sub(corners[1], corners[0]);
    let e2 = sub(corners[2], corners[0]);
    let e3 = sub(corners[3], corners[0]);
    let volume = det3(e1, e2, e3).abs() / 6.0;
    let diameter = [e1, e2, e3]
        .iter()
        .map(|e| dot(*e, *e).sqrt())
        .fold(0.0f64, f64::max);
    if !(volume > 1e-14 * diameter * diameter * diameter) {
        return Err(FmmError::DegenerateTetrahedron(
            "coincident or coplanar corners".to_string(),
        ));
    }
    if phi.iter().all(|&v| v == phi[0]) {
        return Err(FmmError::DegenerateTetrahedron(
            "phi identical at all corners".to_string(),
        ));
    }
    if psi.iter().all(|&v| v == psi[0]) {
        return Err(FmmError::DegenerateTetrahedron(
            "psi identical at all corners".to_string(),
        ));
    }

    const FACES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    const BARY_EPS: f64 = 1e-12;

    let mut found: Vec<[f64; 3]> = Vec::new();
    let dedupe_tol = 1e-9 * diameter;

    for face in FACES {
        let f = [phi[face[0]], phi[face[1]], phi[face[2]]];
        let g = [psi[face[0]], psi[face[1]], psi[face[2]]];

        // A face embedded in a zero plane has no unique intersection point.
        if f == [0.0; 3] || g == [0.0; 3] {
            continue;
        }

        let Some(bary) = solve3([f, g, [1.0, 1.0, 1.0]], [0.0, 0.0, 1.0]) else {
            continue;
        };
        if bary.iter().any(|&c| c < -BARY_EPS || c > 1.0 + BARY_EPS) {
            continue;
        }

        let mut point = [0.0f64; 3];
        for (c, corner) in bary.iter().zip(face.iter().map(|&i| corners[i])) {
            for d in 0..3 {
                point[d] += c * corner[d];
            }
        }

        let duplicate = found.iter().any(|p| {
            let diff = sub(*p, point);
            dot(diff, diff).sqrt() <= dedupe_tol
        });
        if !duplicate {
            found.push(point);
        }
    }

    match found.len() {
        0 => Ok(TetLine::None),
        1 => Ok(TetLine::Touch(found[0])),
        _ => {
            let (mut a, mut b) = (found[0], found[1]);
            // Orient the segment along grad(phi) x grad(psi)
            if let (Some(gp), Some(gq)) = (
                linear_gradient(corners, phi),
                linear_gradient(corners, psi),
            ) {
                if dot(sub(b, a), cross(gp, gq)) < 0.0 {
                    std::mem::swap(&mut a, &mut b);
                }
            }
            Ok(TetLine::Segment(a, b))
        }
    }
}
