// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

/// Upwind data for one axis of the Eikonal update.
///
/// `d1` is the distance magnitude of the smaller known neighbor along the
/// axis; `d2` optionally carries the next point behind it on the same side
/// when it is also known and satisfies `d2 <= d1`, enabling the
/// second-order one-sided difference. Axes with no known neighbor are
/// represented as `None` at the call site.
#[derive(Debug, Clone, Copy)]
pub struct AxisStencil {
    /// Grid spacing along this axis.
    pub h: f64,
    /// Magnitude of the smaller known neighbor distance.
    pub d1: f64,
    /// Magnitude two points upwind, when usable for second order.
    pub d2: Option<f64>,
}

impl AxisStencil {
    /// Quadratic-term coefficients for this axis: the contribution is
    /// `alpha * (d - t)^2`.
    ///
    /// First order: `alpha = 1/h^2`, `t = d1`. Second order uses the
    /// one-sided three-point difference: `alpha = 9/(4 h^2)`,
    /// `t = (4 d1 - d2)/3`.
    fn coefficients(&self) -> (f64, f64) {
        match self.d2 {
            Some(d2) => ((4.0 * self.d1 - d2) / 3.0, 9.0 / (4.0 * self.h * self.h)),
            None => (self.d1, 1.0 / (self.h * self.h)),
        }
    }
}

/// Solve the discretized Eikonal equation |∇d| = 1 for a tentative distance.
///
/// Accumulates `alpha_i (d - t_i)^2 = 1` over every axis with at least one
/// known neighbor and takes the larger root of the resulting quadratic. The
/// root is causal only if it is at least the largest neighbor value used;
/// when the quadratic has no real or causal root, the axis with the largest
/// neighbor distance is dropped and the solve retried, terminating in the
/// single-axis Dijkstra-like update `min(d1) + h`.
///
/// Returns infinity when no axis has a known neighbor.
pub fn solve_eikonal(axes: &[Option<AxisStencil>]) -> f64 {
    debug_assert!(axes.len() <= 3);

    // (t, alpha, d1, h) for each participating axis
    let mut terms = [(0.0f64, 0.0f64, 0.0f64, 0.0f64); 3];
    let mut count = 0;
    for axis in axes.iter().flatten() {
        let (t, alpha) = axis.coefficients();
        terms[count] = (t, alpha, axis.d1, axis.h);
        count += 1;
    }

    if count == 0 {
        return f64::INFINITY;
    }

    terms[..count].sort_by(|x, y| x.2.partial_cmp(&y.2).unwrap_or(std::cmp::Ordering::Equal));

    // Causal-root cascade: all axes first, then drop the largest-valued
    // axis on failure.
    for used in (1..=count).rev() {
        let mut a = 0.0;
        let mut b = 0.0;
        let mut c = -1.0;
        for &(t, alpha, _, _) in &terms[..used] {
            a += alpha;
            b -= 2.0 * alpha * t;
            c += alpha * t * t;
        }
        let disc = b * b - 4.0 * a * c;
        if disc >= 0.0 {
            let d = (-b + disc.sqrt()) / (2.0 * a);
            if d >= terms[used - 1].2 {
                return d;
            }
        }
    }

    // First-order single-axis fallback from the minimal neighbor.
    terms[0].2 + terms[0].3
}
