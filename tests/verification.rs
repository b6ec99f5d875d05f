// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! Verification tests against analytic signed distance fields.
//!
//! These tests check convergence under grid refinement rather than exact
//! agreement: the marching stencil is first or second order accurate, so the
//! error against the analytic solution must shrink as the grid is refined.

use levelset_fmm::{
    compute_distance_function, compute_extension_field, find_line_in_tetrahedron, FmmSolver,
    GridGeometry, IndexBox, MissingInterfacePolicy, PointStatus, SpatialOrder, TetLine,
};

/// Signed distance to a circle of radius `r` centered at `c`, sampled on an
/// n-by-n grid spanning [0, extent] per axis.
fn circle_phi(n: usize, extent: f64, c: [f64; 2], r: f64) -> (GridGeometry<2>, Vec<f64>) {
    let h = extent / (n - 1) as f64;
    let grid = GridGeometry::<2>::new([n, n], [h, h]).unwrap();
    let mut phi = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            let x = i as f64 * h - c[0];
            let y = j as f64 * h - c[1];
            phi[i * n + j] = (x * x + y * y).sqrt() - r;
        }
    }
    (grid, phi)
}

fn sphere_phi(n: usize, extent: f64, c: [f64; 3], r: f64) -> (GridGeometry<3>, Vec<f64>) {
    let h = extent / (n - 1) as f64;
    let grid = GridGeometry::<3>::new([n, n, n], [h, h, h]).unwrap();
    let mut phi = vec![0.0; n * n * n];
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let x = i as f64 * h - c[0];
                let y = j as f64 * h - c[1];
                let z = k as f64 * h - c[2];
                phi[i * n * n + j * n + k] = (x * x + y * y + z * z).sqrt() - r;
            }
        }
    }
    (grid, phi)
}

fn max_error(values: &[f64], exact: &[f64]) -> f64 {
    values
        .iter()
        .zip(exact.iter())
        .map(|(v, e)| (v - e).abs())
        .fold(0.0, f64::max)
}

#[test]
fn circle_distance_converges_2d() {
    let run = |n: usize| {
        let (grid, phi) = circle_phi(n, 4.0, [2.0, 2.0], 1.2);
        let field = FmmSolver::new(grid, phi.clone()).unwrap().march().unwrap();
        // phi already is the signed distance, so it doubles as the reference
        max_error(field.values(), &phi)
    };

    let err_coarse = run(41);
    let err_fine = run(81);

    assert!(err_coarse < 0.25, "coarse error too large: {}", err_coarse);
    assert!(
        err_coarse / err_fine > 1.3,
        "no convergence under refinement: {} -> {}",
        err_coarse,
        err_fine
    );
}

#[test]
fn sphere_distance_converges_3d() {
    let run = |n: usize| {
        let (grid, phi) = sphere_phi(n, 4.0, [2.0, 2.0, 2.0], 1.2);
        let field = FmmSolver::new(grid, phi.clone()).unwrap().march().unwrap();
        max_error(field.values(), &phi)
    };

    let err_coarse = run(21);
    let err_fine = run(41);

    assert!(err_coarse < 0.5, "coarse error too large: {}", err_coarse);
    assert!(
        err_coarse / err_fine > 1.3,
        "no convergence under refinement: {} -> {}",
        err_coarse,
        err_fine
    );
}

#[test]
fn second_order_beats_first_order() {
    let (grid, phi) = circle_phi(81, 4.0, [2.0, 2.0], 1.2);

    let first = FmmSolver::new(grid.clone(), phi.clone())
        .unwrap()
        .march()
        .unwrap();
    let second = FmmSolver::new(grid, phi.clone())
        .unwrap()
        .with_order(SpatialOrder::Two)
        .march()
        .unwrap();

    let err_first = max_error(first.values(), &phi);
    let err_second = max_error(second.values(), &phi);

    assert!(
        err_second < err_first,
        "second order not more accurate: {} vs {}",
        err_second,
        err_first
    );
}

#[test]
fn sign_and_interface_preserved() {
    let (grid, phi) = circle_phi(41, 4.0, [2.0, 2.0], 1.2);
    let h = grid.dx()[0];
    let field = FmmSolver::new(grid, phi.clone()).unwrap().march().unwrap();

    for (v, p) in field.values().iter().zip(phi.iter()) {
        // No sign flips anywhere
        assert!(v.signum() == p.signum() || *p == 0.0);
        // Points straddling the interface end up within one spacing of it
        if p.abs() < h / 2.0 {
            assert!(v.abs() <= h, "interface drifted: d = {} at phi = {}", v, p);
        }
    }
}

#[test]
fn mask_forces_a_detour() {
    // Interface near the left edge, a wall at i = 10 with a slit at the top.
    let n = 21;
    let grid = GridGeometry::<2>::new([n, n], [1.0, 1.0]).unwrap();
    let phi: Vec<f64> = (0..n * n).map(|f| (f / n) as f64 - 1.5).collect();

    let mut mask = vec![1.0; n * n];
    for j in 0..18 {
        mask[10 * n + j] = -1.0;
    }

    let open = FmmSolver::new(grid.clone(), phi.clone())
        .unwrap()
        .march()
        .unwrap();
    let walled = FmmSolver::new(grid, phi)
        .unwrap()
        .with_mask(mask)
        .unwrap()
        .march()
        .unwrap();

    // Behind the wall the front must route through the slit
    let direct = open.value_at([20, 0]);
    let detour = walled.value_at([20, 0]);
    assert!((direct - 18.5).abs() < 0.5);
    assert!(
        detour > direct + 10.0,
        "wall not respected: direct {} vs detour {}",
        direct,
        detour
    );

    // Masked points never get a distance
    assert!(walled.is_unreached([10, 0]));
    assert!(walled.value_at([10, 0]).is_infinite());
}

#[test]
fn cutoff_matches_full_solve_inside_the_band() {
    let (grid, phi) = circle_phi(41, 4.0, [2.0, 2.0], 1.2);
    let cutoff = 0.5;

    let full = FmmSolver::new(grid.clone(), phi.clone())
        .unwrap()
        .march()
        .unwrap();
    let banded = FmmSolver::new(grid, phi)
        .unwrap()
        .with_cutoff(cutoff)
        .unwrap()
        .march()
        .unwrap();

    let mut finalized = 0usize;
    for (i, status) in banded.status().iter().enumerate() {
        match status {
            PointStatus::Known => {
                // The march order is identical until the cutoff fires, so
                // values inside the band are bit-identical to the full solve.
                assert_eq!(banded.values()[i].to_bits(), full.values()[i].to_bits());
                finalized += 1;
            }
            _ => {
                assert!(banded.values()[i].is_infinite());
                assert!(full.values()[i].abs() > cutoff - 1e-12);
            }
        }
    }
    assert!(finalized > 0);
    assert!(banded.unreached_count() > 0);
}

#[test]
fn extension_field_constant_along_normals() {
    // Extend the x coordinate off a circle. Along the +x axis the nearest
    // interface point is (3.0, 2.0), so the extended value there stays near 3.
    let (grid, phi) = circle_phi(41, 4.0, [2.0, 2.0], 1.0);
    let n = 41;
    let h = grid.dx()[0];
    let field_in: Vec<f64> = (0..n * n).map(|f| (f / n) as f64 * h).collect();

    let (_, ext) = FmmSolver::new(grid, phi)
        .unwrap()
        .march_with_extension(&field_in)
        .unwrap();

    let at = |i: usize, j: usize| ext[i * n + j];
    assert!((at(38, 20) - 3.0).abs() < 0.3, "got {}", at(38, 20));
    assert!((at(2, 20) - 1.0).abs() < 0.3, "got {}", at(2, 20));
}

#[test]
fn restricted_fillbox_leaves_ghost_points_untouched() {
    // One layer of ghost points on each side; phi = x - 2.25 with h = 1
    let grid = GridGeometry::<1>::new([7], [1.0])
        .unwrap()
        .with_fillbox(IndexBox::new([1], [6]))
        .unwrap();
    let phi: Vec<f64> = (0..7).map(|i| i as f64 - 2.25).collect();
    let field = FmmSolver::new(grid, phi.clone()).unwrap().march().unwrap();

    // Every fillbox point is finalized with the exact distance
    for i in 1..6 {
        assert_eq!(field.status_at([i]), PointStatus::Known);
        assert!(
            (field.value_at([i]) - phi[i]).abs() < 1e-12,
            "node {}: {} vs {}",
            i,
            field.value_at([i]),
            phi[i]
        );
    }
    // Ghost points are never seeded or marched and keep the signed sentinel
    assert!(field.is_unreached([0]));
    assert!(field.is_unreached([6]));
    assert_eq!(field.value_at([0]), f64::NEG_INFINITY);
    assert_eq!(field.value_at([6]), f64::INFINITY);
    assert_eq!(field.unreached_count(), 2);
}

#[test]
fn one_call_wrappers_match_solver() {
    let n = 21;
    let h = 4.0 / (n - 1) as f64;
    let (_, phi) = circle_phi(n, 4.0, [2.0, 2.0], 1.2);

    let field =
        compute_distance_function(phi.clone(), None, SpatialOrder::One, [n, n], [h, h]).unwrap();
    assert!(max_error(field.values(), &phi) < 0.25);
    assert_eq!(field.unreached_count(), 0);

    // A constant field extends to exactly the same constant everywhere
    let ext_in = vec![1.0; n * n];
    let (ext_field, ext) =
        compute_extension_field(phi, &ext_in, None, SpatialOrder::One, [n, n], [h, h]).unwrap();
    assert!(ext.iter().all(|&v| v == 1.0));
    for (a, b) in ext_field.values().iter().zip(field.values().iter()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn boundary_seeding_without_an_interface() {
    let n = 21;
    let grid = GridGeometry::<2>::new([n, n], [1.0, 1.0]).unwrap();
    let phi = vec![1.0; n * n];

    let field = FmmSolver::new(grid, phi)
        .unwrap()
        .on_missing_interface(MissingInterfacePolicy::SeedBoundary)
        .march()
        .unwrap();

    assert_eq!(field.value_at([0, 7]), 0.0);
    assert_eq!(field.value_at([20, 20]), 0.0);
    // Center is 10 spacings from the nearest boundary face
    assert!((field.value_at([10, 10]) - 10.0).abs() < 1.0);
    assert_eq!(field.unreached_count(), 0);
}

#[test]
fn tetrahedron_line_crosses_two_faces() {
    let corners = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ];
    // {x = 0.25} meets {y = 0.25} along a z-directed segment inside the tet
    let phi = [-0.25, 0.75, -0.25, -0.25];
    let psi = [-0.25, -0.25, 0.75, -0.25];

    match find_line_in_tetrahedron(&corners, &phi, &psi).unwrap() {
        TetLine::Segment(a, b) => {
            for p in [a, b] {
                assert!((p[0] - 0.25).abs() < 1e-12);
                assert!((p[1] - 0.25).abs() < 1e-12);
            }
            // Oriented along grad(phi) x grad(psi) = +z
            assert!(b[2] > a[2]);
        }
        other => panic!("expected a segment, got {:?}", other),
    }
}
