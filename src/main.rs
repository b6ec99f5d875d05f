// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use levelset_fmm::io;
use levelset_fmm::{
    FmmSolver, GridGeometry, MissingInterfacePolicy, SpatialOrder,
};

#[derive(Parser)]
#[command(
    name = "levelset-fmm",
    about = "Fast Marching Method signed distance solver"
)]
struct Cli {
    /// Dimensionality (1, 2, or 3)
    #[arg(short = 'd', long)]
    dim: usize,

    /// Grid size, comma-separated (e.g., 256,256 or 128,128,128)
    #[arg(short = 's', long)]
    size: String,

    /// Grid spacing: a single value, or one value per axis comma-separated
    #[arg(long, default_value = "1.0")]
    spacing: String,

    /// Level set field: "sphere:<center...>,<radius>" or "file:<path>"
    /// (.npy or .mat; MAT variable "phi")
    #[arg(long)]
    phi: String,

    /// Optional mask file (.npy or .mat; MAT variable "mask").
    /// Points with negative mask values are excluded from the solve
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Spatial derivative order (1 or 2)
    #[arg(long, default_value = "1")]
    order: usize,

    /// Stop marching beyond this distance; farther points stay at infinity
    #[arg(long)]
    cutoff: Option<f64>,

    /// Seed the domain boundary instead of failing when phi has no sign change
    #[arg(long)]
    seed_boundary: bool,

    /// Optional field to extend off the interface (.npy or .mat;
    /// MAT variable "field")
    #[arg(long)]
    extension: Option<PathBuf>,

    /// Output path for the extended field (.npy or .mat)
    #[arg(long, default_value = "extension.npy")]
    extension_output: PathBuf,

    /// Output file path for the signed distance (.npy or .mat)
    #[arg(short = 'o', long, default_value = "distance.npy")]
    output: PathBuf,
}

fn parse_size(s: &str, dim: usize) -> Result<Vec<usize>> {
    let parts: Vec<usize> = s
        .split(',')
        .map(|p| p.trim().parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("invalid --size: expected comma-separated integers")?;
    if parts.len() != dim {
        bail!("--size has {} components but --dim is {}", parts.len(), dim);
    }
    Ok(parts)
}

fn parse_spacing(s: &str, dim: usize) -> Result<Vec<f64>> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("invalid --spacing: expected comma-separated floats")?;
    match parts.len() {
        1 => Ok(vec![parts[0]; dim]),
        n if n == dim => Ok(parts),
        n => bail!("--spacing has {} components but --dim is {}", n, dim),
    }
}

fn build_phi_field<const N: usize>(mode: &str, grid: &GridGeometry<N>) -> Result<Vec<f64>> {
    if let Some(params) = mode.strip_prefix("sphere:") {
        let parts: Vec<f64> = params
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("invalid sphere parameters: expected comma-separated floats")?;
        if parts.len() != N + 1 {
            bail!(
                "sphere mode expects {} center components plus a radius, got {} values",
                N,
                parts.len()
            );
        }
        let radius = parts[N];
        if !radius.is_finite() || radius <= 0.0 {
            bail!("sphere radius must be positive and finite, got {}", radius);
        }

        let dx = grid.dx();
        let mut phi = vec![0.0; grid.num_nodes()];
        for (flat, value) in phi.iter_mut().enumerate() {
            let idx = grid.flat_to_nd(flat);
            let mut r2 = 0.0;
            for axis in 0..N {
                let delta = idx[axis] as f64 * dx[axis] - parts[axis];
                r2 += delta * delta;
            }
            *value = r2.sqrt() - radius;
        }
        return Ok(phi);
    }

    if let Some(path_str) = mode.strip_prefix("file:") {
        let path = Path::new(path_str);
        return io::load_field(path, "phi", &grid.shape()).map_err(|e| anyhow::anyhow!("{}", e));
    }

    bail!(
        "unknown --phi mode: '{}'. Expected 'sphere:<center...>,<radius>' or 'file:<path>'",
        mode
    );
}

fn run<const N: usize>(cli: &Cli, shape: [usize; N], dx: [f64; N]) -> Result<()> {
    let grid = GridGeometry::<N>::new(shape, dx).map_err(|e| anyhow::anyhow!("{}", e))?;
    let phi = build_phi_field(&cli.phi, &grid)?;

    let order = SpatialOrder::try_from(cli.order).map_err(|e| anyhow::anyhow!("{}", e))?;

    let mut solver = FmmSolver::new(grid, phi)
        .map_err(|e| anyhow::anyhow!("{}", e))?
        .with_order(order);

    if let Some(mask_path) = &cli.mask {
        let mask = io::load_field(mask_path, "mask", &solver.grid().shape())
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        solver = solver
            .with_mask(mask)
            .map_err(|e| anyhow::anyhow!("{}", e))?;
    }

    if let Some(cutoff) = cli.cutoff {
        solver = solver
            .with_cutoff(cutoff)
            .map_err(|e| anyhow::anyhow!("{}", e))?;
    }

    if cli.seed_boundary {
        solver = solver.on_missing_interface(MissingInterfacePolicy::SeedBoundary);
    }

    let field = if let Some(ext_path) = &cli.extension {
        let ext_input =
            io::load_field(ext_path, "field", &shape).map_err(|e| anyhow::anyhow!("{}", e))?;
        let (field, extended) = solver
            .march_with_extension(&ext_input)
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        io::save_field(&cli.extension_output, "field", &shape, &extended)
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        field
    } else {
        solver.march().map_err(|e| anyhow::anyhow!("{}", e))?
    };

    let unreached = field.unreached_count();
    if unreached > 0 {
        eprintln!(
            "{} of {} points not reached (masked, disconnected, or beyond cutoff)",
            unreached,
            solver.grid().num_nodes()
        );
    }

    io::save_field(&cli.output, "distance", &shape, field.values())
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !(1..=3).contains(&cli.dim) {
        bail!("--dim must be 1, 2, or 3, got {}", cli.dim);
    }

    let size = parse_size(&cli.size, cli.dim)?;
    let spacing = parse_spacing(&cli.spacing, cli.dim)?;

    match cli.dim {
        1 => run(&cli, [size[0]], [spacing[0]])?,
        2 => run(&cli, [size[0], size[1]], [spacing[0], spacing[1]])?,
        3 => run(
            &cli,
            [size[0], size[1], size[2]],
            [spacing[0], spacing[1], spacing[2]],
        )?,
        _ => unreachable!(),
    }

    Ok(())
}
