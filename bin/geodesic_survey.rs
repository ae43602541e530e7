//! Geodesic survey
//!
//! Samples random rotation pairs in SO(n), computes their geodesic distance
//! with both logarithm strategies and reports how far the two disagree, along
//! with the orthogonality error of geodesic midpoints.
//!
//! # Usage
//! ```bash
//! cargo run --release --bin geodesic_survey -- --dim 5 --samples 200
//!
//! # Larger rotations, Schur path only:
//! cargo run --release --bin geodesic_survey -- --dim 10 --scale 0.8 --method schur
//! ```

use std::error::Error;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use so_geodesic::linalg::Matrix;
use so_geodesic::manifold::so_n;
use so_geodesic::{Geodesic, LogMethod, init_logger};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MethodArg {
    /// Inverse scaling and squaring
    ScalingSquaring,
    /// Real Schur decomposition
    Schur,
    /// Run both and compare
    Both,
}

#[derive(Parser)]
#[command(name = "geodesic_survey")]
#[command(about = "Cross-check matrix logarithms and geodesics on SO(n)")]
struct Args {
    /// Dimension n of the rotation group
    #[arg(short, long, default_value = "4")]
    dim: usize,

    /// Number of random rotation pairs
    #[arg(short, long, default_value = "100")]
    samples: usize,

    /// Magnitude of the random generator entries
    #[arg(long, default_value = "0.3")]
    scale: f64,

    /// Seed for the random generator
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Logarithm strategy
    #[arg(short, long, value_enum, default_value = "both")]
    method: MethodArg,
}

#[derive(Default)]
struct SurveyStats {
    max_distance: f64,
    mean_distance: f64,
    max_disagreement: f64,
    max_midpoint_orthogonality: f64,
    failures: usize,
}

fn methods(arg: MethodArg) -> Vec<LogMethod> {
    match arg {
        MethodArg::ScalingSquaring => vec![LogMethod::ScalingSquaring],
        MethodArg::Schur => vec![LogMethod::Schur],
        MethodArg::Both => vec![LogMethod::ScalingSquaring, LogMethod::Schur],
    }
}

fn survey_pair(
    geodesics: &[Geodesic],
    a: &Matrix,
    b: &Matrix,
    stats: &mut SurveyStats,
) -> Result<f64, Box<dyn Error>> {
    let mut distances = Vec::with_capacity(geodesics.len());
    for geodesic in geodesics {
        distances.push(geodesic.distance(a, b)?);
        let mid = geodesic.interpolate(a, b, 0.5)?;
        stats.max_midpoint_orthogonality = stats
            .max_midpoint_orthogonality
            .max(so_n::orthogonality_error(&mid));
    }
    if let [first, second] = distances[..] {
        stats.max_disagreement = stats.max_disagreement.max((first - second).abs());
    }
    Ok(distances[0])
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logger();
    let args = Args::parse();

    if args.dim < 2 {
        return Err(format!("dimension must be at least 2, got {}", args.dim).into());
    }

    let geodesics: Vec<Geodesic> = methods(args.method)
        .into_iter()
        .map(|method| Geodesic::new().with_method(method))
        .collect();

    info!(
        "Surveying SO({}) with {} samples, scale {}, seed {}, methods {:?}",
        args.dim, args.samples, args.scale, args.seed, args.method
    );

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut stats = SurveyStats::default();
    let start = Instant::now();
    let mut succeeded = 0usize;

    for sample in 0..args.samples {
        let a = so_n::random_rotation(args.dim, args.scale, &mut rng)?;
        let b = so_n::random_rotation(args.dim, args.scale, &mut rng)?;
        match survey_pair(&geodesics, &a, &b, &mut stats) {
            Ok(distance) => {
                succeeded += 1;
                stats.max_distance = stats.max_distance.max(distance);
                stats.mean_distance += distance;
            }
            Err(err) => {
                stats.failures += 1;
                warn!("Sample {sample} failed: {err}");
            }
        }
    }

    if succeeded > 0 {
        stats.mean_distance /= succeeded as f64;
    }
    let elapsed = start.elapsed();

    info!("Finished in {:.2?}", elapsed);
    info!(
        "Distance: mean {:.6}, max {:.6}",
        stats.mean_distance, stats.max_distance
    );
    if geodesics.len() == 2 {
        info!(
            "Max disagreement between log methods: {:.3e}",
            stats.max_disagreement
        );
    }
    info!(
        "Max midpoint orthogonality error: {:.3e}",
        stats.max_midpoint_orthogonality
    );
    if stats.failures > 0 {
        warn!("{} of {} samples failed", stats.failures, args.samples);
    }

    Ok(())
}
