//! UrbanMatrix CLI - Grid density classification

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use urbanmatrix_algorithms::classify::{classify, ClassifyParams, ClassifySummary, Thresholds};
use urbanmatrix_algorithms::coverage::{compute_coverage, CoverageParams, InvalidGeometryPolicy};
use urbanmatrix_algorithms::grid::{build_grid, GridParams};
use urbanmatrix_algorithms::pipeline::{run_pipeline, PipelineParams};
use urbanmatrix_core::crs::transform::transform_features;
use urbanmatrix_core::io::{read_features, read_grid, write_features, write_grid};
use urbanmatrix_core::{DensityClass, Extent, FeatureCollection, Grid, CRS};
use urbanmatrix_ingest::{fetch_footprints, ClientOptions};
use urbanmatrix_style::{apply_class_colors, apply_footprint_outline, apply_grid_outline};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "urbanmatrix")]
#[command(author, version, about = "Grid density classification for building footprints", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an analysis grid over an extent
    Grid {
        /// Extent as "min_x,min_y,max_x,max_y"
        extent: String,
        /// Output GeoJSON file
        output: PathBuf,
        /// Cell edge length in CRS units
        #[arg(short, long, default_value = "100.0")]
        cell_size: f64,
        /// EPSG code of the extent coordinates
        #[arg(long, default_value = "3857")]
        epsg: u32,
        /// Stamp outline symbology onto the output
        #[arg(long)]
        styled: bool,
    },
    /// Compute per-cell footprint coverage on an existing grid
    Coverage {
        /// Grid GeoJSON written by `grid`
        grid: PathBuf,
        /// Building footprints GeoJSON
        footprints: PathBuf,
        /// Output GeoJSON file
        output: PathBuf,
        /// EPSG code of the footprint coordinates
        #[arg(long, default_value = "4326")]
        footprints_epsg: u32,
        /// Leave cells touched by broken footprints unresolved instead of failing
        #[arg(long)]
        mark_unresolved: bool,
    },
    /// Classify a coverage grid into density classes
    Classify {
        /// Grid GeoJSON with coverage values
        grid: PathBuf,
        /// Output GeoJSON file
        output: PathBuf,
        /// Low/Moderate boundary (coverage percent)
        #[arg(long, default_value = "25.0")]
        low: f64,
        /// Moderate/High boundary (coverage percent)
        #[arg(long, default_value = "50.0")]
        mid: f64,
        /// High/VeryHigh boundary (coverage percent)
        #[arg(long, default_value = "75.0")]
        high: f64,
        /// Color cells by class in the output
        #[arg(long)]
        styled: bool,
    },
    /// Run the full pipeline: grid, coverage, classification
    Run {
        /// Extent as "min_x,min_y,max_x,max_y"
        extent: String,
        /// Output GeoJSON file
        output: PathBuf,
        /// Building footprints GeoJSON; downloaded when omitted
        #[arg(short, long)]
        footprints: Option<PathBuf>,
        /// EPSG code of the footprint coordinates
        #[arg(long, default_value = "4326")]
        footprints_epsg: u32,
        /// Cell edge length in CRS units
        #[arg(short, long, default_value = "100.0")]
        cell_size: f64,
        /// EPSG code of the extent coordinates
        #[arg(long, default_value = "3857")]
        epsg: u32,
        /// Low/Moderate boundary (coverage percent)
        #[arg(long, default_value = "25.0")]
        low: f64,
        /// Moderate/High boundary (coverage percent)
        #[arg(long, default_value = "50.0")]
        mid: f64,
        /// High/VeryHigh boundary (coverage percent)
        #[arg(long, default_value = "75.0")]
        high: f64,
        /// Leave cells touched by broken footprints unresolved instead of failing
        #[arg(long)]
        mark_unresolved: bool,
        /// Color cells by class in the output
        #[arg(long)]
        styled: bool,
    },
    /// Download building footprints for an extent
    Fetch {
        /// Extent as "min_x,min_y,max_x,max_y"
        extent: String,
        /// Output GeoJSON file
        output: PathBuf,
        /// EPSG code of the extent coordinates
        #[arg(long, default_value = "4326")]
        epsg: u32,
        /// Stamp outline symbology onto the output
        #[arg(long)]
        styled: bool,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn parse_extent(s: &str, epsg: u32) -> Result<Extent> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 4 {
        anyhow::bail!("Extent must be 'min_x,min_y,max_x,max_y', got: {}", s);
    }
    let mut corners = [0.0f64; 4];
    for (i, part) in parts.iter().enumerate() {
        corners[i] = part
            .trim()
            .parse()
            .with_context(|| format!("Invalid extent coordinate: {}", part.trim()))?;
    }
    let extent = Extent::new(corners[0], corners[1], corners[2], corners[3], CRS::from_epsg(epsg));
    if !extent.is_valid() {
        anyhow::bail!("Extent is degenerate: min must be less than max on both axes");
    }
    Ok(extent)
}

fn read_grid_file(path: &PathBuf) -> Result<Grid> {
    let pb = spinner("Reading grid...");
    let grid = read_grid(path).context("Failed to read grid")?;
    pb.finish_and_clear();
    info!("Grid: {} cells of {}", grid.len(), grid.cell_size());
    Ok(grid)
}

fn read_footprints_file(path: &PathBuf, epsg: u32) -> Result<FeatureCollection> {
    let pb = spinner("Reading footprints...");
    let footprints =
        read_features(path, CRS::from_epsg(epsg)).context("Failed to read footprints")?;
    pb.finish_and_clear();
    info!("Footprints: {} features", footprints.len());
    Ok(footprints)
}

fn fetch_remote(extent: &Extent) -> Result<FeatureCollection> {
    let pb = spinner("Fetching building footprints...");
    let footprints = fetch_footprints(extent, ClientOptions::default())
        .context("Failed to fetch footprints")?;
    pb.finish_and_clear();
    info!("Fetched {} footprints", footprints.len());
    Ok(footprints)
}

fn write_grid_file(grid: &Grid, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_grid(grid, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn write_features_file(features: &FeatureCollection, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_features(features, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn print_class_summary(summary: &ClassifySummary) {
    println!("Class counts:");
    for &class in DensityClass::ALL {
        println!("  {:<9} {}", class.label(), summary.count(class));
    }
}

fn print_coverage_line(resolved: usize, unresolved: &[u64], skipped: &[usize]) {
    println!("Coverage: {} cells resolved, {} unresolved", resolved, unresolved.len());
    if !skipped.is_empty() {
        println!("  Skipped footprints: {:?}", skipped);
    }
}

fn invalid_policy(mark_unresolved: bool) -> InvalidGeometryPolicy {
    if mark_unresolved {
        InvalidGeometryPolicy::MarkUnresolved
    } else {
        InvalidGeometryPolicy::Fail
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Grid ─────────────────────────────────────────────────────
        Commands::Grid {
            extent,
            output,
            cell_size,
            epsg,
            styled,
        } => {
            let extent = parse_extent(&extent, epsg)?;
            let start = Instant::now();
            let mut grid =
                build_grid(&extent, GridParams { cell_size }).context("Failed to build grid")?;
            let elapsed = start.elapsed();
            if styled {
                apply_grid_outline(&mut grid);
            }
            write_grid_file(&grid, &output)?;
            println!("Cells: {}", grid.len());
            done("Grid", &output, elapsed);
        }

        // ── Coverage ─────────────────────────────────────────────────
        Commands::Coverage {
            grid,
            footprints,
            output,
            footprints_epsg,
            mark_unresolved,
        } => {
            let mut grid = read_grid_file(&grid)?;
            let footprints = read_footprints_file(&footprints, footprints_epsg)?;
            let footprints = if footprints.crs().is_equivalent(grid.crs()) {
                footprints
            } else {
                info!("Reprojecting footprints {} -> {}", footprints.crs(), grid.crs());
                transform_features(&footprints, grid.crs())
                    .context("Failed to reproject footprints")?
            };

            let params = CoverageParams {
                on_invalid: invalid_policy(mark_unresolved),
                ..CoverageParams::default()
            };
            let start = Instant::now();
            let summary = compute_coverage(&mut grid, &footprints, params)
                .context("Failed to compute coverage")?;
            let elapsed = start.elapsed();
            write_grid_file(&grid, &output)?;
            print_coverage_line(
                summary.resolved_cells,
                &summary.unresolved_cells,
                &summary.skipped_features,
            );
            done("Coverage", &output, elapsed);
        }

        // ── Classify ─────────────────────────────────────────────────
        Commands::Classify {
            grid,
            output,
            low,
            mid,
            high,
            styled,
        } => {
            let mut grid = read_grid_file(&grid)?;
            let params = ClassifyParams {
                thresholds: Thresholds::new(low, mid, high),
                ..ClassifyParams::default()
            };
            let start = Instant::now();
            let summary = classify(&mut grid, params).context("Failed to classify grid")?;
            let elapsed = start.elapsed();
            if styled {
                apply_class_colors(&mut grid);
            }
            write_grid_file(&grid, &output)?;
            print_class_summary(&summary);
            done("Classification", &output, elapsed);
        }

        // ── Run ──────────────────────────────────────────────────────
        Commands::Run {
            extent,
            output,
            footprints,
            footprints_epsg,
            cell_size,
            epsg,
            low,
            mid,
            high,
            mark_unresolved,
            styled,
        } => {
            let extent = parse_extent(&extent, epsg)?;
            let footprints = match footprints {
                Some(path) => read_footprints_file(&path, footprints_epsg)?,
                None => fetch_remote(&extent)?,
            };

            let params = PipelineParams {
                grid: GridParams { cell_size },
                coverage: CoverageParams {
                    on_invalid: invalid_policy(mark_unresolved),
                    ..CoverageParams::default()
                },
                classify: ClassifyParams {
                    thresholds: Thresholds::new(low, mid, high),
                    ..ClassifyParams::default()
                },
            };
            let start = Instant::now();
            let (mut grid, summary) =
                run_pipeline(&extent, &footprints, params).context("Pipeline failed")?;
            let elapsed = start.elapsed();
            if styled {
                apply_class_colors(&mut grid);
            }
            write_grid_file(&grid, &output)?;
            println!("Cells: {}", grid.len());
            print_coverage_line(
                summary.coverage.resolved_cells,
                &summary.coverage.unresolved_cells,
                &summary.coverage.skipped_features,
            );
            print_class_summary(&summary.classes);
            done("Pipeline", &output, elapsed);
        }

        // ── Fetch ────────────────────────────────────────────────────
        Commands::Fetch {
            extent,
            output,
            epsg,
            styled,
        } => {
            let extent = parse_extent(&extent, epsg)?;
            let start = Instant::now();
            let mut footprints = fetch_remote(&extent)?;
            let elapsed = start.elapsed();
            if styled {
                apply_footprint_outline(&mut footprints);
            }
            write_features_file(&footprints, &output)?;
            println!("Footprints: {}", footprints.len());
            done("Fetch", &output, elapsed);
        }
    }

    Ok(())
}
