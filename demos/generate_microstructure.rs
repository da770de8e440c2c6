//! Example: Generate a polycrystal microstructure
//!
//! Builds the grains, inserts the precrack and writes `<name>.json`, the
//! snapshot later read by `modify_microstructure`.

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use voronoi_polycrystal::*;

/// Generate a Voronoi polycrystal and write its snapshot
#[derive(Parser)]
#[command(name = "generate_microstructure")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate a Voronoi polycrystal microstructure", long_about = None)]
struct Cli {
    /// Output name; the snapshot is written to <name>.json
    name: String,

    /// Lattice size (the domain is size x size)
    size: usize,

    /// Strength of the primary interfaces
    prop_1: f64,

    /// Strength of the secondary interfaces
    prop_2: f64,

    /// Seed value (random if omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Inward offset of every grain edge
    #[arg(long, default_value_t = 0.005)]
    gap: f64,

    /// Critical displacement of both interface buckets
    #[arg(long, default_value_t = 1e-5)]
    plastic_displacement: f64,

    /// Keep only six-sided regions
    #[arg(long)]
    hexagonal_only: bool,

    /// Do not insert a precrack
    #[arg(long)]
    no_precrack: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut builder = MicrostructureConfigBuilder::new()
        .size(cli.size)?
        .prop_1(cli.prop_1)?
        .prop_2(cli.prop_2)?
        .gap_distance(cli.gap)?
        .plastic_displacement(cli.plastic_displacement)?;
    if let Some(seed) = cli.seed {
        builder = builder.seed(seed);
    }
    if cli.hexagonal_only {
        builder = builder.region_filter(RegionFilter::HexagonalOnly);
    }
    if cli.no_precrack {
        builder = builder.precrack(PrecrackMode::Disabled);
    }
    let config = builder.build();

    let microstructure = Microstructure::generate(config)?;

    let path = PathBuf::from(format!("{}.json", cli.name));
    microstructure.snapshot().write(&path)?;

    println!("seed:            {}", config.seed);
    println!("regions:         {}", microstructure.region_count());
    println!("grains:          {}", microstructure.grain_count());
    println!("removed (crack): {}", microstructure.removed_grains().len());
    if let Some(area) = microstructure.average_grain_area() {
        println!("area per grain:  {:.4}", area);
    }
    if let Some(size) = microstructure.grain_size() {
        println!("grain size:      {:.4}", size);
    }
    println!("length scale 1:  {:.6e}", config.length_scale_1());
    println!("length scale 2:  {:.6e}", config.length_scale_2());
    println!("snapshot:        {}", path.display());

    Ok(())
}
