//! Example: Modify the interfaces of a generated microstructure
//!
//! Reads the snapshot stored next to a `.cae` model, switches the interfaces
//! of a random fraction of grains to the secondary property and writes the
//! chained snapshot plus a geometry/property descriptor.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use voronoi_polycrystal::*;

/// Assign heterogeneous interface properties to a generated microstructure
#[derive(Parser)]
#[command(name = "modify_microstructure")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Modify grain interfaces of a generated microstructure", long_about = None)]
struct Cli {
    /// Output name; writes <name>.json and <name>.descriptor.json
    name: String,

    /// Model file to modify; its snapshot is the matching .json
    cae: PathBuf,

    /// Fraction of grains to give modified properties
    fraction: f64,

    /// New seed for the selection (random if omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Secondary strength as a multiple of the primary strength
    #[arg(long, requires = "toughness_ratio")]
    strength_ratio: Option<f64>,

    /// Secondary toughness as a multiple of the primary toughness
    #[arg(long, requires = "strength_ratio")]
    toughness_ratio: Option<f64>,

    /// Override the primary strength
    #[arg(long)]
    prop_1: Option<f64>,

    /// Override the secondary strength
    #[arg(long)]
    prop_2: Option<f64>,

    /// Override the primary critical displacement
    #[arg(long)]
    crit_disp_1: Option<f64>,

    /// Override the secondary critical displacement
    #[arg(long)]
    crit_disp_2: Option<f64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn build_config(cli: &Cli) -> Result<ModificationConfig> {
    let mut builder = ModificationConfigBuilder::new().fraction(cli.fraction)?;
    if let Some(seed) = cli.seed {
        builder = builder.seed(seed);
    }
    if let (Some(strength), Some(toughness)) = (cli.strength_ratio, cli.toughness_ratio) {
        builder = builder.ratios(strength, toughness)?;
    }
    if let Some(v) = cli.prop_1 {
        builder = builder.prop_1(v)?;
    }
    if let Some(v) = cli.prop_2 {
        builder = builder.prop_2(v)?;
    }
    if let Some(v) = cli.crit_disp_1 {
        builder = builder.crit_disp_1(v)?;
    }
    if let Some(v) = cli.crit_disp_2 {
        builder = builder.crit_disp_2(v)?;
    }
    Ok(builder.build())
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

    let config = build_config(&cli)?;
    let snapshot_path = snapshot_path_for_model(&cli.cae)?;
    let modification = modify_file(&snapshot_path, &config)?;

    println!("size:     {}", modification.snapshot.size);
    println!("seed:     {}", modification.snapshot.seed);
    println!("new seed: {}", modification.seed);
    println!("prop_1:   {}", modification.primary.strength);
    println!("prop_2:   {}", modification.secondary.strength);
    println!(
        "modified: {} grains, {} of {} interfaces",
        modification.modified.len(),
        modification.modified_pairs().count(),
        modification.interfaces.len()
    );

    let naming = BasicPropertyNaming;
    let descriptor = describe_modification(&modification, &naming)?;
    for assignment in descriptor.overrides() {
        println!(
            "  {} <-> {}: {}",
            assignment.first, assignment.second, assignment.property
        );
    }

    let output = PathBuf::from(format!("{}.json", cli.name));
    modification.snapshot.write(&output)?;

    let descriptor_path = PathBuf::from(format!("{}.descriptor.json", cli.name));
    fs::write(&descriptor_path, serde_json::to_string_pretty(&descriptor)?)?;

    println!("snapshot:   {}", output.display());
    println!("descriptor: {}", descriptor_path.display());

    Ok(())
}
