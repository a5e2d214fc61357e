//! Render a single lattice frame to SVG
//!
//! Usage: render-frame [OPTIONS] <output.svg>
//!
//! Examples:
//!   render-frame --active C --active E --active G triad.svg
//!   render-frame --width 1920 --height 1080 --layout columns --theme dark wide.svg

use std::path::PathBuf;

use clap::Parser;
use plotters_svg::SVGBackend;
use tonnetz::lattice::{LatticeParameters, LayoutKind, PitchClass};
use tonnetz::render::PlottersSurface;
use tonnetz::{EngineConfig, LatticeEngine};

#[derive(Parser)]
#[command(name = "render-frame", about = "Render one tonal lattice frame to SVG")]
struct Args {
    /// Output SVG path
    output: PathBuf,

    /// Image width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Lattice density (default: chosen from the image size)
    #[arg(long)]
    density: Option<f64>,

    /// Layout: rows (a) or columns (b)
    #[arg(long)]
    layout: Option<LayoutKind>,

    /// Pitch class to highlight (name like C# / Eb, or a number); repeatable
    #[arg(long = "active", value_name = "PITCH")]
    active: Vec<PitchClass>,

    /// Theme preset (light, dark)
    #[arg(long)]
    theme: Option<String>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let theme = match &args.theme {
        Some(name) => tonnetz::Theme::preset(name)?,
        None => config.theme.resolve()?,
    };
    let (width, height) = (args.width as f64, args.height as f64);
    let density = args
        .density
        .unwrap_or_else(|| config.auto_density(width, height));
    let layout = args.layout.unwrap_or(config.layout);

    println!("Tonal Lattice Frame");
    println!("===================");
    println!("  Size: {}x{}", args.width, args.height);
    println!("  Density: {:.2}", density);
    println!("  Layout: {:?}", layout);
    println!(
        "  Active: [{}]",
        args.active
            .iter()
            .map(|pc| pc.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();

    let mut engine = LatticeEngine::new(
        LatticeParameters::new(width, height, density, layout),
        theme,
    );
    let pitches: Vec<i32> = args.active.iter().map(|pc| pc.semitone() as i32).collect();

    let mut surface =
        PlottersSurface::from_backend(SVGBackend::new(&args.output, (args.width, args.height)));
    let stats = engine.update(0.0, Some(&pitches), &mut surface)?;
    surface.present()?;

    println!(
        "  {} nodes, {} edges, {} active, {} highlighted edges, {} triangles",
        stats.nodes, stats.edges, stats.active_nodes, stats.active_edges, stats.triangles
    );
    println!("✓ Wrote {}", args.output.display());
    Ok(())
}
