//! Export a score as a numbered sequence of SVG frames
//!
//! Usage: export-frames [OPTIONS] <score.json> <output_dir>
//!
//! Without a score file (`-`), the fallback chromatic animation is exported
//! and `--end` is required.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tonnetz::driver::{DensitySetting, DensitySource};
use tonnetz::frames::SvgFrameWriter;
use tonnetz::lattice::LayoutKind;
use tonnetz::{EngineConfig, ExportDriver, RecordingSurface, Score, ViewSettings};

#[derive(Parser)]
#[command(name = "export-frames", about = "Render a score to SVG frames")]
struct Args {
    /// Score JSON file, or `-` for none
    score: String,

    /// Directory for the frames
    output_dir: PathBuf,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames per second (overrides config)
    #[arg(long)]
    fps: Option<f64>,

    /// Start time in seconds (overrides config)
    #[arg(long)]
    start: Option<f64>,

    /// End time in seconds (default: end of score)
    #[arg(long)]
    end: Option<f64>,

    /// Frame width in pixels (overrides config)
    #[arg(long)]
    width: Option<u32>,

    /// Frame height in pixels (overrides config)
    #[arg(long)]
    height: Option<u32>,

    /// Lattice density (default: chosen from the frame size)
    #[arg(long)]
    density: Option<f64>,

    /// Layout: rows (a) or columns (b)
    #[arg(long)]
    layout: Option<LayoutKind>,

    /// File name prefix
    #[arg(long, default_value = "frame")]
    prefix: String,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let score = if args.score == "-" {
        None
    } else {
        let score = Score::load(&args.score)?;
        println!(
            "Loaded {} notes in {} tracks ({:.2}s)",
            score.note_count(),
            score.tracks.len(),
            score.end_time()
        );
        Some(Arc::new(score))
    };

    let mut settings = config.export.clone();
    settings.width = args.width.unwrap_or(settings.width);
    settings.height = args.height.unwrap_or(settings.height);
    settings.frame_rate = args.fps.unwrap_or(settings.frame_rate);
    settings.start = args.start.unwrap_or(settings.start);
    settings.end = args.end.or(settings.end);
    settings.density = args.density.or(settings.density);
    if score.is_none() && settings.end.is_none() {
        return Err("--end is required when no score is given".into());
    }

    let view = ViewSettings {
        density: DensitySetting {
            value: config.auto_density(settings.width as f64, settings.height as f64),
            source: DensitySource::Auto,
        },
        layout: args.layout.unwrap_or(config.layout),
        theme: config.theme.resolve()?,
        fallback_interval: config.fallback_interval,
    };

    let mut driver = ExportDriver::new(
        RecordingSurface::new(settings.width, settings.height),
        &view,
        &settings,
        score,
    )?;
    let mut writer = SvgFrameWriter::with_prefix(args.output_dir.clone(), &args.prefix)?;

    println!("Configuration:");
    println!("  Size: {}x{}", settings.width, settings.height);
    println!("  Frame rate: {} fps", settings.frame_rate);
    println!("  Frames: {}", driver.frame_count());
    println!("  Layout: {:?}", view.layout);
    println!();
    println!("Rendering...");

    let outcome = driver.run(&mut writer)?;

    println!(
        "✓ Wrote {} frames to {}",
        outcome.frames,
        writer.dir().display()
    );
    Ok(())
}
