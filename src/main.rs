use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tonnetz::driver::{DriverState, InteractiveDriver};
use tonnetz::frames::FrameCollector;
use tonnetz::lattice::{build, AdjacencyIndex, LatticeParameters, LayoutKind};
use tonnetz::{EngineConfig, ExportDriver, ExportSettings, NoteEvent, RecordingSurface, Score, Track};

fn demo_lattice() {
    println!("\n=== Lattice Demo ===\n");

    for layout in [LayoutKind::Rows, LayoutKind::Columns] {
        let params = LatticeParameters::new(400.0, 300.0, 14.0, layout);
        let nodes = build(&params);
        let index = AdjacencyIndex::new(&nodes, params.unit());
        println!(
            "  {:?}: {} nodes, unit {:.1}px, {} edges",
            layout,
            nodes.len(),
            params.unit(),
            index.edge_count()
        );
        for node in nodes.iter().take(4) {
            println!(
                "    ({:6.1}, {:6.1}) {}",
                node.x, node.y, node.pitch_class
            );
        }
    }
}

fn demo_live_view() -> Result<(), Box<dyn Error>> {
    println!("\n=== Live View Demo ===\n");

    let mut driver =
        InteractiveDriver::new(EngineConfig::default(), Some(RecordingSurface::new(640, 480)))?;
    driver.set_active(&[60, 64, 67]);
    driver.update(0.0);

    let t0 = Instant::now();
    for (k, width) in [700.0, 760.0, 820.0].into_iter().enumerate() {
        driver.request_resize(width, 480.0, t0 + Duration::from_millis(10 * k as u64));
    }
    let applied_early = driver.poll(t0 + Duration::from_millis(25));
    let applied_late = driver.poll(t0 + Duration::from_millis(60));
    println!("  Resize burst applied at +25ms: {}", applied_early);
    println!("  Resize burst applied at +60ms: {}", applied_late);
    println!(
        "  Lattice builds: {} (density {:.2}, {:?})",
        driver.engine().rebuild_count(),
        driver.density().value,
        driver.density().source
    );

    if let Some(pc) = driver.click(410.0, 240.0) {
        println!("  Click lit {}", pc);
    }
    println!("  Frames drawn: {}", driver.frames_drawn());
    Ok(())
}

fn demo_export() -> Result<(), Box<dyn Error>> {
    println!("\n=== Export Demo ===\n");

    // C major, F major, G major, C major: half a second each
    let chords: [&[i32]; 4] = [&[0, 4, 7], &[5, 9, 0], &[7, 11, 2], &[0, 4, 7]];
    let notes = chords
        .iter()
        .enumerate()
        .flat_map(|(k, chord)| {
            chord
                .iter()
                .map(move |&pc| NoteEvent::new(pc, k as f64 * 0.5, 0.5))
        })
        .collect();
    let score = Arc::new(Score {
        tracks: vec![Track { notes }],
        tempo: 120.0,
        duration: 2.0,
    });

    let live =
        InteractiveDriver::new(EngineConfig::default(), Some(RecordingSurface::new(640, 480)))?;
    let settings = ExportSettings {
        width: 480,
        height: 360,
        frame_rate: 4.0,
        ..Default::default()
    };

    let mut driver = ExportDriver::new(
        RecordingSurface::new(settings.width, settings.height),
        &live.view_settings(),
        &settings,
        Some(score),
    )?;

    println!("Configuration:");
    println!("  Size: {}x{}", settings.width, settings.height);
    println!("  Frame rate: {} fps", settings.frame_rate);
    println!("  Frames: {}", driver.frame_count());
    println!();

    let mut collector = FrameCollector::new();
    loop {
        let state = driver.step(&mut collector)?;
        if state != DriverState::Running {
            println!("  Finished: {:?}", state);
            break;
        }
    }

    println!(
        "{:<6} {:<8} {:<8} {:<8} {:<10}",
        "Frame", "Time", "Active", "Edges", "Triangles"
    );
    println!("{}", "-".repeat(44));
    for info in collector.info() {
        println!(
            "{:<6} {:<8.3} {:<8} {:<8} {:<10}",
            info.index,
            info.time,
            info.stats.active_nodes,
            info.stats.active_edges,
            info.stats.triangles
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    println!("Tonal Lattice Engine");
    println!("====================");

    demo_lattice();
    demo_live_view()?;
    demo_export()?;

    println!("\n====================");
    println!("All demos complete!");
    Ok(())
}
