//! Tonal lattice rendering
//!
//! Lays the twelve pitch classes out on a triangular lattice sized to a
//! viewport, lights the nodes that are currently sounding and draws the
//! result through a small [`Surface`](render::Surface) abstraction.
//!
//! - [`lattice`]: node generation, pitch classes and adjacency
//! - [`active`]: which pitch classes are lit at a given moment
//! - [`render`]: the frame renderer, colours and drawing surfaces
//! - [`driver`]: the shared engine plus the live and export drivers
//! - [`frames`]: sinks that store or write exported frames

pub mod active;
pub mod config;
pub mod driver;
pub mod error;
pub mod frames;
pub mod lattice;
pub mod render;
pub mod score;

pub use active::{ActivePitchSet, KeyDirection};
pub use config::{EngineConfig, ExportSettings};
pub use driver::{ExportDriver, InteractiveDriver, LatticeEngine, ViewSettings};
pub use error::{ConfigError, ExportError, ScoreError, SurfaceError};
pub use lattice::{LatticeParameters, LayoutKind, Node, PitchClass};
pub use render::{render_frame, RecordingSurface, Surface, Theme};
pub use score::{NoteEvent, Score, Track};
