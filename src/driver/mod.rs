//! Engine and the two drivers built on it
//!
//! [`InteractiveDriver`] draws the live view on whatever clock the host
//! provides. [`ExportDriver`] steps a separate engine through virtual time
//! for offline frame capture.

pub mod engine;
pub mod export;
pub mod interactive;

pub use engine::{ActiveSource, DensitySetting, DensitySource, EnginePhase, LatticeEngine};
pub use export::{
    frame_count, CancelToken, DriverState, ExportDriver, ExportOutcome, FrameInfo, FrameSink,
};
pub use interactive::{InteractiveDriver, ViewSettings};
