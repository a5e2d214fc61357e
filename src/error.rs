//! Error types
//!
//! The lattice engine itself has no business errors. Everything here is
//! either a drawing-surface failure or a problem at an outer boundary
//! (config files, score files, frame output).

use thiserror::Error;

/// Failure of a single draw call or of acquiring a surface
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    /// No drawable surface is attached (e.g. the view has no 2D context yet)
    #[error("no drawing surface available")]
    Unavailable,
    /// The backing implementation rejected a draw call
    #[error("drawing backend error: {0}")]
    Backend(String),
}

/// Errors that abort an export run
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("frame rate must be positive and finite, got {0}")]
    InvalidFrameRate(f64),
    #[error("invalid export range [{start}, {end})")]
    InvalidRange { start: f64, end: f64 },
    #[error("frame {frame} could not be drawn: {source}")]
    Surface {
        frame: usize,
        #[source]
        source: SurfaceError,
    },
    #[error("frame consumer failed at frame {frame}: {message}")]
    Sink { frame: usize, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors while loading an [`EngineConfig`](crate::config::EngineConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid colour `{0}`")]
    InvalidColor(String),
    #[error("unknown theme preset `{0}`")]
    UnknownTheme(String),
}

/// Errors while loading a [`Score`](crate::score::Score) from disk
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("failed to read score: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid score: {0}")]
    Json(#[from] serde_json::Error),
}
