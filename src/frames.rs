//! Frame sinks for export runs
//!
//! [`SvgFrameWriter`] writes each frame as a numbered SVG file.
//! [`FrameCollector`] keeps frames in memory as display lists.

use std::fs;
use std::path::{Path, PathBuf};

use crate::driver::{FrameInfo, FrameSink};
use crate::error::{ExportError, SurfaceError};
use crate::render::{render_svg_string, write_svg, DrawCommand, RecordingSurface, Surface};

/// Writes `<dir>/<prefix>_00000.svg`, `<prefix>_00001.svg`, ...
#[derive(Debug)]
pub struct SvgFrameWriter {
    dir: PathBuf,
    prefix: String,
    written: Vec<PathBuf>,
}

impl SvgFrameWriter {
    /// Create the output directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ExportError> {
        Self::with_prefix(dir, "frame")
    }

    pub fn with_prefix(dir: impl Into<PathBuf>, prefix: &str) -> Result<Self, ExportError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            prefix: prefix.to_string(),
            written: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}_{:05}.svg", self.prefix, index))
    }

    /// Files written so far, in frame order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl FrameSink<RecordingSurface> for SvgFrameWriter {
    fn write_frame(
        &mut self,
        frame: &FrameInfo,
        surface: &RecordingSurface,
    ) -> Result<(), ExportError> {
        let path = self.path_for(frame.index);
        write_svg(&path, surface).map_err(|source| ExportError::Surface {
            frame: frame.index,
            source,
        })?;
        log::debug!("wrote {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

/// In-memory frames, for previews and tests
#[derive(Debug, Clone, Default)]
pub struct FrameCollector {
    size: (u32, u32),
    frames: Vec<(FrameInfo, Vec<DrawCommand>)>,
}

impl FrameCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[(FrameInfo, Vec<DrawCommand>)] {
        &self.frames
    }

    pub fn info(&self) -> impl Iterator<Item = &FrameInfo> {
        self.frames.iter().map(|(info, _)| info)
    }

    /// Render frame `index` as an SVG document
    pub fn to_svg(&self, index: usize) -> Result<Option<String>, SurfaceError> {
        let Some((_, commands)) = self.frames.get(index) else {
            return Ok(None);
        };
        let frame = RecordingSurface::from_commands(self.size, commands.clone());
        let (svg, ()) = render_svg_string(self.size, |target| frame.replay(target))?;
        Ok(Some(svg))
    }
}

impl FrameSink<RecordingSurface> for FrameCollector {
    fn write_frame(
        &mut self,
        frame: &FrameInfo,
        surface: &RecordingSurface,
    ) -> Result<(), ExportError> {
        self.size = surface.size();
        self.frames.push((*frame, surface.commands().to_vec()));
        Ok(())
    }
}
