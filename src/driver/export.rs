//! Offline frame export
//!
//! Steps a private engine through virtual time at a fixed frame rate and
//! hands every drawn frame to a [`FrameSink`]. Frame `k` is always drawn at
//! `start + k / frame_rate`, however long the sink takes, so a slow consumer
//! never causes frames to be dropped.
//!
//! The export engine is built from a [`ViewSettings`] snapshot and never
//! touches the live view.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ExportSettings;
use crate::error::ExportError;
use crate::lattice::LatticeParameters;
use crate::render::{RenderStats, Surface};
use crate::score::Score;

use super::engine::LatticeEngine;
use super::interactive::ViewSettings;

/// Progress of an export run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// More frames to draw
    Running,
    /// Every frame in the range has been delivered
    Complete,
    /// Stopped early; the surface has been released
    Cancelled,
    /// Aborted by a surface or sink error; the surface has been released
    Failed,
}

/// Cooperative cancellation flag, checked before each frame
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Metadata for one exported frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub index: usize,
    /// Virtual time in seconds
    pub time: f64,
    pub stats: RenderStats,
}

/// Consumer of drawn frames
pub trait FrameSink<S: Surface> {
    /// Called once per frame, after the frame has been drawn onto `surface`
    fn write_frame(&mut self, frame: &FrameInfo, surface: &S) -> Result<(), ExportError>;
}

impl<S, F> FrameSink<S> for F
where
    S: Surface,
    F: FnMut(&FrameInfo, &S) -> Result<(), ExportError>,
{
    fn write_frame(&mut self, frame: &FrameInfo, surface: &S) -> Result<(), ExportError> {
        self(frame, surface)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOutcome {
    /// Frames delivered to the sink during this run
    pub frames: usize,
    pub cancelled: bool,
}

pub struct ExportDriver<S: Surface> {
    engine: LatticeEngine,
    surface: Option<S>,
    frame_rate: f64,
    start: f64,
    end: f64,
    frame_count: usize,
    next_frame: usize,
    state: DriverState,
    cancel: CancelToken,
}

impl<S: Surface> std::fmt::Debug for ExportDriver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportDriver")
            .field("frame_rate", &self.frame_rate)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("frame_count", &self.frame_count)
            .field("next_frame", &self.next_frame)
            .field("state", &self.state)
            .finish()
    }
}

/// Number of frames needed to cover `[start, end)` at `frame_rate`
pub fn frame_count(start: f64, end: f64, frame_rate: f64) -> usize {
    let span = (end - start) * frame_rate;
    if span <= 0.0 {
        return 0;
    }
    // Tolerate float noise so that e.g. 2.0 s at 30 fps is exactly 60 frames
    (span - 1e-9).ceil() as usize
}

impl<S: Surface> ExportDriver<S> {
    /// Prepare an export onto `surface`
    ///
    /// The lattice is sized to the surface. Density comes from `settings`
    /// when given, otherwise from the live view. Without an explicit end the
    /// run covers the whole score.
    ///
    /// # Arguments
    /// * `surface` - Offscreen target, owned until the run ends
    /// * `view` - Density, layout, theme and fallback pacing of the live view
    /// * `settings` - Frame rate, time range and optional density override
    /// * `score` - Timeline to follow, or `None` for the fallback animation
    ///
    /// # Returns
    /// A driver positioned at frame 0. A non-positive frame rate gives
    /// `ExportError::InvalidFrameRate` and a reversed or negative range gives
    /// `ExportError::InvalidRange`.
    pub fn new(
        surface: S,
        view: &ViewSettings,
        settings: &ExportSettings,
        score: Option<Arc<Score>>,
    ) -> Result<Self, ExportError> {
        let frame_rate = settings.frame_rate;
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(ExportError::InvalidFrameRate(frame_rate));
        }

        let start = settings.start;
        let end = settings
            .end
            .unwrap_or_else(|| score.as_deref().map_or(start, Score::end_time));
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end < start {
            return Err(ExportError::InvalidRange { start, end });
        }

        let (width, height) = surface.size();
        let density = settings.density.unwrap_or(view.density.value);
        let mut engine = LatticeEngine::new(
            LatticeParameters::new(width as f64, height as f64, density, view.layout),
            view.theme,
        );
        engine.set_fallback_interval(view.fallback_interval);
        engine.follow_timeline(score);

        Ok(Self {
            engine,
            surface: Some(surface),
            frame_rate,
            start,
            end,
            frame_count: frame_count(start, end, frame_rate),
            next_frame: 0,
            state: DriverState::Running,
            cancel: CancelToken::new(),
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Virtual time of frame `index`
    pub fn frame_time(&self, index: usize) -> f64 {
        self.start + index as f64 / self.frame_rate
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state != DriverState::Running
    }

    pub fn frames_done(&self) -> usize {
        self.next_frame
    }

    pub fn engine(&self) -> &LatticeEngine {
        &self.engine
    }

    /// Handle for stopping the run from another thread
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// `None` once the run has been cancelled
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn into_surface(self) -> Option<S> {
        self.surface
    }

    /// Rewind to the first frame
    ///
    /// A driver whose surface was released by cancellation or failure stays
    /// stopped.
    pub fn reset(&mut self) {
        if self.surface.is_none() {
            return;
        }
        self.next_frame = 0;
        self.cancel.clear();
        self.state = DriverState::Running;
    }

    /// Draw and deliver the next frame
    ///
    /// An error from the surface or the sink ends the run: the driver moves
    /// to [`DriverState::Failed`], releases the surface and returns the error.
    pub fn step(&mut self, sink: &mut impl FrameSink<S>) -> Result<DriverState, ExportError> {
        if self.state != DriverState::Running {
            return Ok(self.state);
        }
        if self.cancel.is_cancelled() {
            self.surface = None;
            self.state = DriverState::Cancelled;
            return Ok(self.state);
        }
        if self.next_frame >= self.frame_count {
            self.state = DriverState::Complete;
            return Ok(self.state);
        }

        let index = self.next_frame;
        let time = self.frame_time(index);
        let Some(surface) = self.surface.as_mut() else {
            self.state = DriverState::Cancelled;
            return Ok(self.state);
        };
        let delivered = match self.engine.update(time, None, surface) {
            Ok(stats) => {
                log::trace!("export frame {index} at t={time:.4}");
                sink.write_frame(&FrameInfo { index, time, stats }, surface)
            }
            Err(source) => Err(ExportError::Surface {
                frame: index,
                source,
            }),
        };
        if let Err(err) = delivered {
            log::warn!("export aborted at frame {index}: {err}");
            self.surface = None;
            self.state = DriverState::Failed;
            return Err(err);
        }

        self.next_frame += 1;
        if self.next_frame >= self.frame_count {
            self.state = DriverState::Complete;
        }
        Ok(self.state)
    }

    /// Run to completion or cancellation
    pub fn run(&mut self, sink: &mut impl FrameSink<S>) -> Result<ExportOutcome, ExportError> {
        log::info!(
            "exporting {} frames over [{:.3}, {:.3}) at {} fps",
            self.frame_count,
            self.start,
            self.end,
            self.frame_rate
        );
        let first = self.next_frame;
        while self.step(sink)? == DriverState::Running {}

        let outcome = ExportOutcome {
            frames: self.next_frame - first,
            cancelled: self.state == DriverState::Cancelled,
        };
        if self.state == DriverState::Failed {
            log::warn!("export already failed; nothing to draw");
        } else if outcome.cancelled {
            log::info!(
                "export cancelled after {} of {} frames",
                outcome.frames,
                self.frame_count
            );
        } else {
            log::info!("export finished: {} frames", outcome.frames);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::active::FALLBACK_INTERVAL;
    use crate::config::EngineConfig;
    use crate::driver::engine::{DensitySetting, DensitySource};
    use crate::driver::interactive::InteractiveDriver;
    use crate::error::SurfaceError;
    use crate::lattice::LayoutKind;
    use crate::render::{DrawCommand, RecordingSurface, Theme};
    use crate::score::{NoteEvent, Track};

    fn view() -> ViewSettings {
        ViewSettings {
            density: DensitySetting {
                value: 12.0,
                source: DensitySource::Auto,
            },
            layout: LayoutKind::Rows,
            theme: Theme::light(),
            fallback_interval: FALLBACK_INTERVAL,
        }
    }

    fn settings(frame_rate: f64, end: f64) -> ExportSettings {
        ExportSettings {
            frame_rate,
            start: 0.0,
            end: Some(end),
            ..Default::default()
        }
    }

    fn score() -> Arc<Score> {
        Arc::new(Score {
            tracks: vec![Track {
                notes: vec![
                    NoteEvent::new(0, 0.0, 0.5),
                    NoteEvent::new(4, 0.25, 0.5),
                    NoteEvent::new(7, 0.5, 0.5),
                ],
            }],
            tempo: 120.0,
            duration: 1.0,
        })
    }

    fn driver(frame_rate: f64, end: f64) -> ExportDriver<RecordingSurface> {
        ExportDriver::new(
            RecordingSurface::new(300, 300),
            &view(),
            &settings(frame_rate, end),
            Some(score()),
        )
        .unwrap()
    }

    #[test]
    fn test_frame_count() {
        assert_eq!(frame_count(0.0, 2.0, 30.0), 60);
        assert_eq!(frame_count(0.0, 1.0, 24.0), 24);
        assert_eq!(frame_count(0.0, 0.1, 30.0), 3);
        assert_eq!(frame_count(0.0, 1.01, 10.0), 11);
        assert_eq!(frame_count(1.0, 1.0, 30.0), 0);
    }

    #[test]
    fn test_two_seconds_at_thirty_fps() {
        let mut driver = driver(30.0, 2.0);
        let mut times = Vec::new();
        let mut sink = |info: &FrameInfo, _: &RecordingSurface| {
            times.push((info.index, info.time));
            Ok(())
        };
        let outcome = driver.run(&mut sink).unwrap();

        assert_eq!(
            outcome,
            ExportOutcome {
                frames: 60,
                cancelled: false
            }
        );
        assert_eq!(times.len(), 60);
        for (k, (index, time)) in times.iter().enumerate() {
            assert_eq!(*index, k);
            assert!((time - k as f64 / 30.0).abs() < 1e-12);
        }
        assert!(driver.is_complete());
        assert_eq!(driver.state(), DriverState::Complete);
    }

    #[test]
    fn test_slow_sink_drops_nothing() {
        let mut driver = driver(20.0, 0.5);
        let mut seen = Vec::new();
        let mut sink = |info: &FrameInfo, _: &RecordingSurface| {
            std::thread::sleep(std::time::Duration::from_millis(2));
            seen.push(info.index);
            Ok(())
        };
        driver.run(&mut sink).unwrap();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_active_set_follows_virtual_time() {
        let mut driver = driver(4.0, 1.0);
        let mut active = Vec::new();
        let mut sink = |info: &FrameInfo, _: &RecordingSurface| {
            active.push(info.stats.active_nodes > 0);
            Ok(())
        };
        driver.run(&mut sink).unwrap();
        // t = 0, 0.25, 0.5, 0.75: something always sounds
        assert_eq!(active, vec![true; 4]);
    }

    #[test]
    fn test_end_defaults_to_score_end() {
        let settings = ExportSettings {
            frame_rate: 10.0,
            ..Default::default()
        };
        let driver = ExportDriver::new(
            RecordingSurface::new(100, 100),
            &view(),
            &settings,
            Some(score()),
        )
        .unwrap();
        assert_eq!(driver.frame_count(), 10);

        let empty =
            ExportDriver::new(RecordingSurface::new(100, 100), &view(), &settings, None).unwrap();
        assert_eq!(empty.frame_count(), 0);
    }

    #[test]
    fn test_cancel_releases_surface() {
        let mut driver = driver(30.0, 2.0);
        let token = driver.cancel_token();
        let mut count = 0;
        let mut sink = |info: &FrameInfo, _: &RecordingSurface| {
            count += 1;
            if info.index == 4 {
                token.cancel();
            }
            Ok(())
        };
        let outcome = driver.run(&mut sink).unwrap();

        assert_eq!(
            outcome,
            ExportOutcome {
                frames: 5,
                cancelled: true
            }
        );
        assert_eq!(count, 5);
        assert!(driver.surface().is_none());
        assert_eq!(driver.state(), DriverState::Cancelled);

        driver.reset();
        assert_eq!(driver.state(), DriverState::Cancelled);
        assert!(driver.into_surface().is_none());
    }

    #[test]
    fn test_reset_replays_from_start() {
        let mut driver = driver(10.0, 0.3);
        let mut first = Vec::new();
        driver
            .run(&mut |info: &FrameInfo, _: &RecordingSurface| {
                first.push(info.time);
                Ok(())
            })
            .unwrap();
        driver.reset();
        assert_eq!(driver.state(), DriverState::Running);
        let mut second = Vec::new();
        driver
            .run(&mut |info: &FrameInfo, _: &RecordingSurface| {
                second.push(info.time);
                Ok(())
            })
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_invalid_settings() {
        for fps in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = ExportDriver::new(
                RecordingSurface::new(10, 10),
                &view(),
                &settings(fps, 1.0),
                None,
            )
            .unwrap_err();
            assert!(matches!(err, ExportError::InvalidFrameRate(_)));
        }

        let backwards = ExportSettings {
            start: 2.0,
            end: Some(1.0),
            ..Default::default()
        };
        let err = ExportDriver::new(RecordingSurface::new(10, 10), &view(), &backwards, None)
            .unwrap_err();
        assert!(matches!(err, ExportError::InvalidRange { .. }));
    }

    #[test]
    fn test_sink_error_aborts() {
        let mut driver = driver(10.0, 1.0);
        let mut sink = |info: &FrameInfo, _: &RecordingSurface| {
            if info.index == 2 {
                return Err(ExportError::Sink {
                    frame: info.index,
                    message: "disk full".to_string(),
                });
            }
            Ok(())
        };
        let err = driver.run(&mut sink).unwrap_err();
        assert!(matches!(err, ExportError::Sink { frame: 2, .. }));
        assert_eq!(driver.frames_done(), 2);
        assert_eq!(driver.state(), DriverState::Failed);
        assert!(driver.surface().is_none());
        assert!(driver.is_complete());
    }

    #[test]
    fn test_failed_export_does_not_resume() {
        let mut driver = driver(10.0, 1.0);
        let mut failed_once = false;
        let mut sink = |info: &FrameInfo, _: &RecordingSurface| {
            if info.index == 2 && !failed_once {
                failed_once = true;
                return Err(ExportError::Sink {
                    frame: info.index,
                    message: "encoder busy".to_string(),
                });
            }
            Ok(())
        };
        assert!(driver.run(&mut sink).is_err());

        let mut delivered = 0;
        let outcome = driver
            .run(&mut |_: &FrameInfo, _: &RecordingSurface| {
                delivered += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(delivered, 0);
        assert_eq!(outcome.frames, 0);
        assert_eq!(driver.state(), DriverState::Failed);

        driver.reset();
        assert_eq!(driver.state(), DriverState::Failed);
        let mut sink = |_: &FrameInfo, _: &RecordingSurface| Ok(());
        assert_eq!(driver.step(&mut sink).unwrap(), DriverState::Failed);
    }

    #[test]
    fn test_surface_error_names_frame() {
        struct Failing;
        impl Surface for Failing {
            fn size(&self) -> (u32, u32) {
                (100, 100)
            }
            fn clear(&mut self, _: crate::render::Color) -> Result<(), SurfaceError> {
                Err(SurfaceError::Backend("gone".into()))
            }
            fn fill_rect(
                &mut self,
                _: crate::render::Point,
                _: f64,
                _: f64,
                _: crate::render::Color,
            ) -> Result<(), SurfaceError> {
                Ok(())
            }
            fn stroke_line(
                &mut self,
                _: crate::render::Point,
                _: crate::render::Point,
                _: f64,
                _: crate::render::Color,
            ) -> Result<(), SurfaceError> {
                Ok(())
            }
            fn fill_circle(
                &mut self,
                _: crate::render::Point,
                _: f64,
                _: crate::render::Color,
            ) -> Result<(), SurfaceError> {
                Ok(())
            }
            fn fill_polygon(
                &mut self,
                _: &[crate::render::Point],
                _: crate::render::Color,
            ) -> Result<(), SurfaceError> {
                Ok(())
            }
            fn draw_text(
                &mut self,
                _: &str,
                _: crate::render::Point,
                _: f64,
                _: crate::render::Color,
            ) -> Result<(), SurfaceError> {
                Ok(())
            }
        }

        let mut driver = ExportDriver::new(Failing, &view(), &settings(10.0, 1.0), None).unwrap();
        let err = driver
            .run(&mut |_: &FrameInfo, _: &Failing| Ok(()))
            .unwrap_err();
        assert!(matches!(err, ExportError::Surface { frame: 0, .. }));
    }

    fn collect_export(view: &ViewSettings, end: f64) -> Vec<Vec<DrawCommand>> {
        let mut driver = ExportDriver::new(
            RecordingSurface::new(300, 300),
            view,
            &settings(10.0, end),
            Some(score()),
        )
        .unwrap();
        let mut frames = Vec::new();
        driver
            .run(&mut |_: &FrameInfo, surface: &RecordingSurface| {
                frames.push(surface.commands().to_vec());
                Ok(())
            })
            .unwrap();
        frames
    }

    #[test]
    fn test_export_matches_live_view() {
        let config = EngineConfig {
            preferred_unit: 50.0,
            ..Default::default()
        };
        let mut live =
            InteractiveDriver::new(config, Some(RecordingSurface::new(300, 300))).unwrap();
        live.load_score(Some(score()));

        let exported = collect_export(&live.view_settings(), 1.0);
        assert_eq!(exported.len(), 10);

        for (k, frame) in exported.iter().enumerate() {
            assert!(live.update(k as f64 / 10.0));
            assert_eq!(live.surface().unwrap().commands(), frame.as_slice());
        }
    }

    #[test]
    fn test_export_matches_live_fallback_animation() {
        let config = EngineConfig {
            preferred_unit: 50.0,
            fallback_interval: 0.25,
            ..Default::default()
        };
        let mut live =
            InteractiveDriver::new(config, Some(RecordingSurface::new(300, 300))).unwrap();
        live.load_score(None);

        let view = live.view_settings();
        assert_eq!(view.fallback_interval, 0.25);
        let mut driver = ExportDriver::new(
            RecordingSurface::new(300, 300),
            &view,
            &settings(4.0, 1.0),
            None,
        )
        .unwrap();
        let mut exported = Vec::new();
        driver
            .run(&mut |_: &FrameInfo, surface: &RecordingSurface| {
                exported.push(surface.commands().to_vec());
                Ok(())
            })
            .unwrap();
        assert_eq!(exported.len(), 4);

        for (k, frame) in exported.iter().enumerate() {
            assert!(live.update(k as f64 / 4.0));
            assert_eq!(live.surface().unwrap().commands(), frame.as_slice());
        }
        // One step of the animation per frame: C, C#, D, D#
        assert_eq!(
            driver.engine().active().pitch_classes(),
            vec![crate::lattice::PitchClass::DSharp]
        );
    }

    #[test]
    fn test_export_on_worker_thread() {
        let view = view();
        let expected = collect_export(&view, 0.5);
        let handle = std::thread::spawn(move || collect_export(&view, 0.5));
        let frames = handle.join().unwrap();
        assert_eq!(frames, expected);
    }
}
