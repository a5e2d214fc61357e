//! Live view driver
//!
//! Wraps a [`LatticeEngine`] bound to the visible surface. `update` is called
//! by whatever clock the host's player provides. View changes (resize, zoom,
//! layout, theme) arrive in bursts, so they are queued and applied once the
//! burst has been quiet for the debounce window; `immediate` skips the wait
//! for gestures that must feel instant.
//!
//! Time is passed in as `Instant`s rather than read from the system clock,
//! which keeps the coalescing deterministic under test.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::active::KeyDirection;
use crate::config::EngineConfig;
use crate::error::{ConfigError, SurfaceError};
use crate::lattice::{LatticeParameters, LayoutKind, PitchClass};
use crate::render::{RenderStats, Surface, Theme};
use crate::score::Score;

use super::engine::{DensitySetting, DensitySource, LatticeEngine};

/// Read-only snapshot of the live view, handed to an export driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSettings {
    pub density: DensitySetting,
    pub layout: LayoutKind,
    pub theme: Theme,
    /// Seconds per step of the no-score animation
    pub fallback_interval: f64,
}

#[derive(Debug, Default)]
struct PendingChange {
    size: Option<(f64, f64)>,
    density: Option<f64>,
    layout: Option<LayoutKind>,
    theme: Option<Theme>,
    requested_at: Option<Instant>,
}

pub struct InteractiveDriver<S: Surface> {
    engine: LatticeEngine,
    surface: Option<S>,
    config: EngineConfig,
    debounce: Duration,
    pending: Option<PendingChange>,
    pending_surface: Option<S>,
    last_time: f64,
    frames_drawn: usize,
    frames_skipped: usize,
}

impl<S: Surface> InteractiveDriver<S> {
    /// Create a driver sized to `surface` (or to nothing, if no surface yet)
    pub fn new(config: EngineConfig, surface: Option<S>) -> Result<Self, ConfigError> {
        let theme = config.theme.resolve()?;
        let (width, height) = surface
            .as_ref()
            .map(|s| {
                let (w, h) = s.size();
                (w as f64, h as f64)
            })
            .unwrap_or((0.0, 0.0));
        let density = config.auto_density(width, height);
        let mut engine = LatticeEngine::new(
            LatticeParameters::new(width, height, density, config.layout),
            theme,
        );
        engine.set_fallback_interval(config.fallback_interval);

        Ok(Self {
            engine,
            surface,
            debounce: Duration::from_millis(config.debounce_ms),
            config,
            pending: None,
            pending_surface: None,
            last_time: 0.0,
            frames_drawn: 0,
            frames_skipped: 0,
        })
    }

    pub fn engine(&self) -> &LatticeEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut LatticeEngine {
        &mut self.engine
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Attach a new live surface, returning the old one
    pub fn attach_surface(&mut self, surface: S) -> Option<S> {
        self.surface.replace(surface)
    }

    pub fn detach_surface(&mut self) -> Option<S> {
        self.surface.take()
    }

    pub fn frames_drawn(&self) -> usize {
        self.frames_drawn
    }

    pub fn frames_skipped(&self) -> usize {
        self.frames_skipped
    }

    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings {
            density: self.engine.density(),
            layout: self.engine.params().layout,
            theme: *self.engine.theme(),
            fallback_interval: self.engine.fallback_interval(),
        }
    }

    pub fn density(&self) -> DensitySetting {
        self.engine.density()
    }

    /// Follow a score from now on (fallback animation when `None`)
    pub fn load_score(&mut self, score: Option<Arc<Score>>) {
        self.engine.follow_timeline(score);
    }

    pub fn set_active(&mut self, pitches: &[i32]) {
        self.engine.set_active(pitches);
    }

    pub fn handle_note_event(&mut self, pitch: i32, direction: KeyDirection) {
        self.engine.handle_note_event(pitch, direction);
    }

    /// Resize the lattice to `width` x `height`
    ///
    /// Only the lattice follows the new size. The attached surface keeps its
    /// own pixel size, so a host whose backing surface is recreated on resize
    /// should use [`request_surface_resize`](Self::request_surface_resize).
    pub fn request_resize(&mut self, width: f64, height: f64, now: Instant) {
        self.queue(now, false, |p| p.size = Some((width, height)));
    }

    /// Resize to a replacement surface
    ///
    /// The surface is swapped in together with the lattice rebuild, so the
    /// background and the nodes always agree on the frame size.
    pub fn request_surface_resize(&mut self, surface: S, now: Instant) {
        let (width, height) = surface.size();
        self.pending_surface = Some(surface);
        self.queue(now, false, |p| p.size = Some((width as f64, height as f64)));
    }

    /// Zoom gesture: an explicit, user-owned density
    pub fn request_zoom(&mut self, density: f64, now: Instant, immediate: bool) {
        self.queue(now, immediate, |p| p.density = Some(density));
    }

    pub fn request_layout(&mut self, layout: LayoutKind, now: Instant) {
        self.queue(now, false, |p| p.layout = Some(layout));
    }

    pub fn request_theme(&mut self, theme: Theme, now: Instant) {
        self.queue(now, false, |p| p.theme = Some(theme));
    }

    /// Hand density back to automatic sizing; takes effect on the next resize
    pub fn reset_zoom(&mut self) {
        self.engine.set_density_source(DensitySource::Auto);
    }

    fn queue(&mut self, now: Instant, immediate: bool, change: impl FnOnce(&mut PendingChange)) {
        let pending = self.pending.get_or_insert_with(PendingChange::default);
        change(pending);
        pending.requested_at = Some(now);
        if immediate {
            self.flush();
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Apply queued view changes once the debounce window has passed
    ///
    /// Returns whether a frame was redrawn.
    pub fn poll(&mut self, now: Instant) -> bool {
        let due = match &self.pending {
            Some(PendingChange {
                requested_at: Some(at),
                ..
            }) => now.duration_since(*at) >= self.debounce,
            Some(_) => true,
            None => false,
        };
        if due {
            self.flush()
        } else {
            false
        }
    }

    /// Apply queued view changes right away and redraw
    pub fn flush(&mut self) -> bool {
        let Some(change) = self.pending.take() else {
            return false;
        };
        if let Some(surface) = self.pending_surface.take() {
            self.surface = Some(surface);
        }

        if let Some(theme) = change.theme {
            self.engine.set_theme(theme);
        }

        let geometry_changed =
            change.size.is_some() || change.density.is_some() || change.layout.is_some();
        if geometry_changed {
            let current = *self.engine.params();
            let (width, height) = change.size.unwrap_or((current.width, current.height));
            let layout = change.layout.unwrap_or(current.layout);
            let density = match change.density {
                Some(density) => {
                    self.engine.set_density_source(DensitySource::User);
                    density
                }
                None if self.engine.density().source == DensitySource::Auto => {
                    self.config.auto_density(width, height)
                }
                None => current.density,
            };
            self.engine.rebuild_lattice(width, height, density, layout);
        }

        self.update(self.last_time)
    }

    /// Draw the frame for `time`
    ///
    /// Returns `false` (frame skipped) when there is no surface or the
    /// surface rejects a draw; the next call simply tries again.
    pub fn update(&mut self, time: f64) -> bool {
        self.update_with(time, None).is_some()
    }

    /// [`update`](Self::update) with an explicit active set for this frame
    pub fn update_with(&mut self, time: f64, active_override: Option<&[i32]>) -> Option<RenderStats> {
        self.last_time = time;
        let result = match self.surface.as_mut() {
            Some(surface) => self.engine.update(time, active_override, surface),
            None => Err(SurfaceError::Unavailable),
        };
        match result {
            Ok(stats) => {
                self.frames_drawn += 1;
                Some(stats)
            }
            Err(err) => {
                self.frames_skipped += 1;
                log::warn!("skipping live frame at t={time:.3}: {err}");
                None
            }
        }
    }

    /// Click-to-play: light the node under the pointer and redraw at once,
    /// applying any queued view change first so the hit test sees the
    /// current layout
    pub fn click(&mut self, x: f64, y: f64) -> Option<PitchClass> {
        if self.pending.is_some() {
            self.flush();
        }
        let pc = self.engine.trigger_at(x, y)?;
        self.update(self.last_time);
        Some(pc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCommand, RecordingSurface};

    fn driver(width: u32, height: u32) -> InteractiveDriver<RecordingSurface> {
        let config = EngineConfig {
            preferred_unit: 50.0,
            ..Default::default()
        };
        InteractiveDriver::new(config, Some(RecordingSurface::new(width, height))).unwrap()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_initial_lattice_uses_auto_density() {
        let driver = driver(300, 300);
        assert_eq!(
            driver.density(),
            DensitySetting {
                value: 12.0,
                source: DensitySource::Auto
            }
        );
        assert_eq!(driver.engine().unit(), 50.0);
    }

    #[test]
    fn test_resize_burst_coalesces() {
        let mut driver = driver(300, 300);
        let t0 = Instant::now();

        driver.request_resize(400.0, 300.0, t0);
        driver.request_resize(500.0, 300.0, t0 + ms(10));
        driver.request_resize(600.0, 400.0, t0 + ms(20));

        assert!(!driver.poll(t0 + ms(25)));
        assert_eq!(driver.engine().rebuild_count(), 1);

        assert!(driver.poll(t0 + ms(55)));
        assert_eq!(driver.engine().rebuild_count(), 2);
        assert_eq!(driver.engine().params().width, 600.0);
        assert_eq!(driver.density().value, 20.0);
        assert!(!driver.has_pending());

        // Nothing left to apply
        assert!(!driver.poll(t0 + ms(200)));
        assert_eq!(driver.engine().rebuild_count(), 2);
    }

    #[test]
    fn test_surface_resize_swaps_surface_with_lattice() {
        let mut driver = driver(300, 300);
        let t0 = Instant::now();
        driver.request_surface_resize(RecordingSurface::new(500, 400), t0);

        assert!(!driver.poll(t0 + ms(10)));
        assert_eq!(driver.surface().unwrap().size(), (300, 300));

        assert!(driver.poll(t0 + ms(40)));
        assert_eq!(driver.surface().unwrap().size(), (500, 400));
        assert_eq!(driver.engine().params().width, 500.0);
        assert_eq!(driver.engine().params().height, 400.0);
        let background = driver
            .surface()
            .unwrap()
            .commands()
            .iter()
            .find_map(|c| match c {
                DrawCommand::FillRect { width, height, .. } => Some((*width, *height)),
                _ => None,
            });
        assert_eq!(background, Some((500.0, 400.0)));
    }

    #[test]
    fn test_immediate_zoom_bypasses_debounce() {
        let mut driver = driver(300, 300);
        let t0 = Instant::now();
        driver.request_zoom(24.0, t0, true);
        assert!(!driver.has_pending());
        assert_eq!(
            driver.density(),
            DensitySetting {
                value: 24.0,
                source: DensitySource::User
            }
        );
        assert_eq!(driver.frames_drawn(), 1);
    }

    #[test]
    fn test_user_zoom_survives_resize() {
        let mut driver = driver(300, 300);
        let t0 = Instant::now();
        driver.request_zoom(24.0, t0, true);
        driver.request_resize(800.0, 600.0, t0 + ms(5));
        driver.poll(t0 + ms(100));
        assert_eq!(driver.density().value, 24.0);
        assert_eq!(driver.engine().params().width, 800.0);

        driver.reset_zoom();
        driver.request_resize(800.0, 700.0, t0 + ms(200));
        driver.poll(t0 + ms(300));
        assert_eq!(driver.density().value, 30.0);
        assert_eq!(driver.density().source, DensitySource::Auto);
    }

    #[test]
    fn test_theme_change_redraws_without_rebuild() {
        let mut driver = driver(300, 300);
        let t0 = Instant::now();
        driver.request_theme(Theme::dark(), t0);
        assert!(driver.poll(t0 + ms(30)));
        assert_eq!(driver.engine().rebuild_count(), 1);
        let surface = driver.surface().unwrap();
        assert_eq!(
            surface.commands().first(),
            Some(&DrawCommand::Clear(Theme::dark().background))
        );
    }

    #[test]
    fn test_missing_surface_skips_frame() {
        let mut driver: InteractiveDriver<RecordingSurface> =
            InteractiveDriver::new(EngineConfig::default(), None).unwrap();
        assert!(!driver.update(0.0));
        assert_eq!(driver.frames_skipped(), 1);

        driver.attach_surface(RecordingSurface::new(200, 200));
        driver.request_resize(200.0, 200.0, Instant::now());
        assert!(driver.flush());
        assert!(driver.update(0.1));
        assert_eq!(driver.frames_drawn(), 2);
    }

    #[test]
    fn test_click_lights_node_immediately() {
        let mut driver = driver(300, 300);
        driver.request_layout(LayoutKind::Columns, Instant::now());
        assert_eq!(driver.click(150.0, 150.0), Some(PitchClass::C));
        assert_eq!(driver.engine().params().layout, LayoutKind::Columns);
        assert!(!driver.has_pending());
        assert_eq!(
            driver.engine().active().pitch_classes(),
            vec![PitchClass::C]
        );
        assert_eq!(driver.frames_drawn(), 2);
    }

    #[test]
    fn test_playback_note_events_drive_view() {
        let mut driver = driver(300, 300);
        driver.handle_note_event(60, KeyDirection::Down);
        driver.handle_note_event(63, KeyDirection::Down);
        driver.handle_note_event(64, KeyDirection::Down);
        let stats = driver.update_with(0.0, None).unwrap();
        assert!(stats.triangles > 0);

        driver.handle_note_event(64, KeyDirection::Up);
        let stats = driver.update_with(0.1, None).unwrap();
        assert_eq!(stats.triangles, 0);
    }

    #[test]
    fn test_view_settings_snapshot() {
        let mut driver = driver(300, 300);
        driver.request_zoom(18.0, Instant::now(), true);
        let view = driver.view_settings();
        assert_eq!(view.density.value, 18.0);
        assert_eq!(view.layout, LayoutKind::Rows);
        assert_eq!(view.theme, Theme::light());
        assert_eq!(view.fallback_interval, 0.5);
    }
}
