//! Shared lattice engine
//!
//! Owns one lattice (parameters + node list), one active pitch-class set and
//! a theme, and renders them through [`render_frame`]. Both the interactive
//! and the export driver wrap an engine of their own; nothing is shared
//! between instances except the immutable score.
//!
//! Listeners are called synchronously from inside the mutating call.

use std::sync::Arc;

use crate::active::{ActiveOrigin, ActivePitchSet, KeyDirection, FALLBACK_INTERVAL};
use crate::error::SurfaceError;
use crate::lattice::{self, AdjacencyIndex, LatticeParameters, LayoutKind, Node, PitchClass};
use crate::render::{node_radius, render_frame, RenderStats, Surface, Theme};
use crate::score::Score;

/// Who chose the current density
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensitySource {
    /// Derived from the viewport; later resizes may replace it
    Auto,
    /// Set by a zoom gesture; survives resizes
    User,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensitySetting {
    pub value: f64,
    pub source: DensitySource,
}

/// How `update` decides which pitch classes are lit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveSource {
    /// Whatever the last direct call (`set_active`, note events) left behind
    Direct,
    /// Recomputed from the score (or the fallback animation) at every update
    Timeline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Idle,
    Building,
    Rendering,
}

type ActiveListener = Box<dyn FnMut(&ActivePitchSet) + Send>;
type RebuildListener = Box<dyn FnMut(&LatticeParameters, &[Node]) + Send>;

pub struct LatticeEngine {
    params: LatticeParameters,
    density_source: DensitySource,
    nodes: Vec<Node>,
    active: ActivePitchSet,
    source: ActiveSource,
    score: Option<Arc<Score>>,
    fallback_interval: f64,
    theme: Theme,
    phase: EnginePhase,
    rebuilds: usize,
    active_listeners: Vec<ActiveListener>,
    rebuild_listeners: Vec<RebuildListener>,
}

impl LatticeEngine {
    /// Create an engine and build its first lattice
    pub fn new(params: LatticeParameters, theme: Theme) -> Self {
        let mut engine = Self {
            params,
            density_source: DensitySource::Auto,
            nodes: Vec::new(),
            active: ActivePitchSet::new(),
            source: ActiveSource::Direct,
            score: None,
            fallback_interval: FALLBACK_INTERVAL,
            theme,
            phase: EnginePhase::Idle,
            rebuilds: 0,
            active_listeners: Vec::new(),
            rebuild_listeners: Vec::new(),
        };
        engine.rebuild();
        engine
    }

    pub fn params(&self) -> &LatticeParameters {
        &self.params
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn unit(&self) -> f64 {
        self.params.unit()
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Number of lattice builds so far, including the initial one
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Regenerate the node list for new viewport / density / layout
    ///
    /// Does not change who owns the density; see [`set_density`](Self::set_density).
    pub fn rebuild_lattice(&mut self, width: f64, height: f64, density: f64, layout: LayoutKind) {
        self.params = LatticeParameters::new(width, height, density, layout);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.phase = EnginePhase::Building;
        self.nodes = lattice::build(&self.params);
        self.rebuilds += 1;
        log::debug!(
            "lattice rebuilt: {} nodes, unit {:.2}, {:?} {}x{}",
            self.nodes.len(),
            self.params.unit(),
            self.params.layout,
            self.params.width,
            self.params.height
        );
        for listener in &mut self.rebuild_listeners {
            listener(&self.params, &self.nodes);
        }
        self.phase = EnginePhase::Idle;
    }

    pub fn density(&self) -> DensitySetting {
        DensitySetting {
            value: self.params.density,
            source: self.density_source,
        }
    }

    /// Explicit zoom: takes ownership of density away from automatic sizing
    pub fn set_density(&mut self, density: f64) {
        self.density_source = DensitySource::User;
        if density != self.params.density {
            self.params.density = density;
            self.rebuild();
        }
    }

    /// Responsive density; ignored once the user has zoomed
    ///
    /// Returns whether the value was applied.
    pub fn apply_auto_density(&mut self, density: f64) -> bool {
        if self.density_source == DensitySource::User {
            return false;
        }
        if density != self.params.density {
            self.params.density = density;
            self.rebuild();
        }
        true
    }

    pub fn set_density_source(&mut self, source: DensitySource) {
        self.density_source = source;
    }

    pub fn active(&self) -> &ActivePitchSet {
        &self.active
    }

    pub fn active_source(&self) -> ActiveSource {
        self.source
    }

    /// Replace the active set directly and stop following the timeline
    pub fn set_active(&mut self, pitches: &[i32]) {
        self.source = ActiveSource::Direct;
        self.replace_active(ActivePitchSet::from_pitches(pitches));
    }

    pub fn clear_active(&mut self) {
        self.set_active(&[]);
    }

    /// Note-on / note-off from an external playback engine
    pub fn handle_note_event(&mut self, pitch: i32, direction: KeyDirection) {
        self.source = ActiveSource::Direct;
        let mut next = self.active;
        next.handle_event(pitch, direction);
        self.replace_active(next);
    }

    /// Light the node under `(x, y)` alone, as a click-to-play gesture does
    pub fn trigger_at(&mut self, x: f64, y: f64) -> Option<PitchClass> {
        let pc = self.node_at(x, y)?.pitch_class;
        self.set_active(&[pc.semitone() as i32]);
        Some(pc)
    }

    /// Follow `score` (or the fallback animation when `None`) on every update
    pub fn follow_timeline(&mut self, score: Option<Arc<Score>>) {
        self.score = score;
        self.source = ActiveSource::Timeline;
    }

    pub fn score(&self) -> Option<&Score> {
        self.score.as_deref()
    }

    pub fn fallback_interval(&self) -> f64 {
        self.fallback_interval
    }

    pub fn set_fallback_interval(&mut self, seconds: f64) {
        self.fallback_interval = seconds;
    }

    fn replace_active(&mut self, next: ActivePitchSet) {
        if next == self.active {
            return;
        }
        self.active = next;
        for listener in &mut self.active_listeners {
            listener(&self.active);
        }
    }

    /// Bring the active set to `time` and draw one frame onto `surface`
    ///
    /// # Arguments
    /// * `time` - Playback position in seconds; only read when following a timeline
    /// * `active_override` - Pitches to light for this frame only. The stored
    ///   active set is left untouched and no listener fires.
    /// * `surface` - Target for the frame
    ///
    /// # Returns
    /// Counts of what was drawn, or the first error the surface reported.
    /// A degenerate lattice (zero unit) draws nothing and returns empty stats.
    pub fn update(
        &mut self,
        time: f64,
        active_override: Option<&[i32]>,
        surface: &mut dyn Surface,
    ) -> Result<RenderStats, SurfaceError> {
        if active_override.is_none() && self.source == ActiveSource::Timeline {
            let mut next = ActivePitchSet::new();
            let origin = next.update_at(self.score.as_deref(), time, self.fallback_interval);
            if origin == ActiveOrigin::Fallback {
                log::trace!("no score loaded, fallback animation at t={time:.3}");
            }
            self.replace_active(next);
        }
        let override_set = active_override.map(ActivePitchSet::from_pitches);
        let active = override_set.as_ref().unwrap_or(&self.active);

        self.phase = EnginePhase::Rendering;
        let result = render_frame(
            surface,
            &self.nodes,
            self.params.unit(),
            active,
            &self.theme,
        );
        self.phase = EnginePhase::Idle;
        result
    }

    /// Node drawn under `(x, y)`, if the point falls inside a node circle
    pub fn node_at(&self, x: f64, y: f64) -> Option<&Node> {
        let radius = node_radius(self.unit());
        lattice::nearest_node(&self.nodes, x, y, radius).map(|i| &self.nodes[i])
    }

    /// Neighbour lists for the current lattice
    pub fn adjacency(&self) -> AdjacencyIndex {
        AdjacencyIndex::new(&self.nodes, self.unit())
    }

    pub fn on_active_change(&mut self, listener: impl FnMut(&ActivePitchSet) + Send + 'static) {
        self.active_listeners.push(Box::new(listener));
    }

    pub fn on_lattice_rebuilt(
        &mut self,
        listener: impl FnMut(&LatticeParameters, &[Node]) + Send + 'static,
    ) {
        self.rebuild_listeners.push(Box::new(listener));
    }
}
