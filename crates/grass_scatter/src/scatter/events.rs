//! Event types and sinks for observing scatter runs.
//!
//! This module defines [`ScatterEvent`] and a set of sinks to emit, collect, or forward
//! progress while [`crate::scatter::runner::ScatterRunner`] works through its tiles.
use crate::bounds::Bounds;
use crate::sampling::LevelStats;
use crate::scatter::runner::{RunSummary, ScatterConfig};
use crate::scatter::tiling::Tile;

/// Describes events emitted by scatter operations.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum ScatterEvent {
    /// Emitted once the request was validated and tiles were laid out.
    RunStarted {
        /// The configuration used.
        config: ScatterConfig,
        /// Requested bounds.
        bounds: Bounds,
        /// Number of tiles this run will process.
        tile_count: usize,
        /// Tiles in the full layout, including those of other parts.
        total_tiles: usize,
    },

    /// Emitted before a tile is sampled.
    TileStarted {
        /// Position of the tile within this run.
        index: usize,
        tile: Tile,
    },

    /// Emitted for each level of a level-synchronous tile.
    LevelCompleted {
        /// Position of the tile within this run.
        tile_index: usize,
        stats: LevelStats,
    },

    /// Emitted after a tile was sampled.
    TileFinished {
        /// Position of the tile within this run.
        index: usize,
        /// Samples accepted in this tile.
        accepted: usize,
        /// Darts thrown in this tile.
        darts: usize,
    },

    /// Emitted when a cancellation checkpoint fired.
    Cancelled {
        /// Tiles fully or partially processed before stopping.
        tiles_processed: usize,
        /// Samples kept.
        positions: usize,
    },

    /// Emitted when the run returns, completed or cancelled.
    RunFinished { summary: RunSummary },

    /// Non-fatal warning generated during scatter.
    Warning {
        /// Context string (e.g. tile coordinates).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

impl ScatterEvent {
    pub fn kind(&self) -> ScatterEventKind {
        match self {
            ScatterEvent::RunStarted { .. } => ScatterEventKind::RunStarted,
            ScatterEvent::TileStarted { .. } => ScatterEventKind::TileStarted,
            ScatterEvent::LevelCompleted { .. } => ScatterEventKind::LevelCompleted,
            ScatterEvent::TileFinished { .. } => ScatterEventKind::TileFinished,
            ScatterEvent::Cancelled { .. } => ScatterEventKind::Cancelled,
            ScatterEvent::RunFinished { .. } => ScatterEventKind::RunFinished,
            ScatterEvent::Warning { .. } => ScatterEventKind::Warning,
        }
    }
}

/// Discriminant of [`ScatterEvent`], used to skip building unwanted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScatterEventKind {
    RunStarted,
    TileStarted,
    LevelCompleted,
    TileFinished,
    Cancelled,
    RunFinished,
    Warning,
}

/// A generic event sink that accepts [`ScatterEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: ScatterEvent);

    /// Returns `false` if events of `kind` would be discarded anyway.
    fn wants(&self, _kind: ScatterEventKind) -> bool {
        true
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: ScatterEvent) {}

    #[inline]
    fn wants(&self, _kind: ScatterEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(ScatterEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(ScatterEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(ScatterEvent),
{
    #[inline]
    fn send(&mut self, event: ScatterEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects events in a `Vec`, optionally restricted to some kinds.
#[derive(Default)]
pub struct VecSink {
    events: Vec<ScatterEvent>,
    only: Option<Vec<ScatterEventKind>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            events: Vec::with_capacity(cap),
            only: None,
        }
    }

    /// Collects only events of the given kinds.
    pub fn only(kinds: impl IntoIterator<Item = ScatterEventKind>) -> Self {
        Self {
            events: Vec::new(),
            only: Some(kinds.into_iter().collect()),
        }
    }

    pub fn into_inner(self) -> Vec<ScatterEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[ScatterEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: ScatterEvent) {
        if self.wants(event.kind()) {
            self.events.push(event);
        }
    }

    fn wants(&self, kind: ScatterEventKind) -> bool {
        self.only.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: ScatterEvent) {
        if self.sinks.is_empty() {
            return;
        }
        let last_idx = self.sinks.len() - 1;
        for i in 0..last_idx {
            self.sinks[i].send(event.clone());
        }
        self.sinks[last_idx].send(event);
    }

    fn wants(&self, kind: ScatterEventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }
}

/// Borrows a value as a dynamic [`EventSink`].
pub trait AsEventSink {
    fn as_event_sink(&mut self) -> &mut dyn EventSink;
}

impl<S: EventSink> AsEventSink for S {
    fn as_event_sink(&mut self) -> &mut dyn EventSink {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(context: &str) -> ScatterEvent {
        ScatterEvent::Warning {
            context: context.into(),
            message: "msg".into(),
        }
    }

    #[test]
    fn vec_sink_collects_events() {
        let mut sink = VecSink::with_capacity(2);
        assert!(sink.is_empty());
        sink.send(warning("a"));
        sink.send(warning("b"));
        assert_eq!(sink.len(), 2);
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn vec_sink_filters_by_kind() {
        let mut sink = VecSink::only([ScatterEventKind::TileFinished]);
        assert!(!sink.wants(ScatterEventKind::Warning));
        sink.send(warning("ignored"));
        sink.send(ScatterEvent::TileFinished {
            index: 0,
            accepted: 3,
            darts: 40,
        });
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn as_event_sink_forwards_to_inner_sink() {
        let mut sink = VecSink::new();
        sink.as_event_sink().send(warning("ctx"));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn unit_sink_wants_nothing() {
        assert!(!().wants(ScatterEventKind::RunStarted));
    }

    #[test]
    fn multi_sink_fans_out_events() {
        let mut multi = MultiSink::with_sinks(vec![VecSink::new(), VecSink::new()]);
        multi.send(warning("ctx"));
        assert_eq!(multi.len(), 2);
        assert_eq!(multi.sinks[0].len(), 1);
        assert_eq!(multi.sinks[1].len(), 1);
        assert!(matches!(
            multi.sinks[0].as_slice()[0],
            ScatterEvent::Warning { .. }
        ));
    }

    #[test]
    fn fn_sink_invokes_callback() {
        let mut count = 0;
        let mut sink = FnSink::new(|_event| {
            count += 1;
        });
        sink.send(warning("ctx"));
        assert_eq!(count, 1);
    }
}
