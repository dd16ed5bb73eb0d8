use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pointer action carried by a macro event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    PointerDown,
    PointerUp,
    PointerMove,
}

/// Raw pointer sample handed to the recorder by the platform layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerSample {
    pub kind: PointerKind,
    pub x: i32,
    pub y: i32,
}

impl PointerSample {
    pub fn down(x: i32, y: i32) -> Self {
        Self {
            kind: PointerKind::PointerDown,
            x,
            y,
        }
    }

    pub fn up(x: i32, y: i32) -> Self {
        Self {
            kind: PointerKind::PointerUp,
            x,
            y,
        }
    }

    pub fn moved(x: i32, y: i32) -> Self {
        Self {
            kind: PointerKind::PointerMove,
            x,
            y,
        }
    }
}

/// A recorded pointer event, timed relative to the start of recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroEvent {
    pub offset_ms: u64,
    pub x: i32,
    pub y: i32,
    pub kind: PointerKind,
}

impl MacroEvent {
    pub fn new(offset_ms: u64, kind: PointerKind, x: i32, y: i32) -> Self {
        Self {
            offset_ms,
            x,
            y,
            kind,
        }
    }
}

/// Ordered sequence of macro events (offsets never decrease)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<MacroEvent>", into = "Vec<MacroEvent>")]
pub struct MacroTimeline {
    events: Arc<Vec<MacroEvent>>,
}

impl MacroTimeline {
    /// Build a timeline, stably ordering the events by offset
    pub fn new(mut events: Vec<MacroEvent>) -> Self {
        events.sort_by_key(|event| event.offset_ms);
        Self {
            events: Arc::new(events),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[MacroEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Time between the first and the last event of one repetition
    pub fn span_ms(&self) -> u64 {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => last.offset_ms - first.offset_ms,
            _ => 0,
        }
    }
}

impl From<Vec<MacroEvent>> for MacroTimeline {
    fn from(events: Vec<MacroEvent>) -> Self {
        Self::new(events)
    }
}

impl From<MacroTimeline> for Vec<MacroEvent> {
    fn from(timeline: MacroTimeline) -> Self {
        timeline.events.as_ref().clone()
    }
}

/// Recorder/player state as seen by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroState {
    Idle,
    Recording,
    Playing,
}

impl MacroState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MacroState::Idle => "idle",
            MacroState::Recording => "recording",
            MacroState::Playing => "playing",
        }
    }
}

/// How a playback run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackOutcome {
    Completed {
        events_dispatched: usize,
        repetitions: u32,
    },
    Cancelled {
        events_dispatched: usize,
        repetitions_completed: u32,
    },
    Failed {
        events_dispatched: usize,
        error: String,
    },
}

impl PlaybackOutcome {
    pub fn events_dispatched(&self) -> usize {
        match self {
            PlaybackOutcome::Completed {
                events_dispatched, ..
            }
            | PlaybackOutcome::Cancelled {
                events_dispatched, ..
            }
            | PlaybackOutcome::Failed {
                events_dispatched, ..
            } => *events_dispatched,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, PlaybackOutcome::Failed { .. })
    }

    pub fn summary(&self) -> String {
        match self {
            PlaybackOutcome::Completed {
                events_dispatched,
                repetitions,
            } => format!(
                "completed: {} events over {} repetitions",
                events_dispatched, repetitions
            ),
            PlaybackOutcome::Cancelled {
                events_dispatched,
                repetitions_completed,
            } => format!(
                "cancelled after {} events ({} full repetitions)",
                events_dispatched, repetitions_completed
            ),
            PlaybackOutcome::Failed {
                events_dispatched,
                error,
            } => format!("failed after {} events: {}", events_dispatched, error),
        }
    }
}
