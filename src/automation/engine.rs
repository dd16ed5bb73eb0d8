use super::injector::InputInjector;
use super::player::{MacroPlayer, PlaybackHandle};
use super::recorder::MacroRecorder;
use super::types::{MacroEvent, MacroState, MacroTimeline, PointerSample};
use crate::clock::Clock;
use crate::config::MacroConfig;
use crate::error::MacroError;
use crate::events::EventBus;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info};

/// Owns the recorder, the player and the stored timeline, and keeps
/// recording and playback mutually exclusive
pub struct MacroEngine {
    recorder: MacroRecorder,
    player: MacroPlayer,
    timeline: MacroTimeline,
    pointer: Option<(i32, i32)>,
    max_repeat_count: u32,
}

impl MacroEngine {
    pub fn new(
        config: &MacroConfig,
        clock: Arc<dyn Clock>,
        injector: Arc<dyn InputInjector>,
    ) -> Self {
        Self {
            recorder: MacroRecorder::new(clock, config.min_move_interval_ms),
            player: MacroPlayer::new(injector),
            timeline: MacroTimeline::empty(),
            pointer: None,
            max_repeat_count: config.max_repeat_count,
        }
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.player = self.player.with_event_bus(event_bus);
        self
    }

    /// Runtime that replays are spawned on
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.player = self.player.with_runtime(runtime);
        self
    }

    pub fn state(&self) -> MacroState {
        if self.recorder.is_recording() {
            MacroState::Recording
        } else if self.player.is_playing() {
            MacroState::Playing
        } else {
            MacroState::Idle
        }
    }

    /// Start recording. The stored timeline is only replaced once recording
    /// stops.
    pub fn start_recording(&mut self) -> Result<(), MacroError> {
        if self.player.is_playing() {
            return Err(MacroError::Busy { state: "playing" });
        }

        self.recorder.start();
        Ok(())
    }

    /// Record a pointer sample; coalesced moves return `Ok(None)`
    pub fn record_event(&mut self, sample: PointerSample) -> Result<Option<MacroEvent>, MacroError> {
        let recorded = self.recorder.record(sample)?;
        self.pointer = Some((sample.x, sample.y));
        Ok(recorded)
    }

    /// Stop recording and make the recording the stored timeline
    pub fn stop_recording(&mut self) -> Result<MacroTimeline, MacroError> {
        let timeline = self.recorder.stop()?;
        self.timeline = timeline.clone();
        Ok(timeline)
    }

    /// Abandon the running recording, keeping the stored timeline
    pub fn cancel_recording(&mut self) -> bool {
        self.recorder.cancel()
    }

    /// Replay the stored timeline `repeat_count` times
    pub fn play(&self, repeat_count: u32) -> Result<PlaybackHandle, MacroError> {
        if self.recorder.is_recording() {
            return Err(MacroError::Busy { state: "recording" });
        }

        self.player
            .play(self.timeline.clone(), repeat_count, self.max_repeat_count)
    }

    pub fn cancel_playback(&self) -> bool {
        self.player.cancel()
    }

    /// Discard the stored timeline
    pub fn clear(&mut self) -> Result<(), MacroError> {
        match self.state() {
            MacroState::Idle => {
                self.timeline = MacroTimeline::empty();
                info!("Macro timeline cleared");
                Ok(())
            }
            busy => Err(MacroError::Busy {
                state: busy.as_str(),
            }),
        }
    }

    pub fn timeline(&self) -> &MacroTimeline {
        &self.timeline
    }

    /// Replace the stored timeline with a previously saved one
    pub fn restore_timeline(&mut self, timeline: MacroTimeline) -> Result<(), MacroError> {
        match self.state() {
            MacroState::Idle => {
                debug!("Restored macro timeline with {} events", timeline.len());
                self.timeline = timeline;
                Ok(())
            }
            busy => Err(MacroError::Busy {
                state: busy.as_str(),
            }),
        }
    }

    /// Update the coordinates readout without recording anything
    pub fn track_pointer(&mut self, x: i32, y: i32) {
        self.pointer = Some((x, y));
    }

    pub fn pointer(&self) -> Option<(i32, i32)> {
        self.pointer
    }

    pub fn max_repeat_count(&self) -> u32 {
        self.max_repeat_count
    }
}
