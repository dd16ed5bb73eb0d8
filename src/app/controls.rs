use super::VisrecApp;
use crate::automation::{
    MacroEvent, MacroState, MacroTimeline, PlaybackHandle, PointerSample,
};
use crate::classify::{ClassificationResult, HistoryEntry, HistoryId, LearnOutcome};
use crate::error::Result;
use crate::events::VisrecEvent;
use std::time::SystemTime;
use tracing::{debug, info};

// Classification controls
impl VisrecApp {
    /// Grab a screen region, extract its features and append it to history
    pub async fn capture(&self) -> Result<HistoryId> {
        let region = self.capture_provider.capture_region().await?;
        let entry_id = self.classification.lock().capture(&region)?;

        self.emit(VisrecEvent::Captured {
            entry_id,
            width: region.width(),
            height: region.height(),
            timestamp: region.timestamp,
        });
        Ok(entry_id)
    }

    /// Learn the pending capture under `label`
    pub fn learn(&self, label: &str) -> Result<LearnOutcome> {
        let outcome = self.classification.lock().learn(label)?;

        self.emit(VisrecEvent::Learned {
            entry_id: outcome.entry_id,
            example_id: outcome.example_id,
            label: outcome.label.clone(),
        });
        Ok(outcome)
    }

    /// Classify the pending capture
    pub fn classify_current(&self) -> Result<ClassificationResult> {
        let (entry_id, result) = self.classification.lock().classify_current()?;

        self.emit(VisrecEvent::Classified {
            entry_id,
            result: result.clone(),
        });
        Ok(result)
    }

    /// Label submitted from the prompt box
    pub fn prompt(&self, label: &str) -> Result<LearnOutcome> {
        let outcome = self.classification.lock().prompt(label)?;

        self.emit(VisrecEvent::Learned {
            entry_id: outcome.entry_id,
            example_id: outcome.example_id,
            label: outcome.label.clone(),
        });
        Ok(outcome)
    }

    pub fn prev(&self) -> Option<HistoryEntry> {
        let (entry, position) = {
            let mut engine = self.classification.lock();
            let entry = engine.prev().cloned();
            (entry, engine.history().position())
        };
        self.emit_navigation(entry.as_ref(), position);
        entry
    }

    pub fn next(&self) -> Option<HistoryEntry> {
        let (entry, position) = {
            let mut engine = self.classification.lock();
            let entry = engine.next().cloned();
            (entry, engine.history().position())
        };
        self.emit_navigation(entry.as_ref(), position);
        entry
    }

    /// Delete the entry under the cursor. Returns `None` on an empty history.
    pub fn delete_current(&self) -> Option<HistoryId> {
        let (deleted, current, position) = {
            let mut engine = self.classification.lock();
            let deleted = engine.delete_current();
            let current = engine.current().cloned();
            (deleted, current, engine.history().position())
        };

        if let Some(entry_id) = deleted {
            self.emit(VisrecEvent::HistoryEntryDeleted { entry_id });
            self.emit_navigation(current.as_ref(), position);
        }
        deleted
    }

    pub fn clear_history(&self) -> usize {
        let removed = self.classification.lock().clear_history();
        self.emit(VisrecEvent::HistoryCleared { removed });
        removed
    }

    pub fn current_entry(&self) -> Option<HistoryEntry> {
        self.classification.lock().current().cloned()
    }

    /// 1-based cursor position and history length
    pub fn history_position(&self) -> Option<(usize, usize)> {
        self.classification.lock().history().position()
    }

    pub fn history_len(&self) -> usize {
        self.classification.lock().history().len()
    }

    pub fn example_count(&self) -> usize {
        self.classification.lock().examples().len()
    }

    /// Distinct labels learned so far
    pub fn labels(&self) -> Vec<String> {
        self.classification.lock().examples().labels()
    }

    fn emit_navigation(&self, entry: Option<&HistoryEntry>, position: Option<(usize, usize)>) {
        self.emit(VisrecEvent::HistoryNavigated {
            entry_id: entry.map(|entry| entry.id),
            position,
        });
    }
}

// Macro controls
impl VisrecApp {
    pub fn start_recording(&self) -> Result<()> {
        self.macros.lock().start_recording()?;
        self.emit(VisrecEvent::RecordingStarted {
            timestamp: SystemTime::now(),
        });
        Ok(())
    }

    /// Feed a pointer sample from the host into the running recording
    pub fn record_pointer(&self, sample: PointerSample) -> Result<Option<MacroEvent>> {
        let recorded = self.macros.lock().record_event(sample)?;
        self.emit(VisrecEvent::PointerMoved {
            x: sample.x,
            y: sample.y,
        });
        Ok(recorded)
    }

    pub fn stop_recording(&self) -> Result<MacroTimeline> {
        let timeline = self.macros.lock().stop_recording()?;
        self.emit(VisrecEvent::RecordingStopped {
            event_count: timeline.len(),
            duration_ms: timeline.span_ms(),
        });
        Ok(timeline)
    }

    pub fn cancel_recording(&self) -> bool {
        let cancelled = self.macros.lock().cancel_recording();
        if cancelled {
            self.emit(VisrecEvent::RecordingCancelled);
        }
        cancelled
    }

    /// Replay the stored timeline. `None` uses the configured default
    /// repeat count.
    pub fn play(&self, repeat_count: Option<u32>) -> Result<PlaybackHandle> {
        let repeat_count = repeat_count.unwrap_or(self.config.macros.default_repeat_count);
        let (handle, event_count) = {
            let engine = self.macros.lock();
            let handle = engine.play(repeat_count)?;
            (handle, engine.timeline().len())
        };

        self.emit(VisrecEvent::PlaybackStarted {
            run_id: handle.run_id(),
            repeat_count,
            event_count,
        });
        Ok(handle)
    }

    pub fn cancel_playback(&self) -> bool {
        self.macros.lock().cancel_playback()
    }

    pub fn clear_macro(&self) -> Result<()> {
        self.macros.lock().clear()?;
        self.emit(VisrecEvent::MacroCleared);
        Ok(())
    }

    /// Update the coordinates readout from a pointer move outside recording
    pub fn track_pointer(&self, x: i32, y: i32) {
        self.macros.lock().track_pointer(x, y);
        debug!("Pointer at ({}, {})", x, y);
        self.emit(VisrecEvent::PointerMoved { x, y });
    }

    pub fn pointer_coords(&self) -> Option<(i32, i32)> {
        self.macros.lock().pointer()
    }

    pub fn macro_state(&self) -> MacroState {
        self.macros.lock().state()
    }

    pub fn macro_timeline(&self) -> MacroTimeline {
        self.macros.lock().timeline().clone()
    }

    /// Stop whatever the macro engine is doing
    pub(super) fn halt_macros(&self) {
        let mut engine = self.macros.lock();
        if engine.cancel_playback() {
            info!("Playback cancelled for shutdown");
        }
        if engine.cancel_recording() {
            info!("Recording discarded for shutdown");
        }
    }
}
