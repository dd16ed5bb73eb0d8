use super::types::{MacroEvent, MacroTimeline, PointerKind, PointerSample};
use crate::clock::Clock;
use crate::error::MacroError;
use std::sync::Arc;
use tracing::{debug, info, trace};

enum RecorderState {
    Idle,
    Recording {
        started_at_ms: u64,
        buffer: Vec<MacroEvent>,
        last_move_ms: Option<u64>,
    },
}

/// Collects timestamped pointer events while recording
pub struct MacroRecorder {
    clock: Arc<dyn Clock>,
    state: RecorderState,
    min_move_interval_ms: u64,
}

impl MacroRecorder {
    pub fn new(clock: Arc<dyn Clock>, min_move_interval_ms: u64) -> Self {
        Self {
            clock,
            state: RecorderState::Idle,
            min_move_interval_ms,
        }
    }

    /// Begin a fresh buffer. Restarting while already recording drops the
    /// unfinished buffer; returns `true` in that case.
    pub fn start(&mut self) -> bool {
        let restarted = self.is_recording();
        if restarted {
            debug!("Recording restarted, unfinished buffer discarded");
        }

        self.state = RecorderState::Recording {
            started_at_ms: self.clock.now_ms(),
            buffer: Vec::new(),
            last_move_ms: None,
        };
        info!("Macro recording started");
        restarted
    }

    /// Append a pointer sample. Moves arriving faster than the configured
    /// interval are coalesced and yield `Ok(None)`.
    pub fn record(&mut self, sample: PointerSample) -> Result<Option<MacroEvent>, MacroError> {
        let now = self.clock.now_ms();
        let RecorderState::Recording {
            started_at_ms,
            buffer,
            last_move_ms,
        } = &mut self.state
        else {
            return Err(MacroError::NotRecording);
        };

        let previous = buffer.last().map(|event| event.offset_ms).unwrap_or(0);
        let offset_ms = now.saturating_sub(*started_at_ms).max(previous);

        if sample.kind == PointerKind::PointerMove {
            if let Some(last) = *last_move_ms {
                if offset_ms - last < self.min_move_interval_ms {
                    trace!("Coalesced pointer move at ({}, {})", sample.x, sample.y);
                    return Ok(None);
                }
            }
            *last_move_ms = Some(offset_ms);
        }

        let event = MacroEvent::new(offset_ms, sample.kind, sample.x, sample.y);
        buffer.push(event);
        trace!("Recorded {:?}", event);
        Ok(Some(event))
    }

    /// Finish recording and hand back the timeline
    pub fn stop(&mut self) -> Result<MacroTimeline, MacroError> {
        match std::mem::replace(&mut self.state, RecorderState::Idle) {
            RecorderState::Recording { buffer, .. } => {
                let timeline = MacroTimeline::new(buffer);
                info!(
                    "Macro recording stopped: {} events over {} ms",
                    timeline.len(),
                    timeline.span_ms()
                );
                Ok(timeline)
            }
            RecorderState::Idle => Err(MacroError::NotRecording),
        }
    }

    /// Abandon the current buffer; returns whether anything was recording
    pub fn cancel(&mut self) -> bool {
        let was_recording = self.is_recording();
        self.state = RecorderState::Idle;
        if was_recording {
            info!("Macro recording cancelled");
        }
        was_recording
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    /// Number of events buffered by the running recording
    pub fn buffered(&self) -> usize {
        match &self.state {
            RecorderState::Recording { buffer, .. } => buffer.len(),
            RecorderState::Idle => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn recorder(min_move_interval_ms: u64) -> (MacroRecorder, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        (
            MacroRecorder::new(clock.clone(), min_move_interval_ms),
            clock,
        )
    }

    #[test]
    fn test_offsets_are_relative_to_start() {
        let (mut recorder, clock) = recorder(0);
        recorder.start();

        recorder.record(PointerSample::down(5, 5)).unwrap();
        clock.advance(100);
        recorder.record(PointerSample::moved(6, 7)).unwrap();
        clock.advance(150);
        recorder.record(PointerSample::up(6, 7)).unwrap();

        let timeline = recorder.stop().unwrap();
        let offsets: Vec<u64> = timeline.events().iter().map(|e| e.offset_ms).collect();
        assert_eq!(offsets, vec![0, 100, 250]);
        assert_eq!(timeline.events()[1].kind, PointerKind::PointerMove);
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_offsets_never_decrease_when_clock_steps_back() {
        let (mut recorder, clock) = recorder(10);
        recorder.start();

        recorder.record(PointerSample::down(0, 0)).unwrap();
        clock.set(1_300);
        recorder.record(PointerSample::moved(1, 1)).unwrap();
        clock.set(1_100);
        recorder.record(PointerSample::up(1, 1)).unwrap();
        clock.set(900);
        assert!(recorder.record(PointerSample::moved(2, 2)).unwrap().is_none());
        recorder.record(PointerSample::down(2, 2)).unwrap();

        let timeline = recorder.stop().unwrap();
        let offsets: Vec<u64> = timeline.events().iter().map(|e| e.offset_ms).collect();
        assert_eq!(offsets, vec![0, 300, 300, 300]);
    }

    #[test]
    fn test_record_outside_recording_fails() {
        let (mut recorder, _) = recorder(0);
        assert_eq!(
            recorder.record(PointerSample::down(0, 0)),
            Err(MacroError::NotRecording)
        );
        assert_eq!(recorder.stop(), Err(MacroError::NotRecording));
    }

    #[test]
    fn test_restart_discards_unfinished_buffer() {
        let (mut recorder, _) = recorder(0);
        recorder.start();
        recorder.record(PointerSample::down(1, 1)).unwrap();

        assert!(recorder.start());
        assert_eq!(recorder.buffered(), 0);
        assert!(recorder.stop().unwrap().is_empty());
    }

    #[test]
    fn test_moves_are_coalesced() {
        let (mut recorder, clock) = recorder(50);
        recorder.start();

        assert!(recorder.record(PointerSample::moved(0, 0)).unwrap().is_some());
        clock.advance(20);
        assert!(recorder.record(PointerSample::moved(1, 0)).unwrap().is_none());
        assert!(recorder.record(PointerSample::down(1, 0)).unwrap().is_some());
        clock.advance(40);
        assert!(recorder.record(PointerSample::moved(2, 0)).unwrap().is_some());

        assert_eq!(recorder.stop().unwrap().len(), 3);
    }

    #[test]
    fn test_cancel() {
        let (mut recorder, _) = recorder(0);
        assert!(!recorder.cancel());

        recorder.start();
        recorder.record(PointerSample::down(1, 1)).unwrap();
        assert!(recorder.cancel());
        assert!(!recorder.is_recording());
    }
}
