use super::injector::InputInjector;
use super::types::{MacroTimeline, PlaybackOutcome};
use crate::error::MacroError;
use crate::events::{EventBus, VisrecEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

struct ActivePlayback {
    run_id: Uuid,
    token: CancellationToken,
}

/// Replays timelines on a background task
pub struct MacroPlayer {
    injector: Arc<dyn InputInjector>,
    active: Arc<Mutex<Option<ActivePlayback>>>,
    event_bus: Option<Arc<EventBus>>,
    runtime: Option<Handle>,
}

/// Handle to a running playback; resolves once the run ends
pub struct PlaybackHandle {
    run_id: Uuid,
    receiver: oneshot::Receiver<PlaybackOutcome>,
}

impl PlaybackHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Wait for the playback to finish
    pub async fn wait(self) -> PlaybackOutcome {
        self.receiver
            .await
            .unwrap_or_else(|_| PlaybackOutcome::Failed {
                events_dispatched: 0,
                error: "playback task ended unexpectedly".to_string(),
            })
    }
}

impl MacroPlayer {
    pub fn new(injector: Arc<dyn InputInjector>) -> Self {
        Self {
            injector,
            active: Arc::new(Mutex::new(None)),
            event_bus: None,
            runtime: None,
        }
    }

    /// Spawn replays on this runtime, so `play` also works from threads
    /// outside it (a UI thread)
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Publish `PlaybackFinished` on this bus when a run ends
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Start replaying `timeline` `repeat_count` times.
    ///
    /// Without a runtime from [`MacroPlayer::with_runtime`] the caller must
    /// be inside a tokio runtime, otherwise `RuntimeUnavailable` is returned
    /// and nothing changes. The returned handle resolves with the outcome;
    /// the player is back to idle by then.
    pub fn play(
        &self,
        timeline: MacroTimeline,
        repeat_count: u32,
        max_repeat_count: u32,
    ) -> Result<PlaybackHandle, MacroError> {
        if repeat_count == 0 || repeat_count > max_repeat_count {
            return Err(MacroError::InvalidRepeatCount {
                count: repeat_count,
                max: max_repeat_count,
            });
        }

        if timeline.is_empty() {
            return Err(MacroError::EmptyTimeline);
        }

        let runtime = match &self.runtime {
            Some(runtime) => runtime.clone(),
            None => Handle::try_current().map_err(|e| MacroError::RuntimeUnavailable {
                details: e.to_string(),
            })?,
        };

        let run_id = Uuid::new_v4();
        let token = CancellationToken::new();
        {
            let mut active = self.active.lock();
            if active.is_some() {
                return Err(MacroError::Busy { state: "playing" });
            }
            *active = Some(ActivePlayback {
                run_id,
                token: token.clone(),
            });
        }

        info!(
            "Playback {} started: {} events x{}",
            run_id,
            timeline.len(),
            repeat_count
        );

        let (sender, receiver) = oneshot::channel();
        let injector = Arc::clone(&self.injector);
        let active = Arc::clone(&self.active);
        let event_bus = self.event_bus.clone();

        runtime.spawn(async move {
            let outcome = run_playback(injector.as_ref(), &timeline, repeat_count, &token).await;

            {
                let mut active = active.lock();
                if active.as_ref().is_some_and(|run| run.run_id == run_id) {
                    *active = None;
                }
            }

            debug!("Playback {} {}", run_id, outcome.summary());
            if let Some(event_bus) = event_bus {
                let _ = event_bus.publish(VisrecEvent::PlaybackFinished {
                    run_id,
                    outcome: outcome.clone(),
                });
            }
            let _ = sender.send(outcome);
        });

        Ok(PlaybackHandle { run_id, receiver })
    }

    /// Stop the running playback. The player is idle when this returns;
    /// the task stops at the next event boundary.
    pub fn cancel(&self) -> bool {
        match self.active.lock().take() {
            Some(run) => {
                info!("Playback {} cancelled", run.run_id);
                run.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active.lock().is_some()
    }
}

/// Replay loop. Each event is due at `repetition start + (offset - first
/// offset)`; deadlines come from the monotonic clock so waits never
/// accumulate drift.
async fn run_playback(
    injector: &dyn InputInjector,
    timeline: &MacroTimeline,
    repeat_count: u32,
    token: &CancellationToken,
) -> PlaybackOutcome {
    let events = timeline.events();
    let base_offset = events.first().map(|event| event.offset_ms).unwrap_or(0);
    let mut dispatched = 0;

    for repetition in 0..repeat_count {
        let started = Instant::now();

        for event in events {
            let deadline = started + Duration::from_millis(event.offset_ms - base_offset);

            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    return PlaybackOutcome::Cancelled {
                        events_dispatched: dispatched,
                        repetitions_completed: repetition,
                    };
                }
                _ = sleep_until(deadline) => {}
            }

            if let Err(e) = injector.dispatch(event).await {
                warn!("Input injection failed: {}", e);
                return PlaybackOutcome::Failed {
                    events_dispatched: dispatched,
                    error: e.to_string(),
                };
            }
            dispatched += 1;
            trace!("Dispatched {:?} (repetition {})", event, repetition + 1);
        }

        debug!("Repetition {}/{} complete", repetition + 1, repeat_count);
    }

    PlaybackOutcome::Completed {
        events_dispatched: dispatched,
        repetitions: repeat_count,
    }
}
