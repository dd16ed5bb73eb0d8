use crate::automation::PlaybackOutcome;
use crate::classify::{ClassificationResult, ExampleId, HistoryId};
use crate::error::EventBusError;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Events published by the engines for the status line and log pane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VisrecEvent {
    /// A region was captured and appended to history
    Captured {
        entry_id: HistoryId,
        width: u32,
        height: u32,
        timestamp: SystemTime,
    },
    /// The pending capture was learned under a label
    Learned {
        entry_id: HistoryId,
        example_id: ExampleId,
        label: String,
    },
    /// The pending capture was classified
    Classified {
        entry_id: HistoryId,
        result: ClassificationResult,
    },
    /// The history cursor moved
    HistoryNavigated {
        entry_id: Option<HistoryId>,
        position: Option<(usize, usize)>,
    },
    /// A history entry was deleted
    HistoryEntryDeleted { entry_id: HistoryId },
    /// The history was cleared
    HistoryCleared { removed: usize },
    /// Macro recording started
    RecordingStarted { timestamp: SystemTime },
    /// Macro recording finished and replaced the stored timeline
    RecordingStopped { event_count: usize, duration_ms: u64 },
    /// Macro recording was abandoned
    RecordingCancelled,
    /// Playback of the stored timeline started
    PlaybackStarted {
        run_id: Uuid,
        repeat_count: u32,
        event_count: usize,
    },
    /// Playback ended
    PlaybackFinished {
        run_id: Uuid,
        outcome: PlaybackOutcome,
    },
    /// The stored macro timeline was cleared
    MacroCleared,
    /// Latest pointer coordinates changed
    PointerMoved { x: i32, y: i32 },
    /// State was restored from a snapshot
    SnapshotLoaded {
        example_count: usize,
        timeline_events: usize,
    },
    /// State was written to a snapshot
    SnapshotSaved {
        example_count: usize,
        timeline_events: usize,
    },
    /// A component reported an error
    SystemError { component: String, error: String },
    /// Shutdown requested
    ShutdownRequested {
        timestamp: SystemTime,
        reason: String,
    },
}

impl VisrecEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            VisrecEvent::Captured {
                entry_id,
                width,
                height,
                ..
            } => format!("Captured {}x{} region as entry {}", width, height, entry_id),
            VisrecEvent::Learned {
                entry_id, label, ..
            } => format!("Learned entry {} as '{}'", entry_id, label),
            VisrecEvent::Classified { entry_id, result } => format!(
                "Classified entry {} as '{}' ({:.1}%)",
                entry_id,
                result.label,
                result.confidence * 100.0
            ),
            VisrecEvent::HistoryNavigated { position, .. } => match position {
                Some((index, len)) => format!("History {} of {}", index, len),
                None => "History empty".to_string(),
            },
            VisrecEvent::HistoryEntryDeleted { entry_id } => {
                format!("Deleted history entry {}", entry_id)
            }
            VisrecEvent::HistoryCleared { removed } => {
                format!("Cleared {} history entries", removed)
            }
            VisrecEvent::RecordingStarted { .. } => "Recording started".to_string(),
            VisrecEvent::RecordingStopped {
                event_count,
                duration_ms,
            } => format!(
                "Recording stopped: {} events over {} ms",
                event_count, duration_ms
            ),
            VisrecEvent::RecordingCancelled => "Recording cancelled".to_string(),
            VisrecEvent::PlaybackStarted {
                repeat_count,
                event_count,
                ..
            } => format!(
                "Playing {} events x{}",
                event_count, repeat_count
            ),
            VisrecEvent::PlaybackFinished { outcome, .. } => {
                format!("Playback {}", outcome.summary())
            }
            VisrecEvent::MacroCleared => "Macro cleared".to_string(),
            VisrecEvent::PointerMoved { x, y } => format!("X: {}, Y: {}", x, y),
            VisrecEvent::SnapshotLoaded {
                example_count,
                timeline_events,
            } => format!(
                "Loaded {} examples and {} macro events",
                example_count, timeline_events
            ),
            VisrecEvent::SnapshotSaved {
                example_count,
                timeline_events,
            } => format!(
                "Saved {} examples and {} macro events",
                example_count, timeline_events
            ),
            VisrecEvent::SystemError { component, error } => {
                format!("Error in {}: {}", component, error)
            }
            VisrecEvent::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            VisrecEvent::Captured { .. } => "captured",
            VisrecEvent::Learned { .. } => "learned",
            VisrecEvent::Classified { .. } => "classified",
            VisrecEvent::HistoryNavigated { .. } => "history_navigated",
            VisrecEvent::HistoryEntryDeleted { .. } => "history_entry_deleted",
            VisrecEvent::HistoryCleared { .. } => "history_cleared",
            VisrecEvent::RecordingStarted { .. } => "recording_started",
            VisrecEvent::RecordingStopped { .. } => "recording_stopped",
            VisrecEvent::RecordingCancelled => "recording_cancelled",
            VisrecEvent::PlaybackStarted { .. } => "playback_started",
            VisrecEvent::PlaybackFinished { .. } => "playback_finished",
            VisrecEvent::MacroCleared => "macro_cleared",
            VisrecEvent::PointerMoved { .. } => "pointer_moved",
            VisrecEvent::SnapshotLoaded { .. } => "snapshot_loaded",
            VisrecEvent::SnapshotSaved { .. } => "snapshot_saved",
            VisrecEvent::SystemError { .. } => "system_error",
            VisrecEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Event bus for engine notifications using broadcast channels
pub struct EventBus {
    sender: broadcast::Sender<VisrecEvent>,
    debug_logging: bool,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: false,
        }
    }

    /// Create a new event bus with debug logging enabled
    pub fn with_debug_logging(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: true,
        }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<VisrecEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of receivers reached; publishing without
    /// subscribers is an error the caller is free to ignore.
    pub fn publish(&self, event: VisrecEvent) -> Result<usize, EventBusError> {
        match &event {
            VisrecEvent::SystemError { component, error } => {
                error!("System error in {}: {}", component, error);
            }
            VisrecEvent::PlaybackFinished { outcome, .. } => {
                if outcome.is_failure() {
                    warn!("Playback {}", outcome.summary());
                } else {
                    info!("Playback {}", outcome.summary());
                }
            }
            VisrecEvent::ShutdownRequested { reason, .. } => {
                info!("Shutdown requested: {}", reason);
            }
            _ => {
                if self.debug_logging {
                    debug!("Event: {}", event.description());
                }
            }
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// Accept all events
    All,
    /// Accept only specific event types
    EventTypes(Vec<&'static str>),
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &VisrecEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
        }
    }
}

/// Event receiver with filtering, e.g. a log pane that only shows macro events
pub struct EventReceiver {
    receiver: broadcast::Receiver<VisrecEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    pub fn new(
        receiver: broadcast::Receiver<VisrecEvent>,
        filter: EventFilter,
        name: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next filtered event
    pub async fn recv(&mut self) -> Result<VisrecEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::PublishFailed {
                        details: format!("Receiver lagged behind by {} events", n),
                    });
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<Option<VisrecEvent>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => {
                    return Ok(None);
                }
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::PublishFailed {
                        details: format!("Receiver lagged behind by {} events", n),
                    });
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_event_bus_basic_operations() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        let subscriber_count = event_bus
            .publish(VisrecEvent::HistoryCleared { removed: 3 })
            .unwrap();
        assert_eq!(subscriber_count, 1);

        match receiver.recv().await.unwrap() {
            VisrecEvent::HistoryCleared { removed } => assert_eq!(removed, 3),
            _ => panic!("Unexpected event type"),
        }
    }

    #[test]
    fn test_publish_without_subscribers_fails() {
        let event_bus = EventBus::new(10);
        assert!(event_bus.publish(VisrecEvent::MacroCleared).is_err());
    }

    #[tokio::test]
    async fn test_filtered_receiver() {
        let event_bus = EventBus::new(10);
        let filter = EventFilter::EventTypes(vec!["pointer_moved"]);
        let mut filtered = EventReceiver::new(event_bus.subscribe(), filter, "coords".to_string());

        event_bus.publish(VisrecEvent::MacroCleared).unwrap();
        event_bus
            .publish(VisrecEvent::PointerMoved { x: 12, y: 34 })
            .unwrap();

        let received = timeout(Duration::from_millis(100), filtered.recv())
            .await
            .unwrap()
            .unwrap();
        match received {
            VisrecEvent::PointerMoved { x, y } => assert_eq!((x, y), (12, 34)),
            _ => panic!("Unexpected event type"),
        }
        assert!(filtered.try_recv().unwrap().is_none());
    }

    #[test]
    fn test_event_properties() {
        let event = VisrecEvent::Classified {
            entry_id: HistoryId(4),
            result: ClassificationResult::new("cat", 0.5),
        };

        assert_eq!(event.event_type(), "classified");
        assert!(event.description().contains("'cat'"));
        assert!(event.description().contains("50.0%"));
    }
}
