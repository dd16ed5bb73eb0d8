use super::types::MacroEvent;
use crate::error::MacroError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Performs the actual pointer action for a replayed event
#[async_trait]
pub trait InputInjector: Send + Sync {
    async fn dispatch(&self, event: &MacroEvent) -> Result<(), MacroError>;
}

/// Injector that only logs what it would do; used by the headless host
#[derive(Debug, Default)]
pub struct TracingInjector;

#[async_trait]
impl InputInjector for TracingInjector {
    async fn dispatch(&self, event: &MacroEvent) -> Result<(), MacroError> {
        info!(
            "Inject {:?} at ({}, {}) [+{} ms]",
            event.kind, event.x, event.y, event.offset_ms
        );
        Ok(())
    }
}

/// Injector that keeps every dispatched event with its dispatch time
#[derive(Debug)]
pub struct RecordingInjector {
    origin: Instant,
    dispatched: Mutex<Vec<(Duration, MacroEvent)>>,
    fail_after: Option<usize>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            dispatched: Mutex::new(Vec::new()),
            fail_after: None,
        }
    }

    /// Injector that rejects every event after the first `count`
    pub fn failing_after(count: usize) -> Self {
        Self {
            fail_after: Some(count),
            ..Self::new()
        }
    }

    pub fn events(&self) -> Vec<MacroEvent> {
        self.dispatched.lock().iter().map(|(_, event)| *event).collect()
    }

    /// Dispatch times in milliseconds since the injector was created
    pub fn dispatch_times_ms(&self) -> Vec<u64> {
        self.dispatched
            .lock()
            .iter()
            .map(|(at, _)| at.as_millis() as u64)
            .collect()
    }

    pub fn count(&self) -> usize {
        self.dispatched.lock().len()
    }
}

impl Default for RecordingInjector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputInjector for RecordingInjector {
    async fn dispatch(&self, event: &MacroEvent) -> Result<(), MacroError> {
        let mut dispatched = self.dispatched.lock();
        if self.fail_after.is_some_and(|limit| dispatched.len() >= limit) {
            return Err(MacroError::Injection {
                details: format!("injector refused event at ({}, {})", event.x, event.y),
            });
        }

        dispatched.push((self.origin.elapsed(), *event));
        Ok(())
    }
}
