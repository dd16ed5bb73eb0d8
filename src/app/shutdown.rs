use super::{ShutdownReason, VisrecApp};
use crate::error::{ErrorExt, Result};
use crate::events::VisrecEvent;
use crate::persistence::{Snapshot, StoredExample};
use tracing::{error, info, warn};

impl VisrecApp {
    /// Write learned examples and the stored timeline to persistence.
    ///
    /// Returns `false` when persistence is disabled.
    pub async fn save_snapshot(&self) -> Result<bool> {
        let Some(persistence) = &self.persistence else {
            return Ok(false);
        };

        let examples: Vec<StoredExample> = self
            .classification
            .lock()
            .snapshot_examples()
            .into_iter()
            .map(|(label, feature)| StoredExample { label, feature })
            .collect();
        let timeline = self.macros.lock().timeline().clone();
        let snapshot = Snapshot::new(examples, timeline);

        if let Err(e) = persistence.save(&snapshot).await {
            warn!("Failed to save state: {}", e);
            self.emit(VisrecEvent::SystemError {
                component: "persistence".to_string(),
                error: e.user_message(),
            });
            return Err(e);
        }

        self.emit(VisrecEvent::SnapshotSaved {
            example_count: snapshot.examples.len(),
            timeline_events: snapshot.timeline.len(),
        });
        Ok(true)
    }

    /// Ask a running [`VisrecApp::run`] to shut down, as the Exit control
    /// does. Returns `false` if shutdown was already requested.
    pub fn request_shutdown(&self, reason: ShutdownReason) -> bool {
        match self.shutdown_sender.lock().take() {
            Some(sender) => sender.send(reason).is_ok(),
            None => false,
        }
    }

    /// Stop macro activity and save state if configured
    pub async fn shutdown(&self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        // Stops the signal listeners
        self.cancellation_token.cancel();
        self.halt_macros();

        let mut exit_code = 0;
        if self.config.persistence.save_on_exit {
            if let Err(e) = self.save_snapshot().await {
                error!("Error saving state on exit: {}", e);
                exit_code = 1;
            }
        }

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }
}
