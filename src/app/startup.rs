use super::VisrecApp;
use crate::automation::MacroState;
use crate::error::{ErrorExt, MacroError, Result, VisrecError};
use crate::events::VisrecEvent;
use tracing::{info, warn};

impl VisrecApp {
    /// Restore learned examples and the macro timeline from the configured
    /// persistence.
    ///
    /// Returns `false` when there is no persistence or nothing was saved.
    /// On any error both engines keep their current state.
    pub async fn load_snapshot(&self) -> Result<bool> {
        let Some(persistence) = &self.persistence else {
            return Ok(false);
        };

        let snapshot = match persistence.load().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                info!("No saved state found, starting fresh");
                return Ok(false);
            }
            Err(e) => {
                warn!("Failed to load saved state: {}", e);
                self.emit(VisrecEvent::SystemError {
                    component: "persistence".to_string(),
                    error: e.user_message(),
                });
                return Err(e);
            }
        };

        let timeline_events = snapshot.timeline.len();
        let restored = {
            let mut macros = self.macros.lock();
            let state = macros.state();
            if state != MacroState::Idle {
                return Err(MacroError::Busy {
                    state: state.as_str(),
                }
                .into());
            }

            let restored = self.classification.lock().restore_examples(
                snapshot
                    .examples
                    .into_iter()
                    .map(|example| (example.label, example.feature)),
            );
            if restored.is_ok() {
                macros.restore_timeline(snapshot.timeline)?;
            }
            restored
        };

        let example_count = match restored {
            Ok(count) => count,
            Err(e) => {
                warn!("Saved state does not fit the feature configuration: {}", e);
                let e = VisrecError::from(e);
                self.emit(VisrecEvent::SystemError {
                    component: "persistence".to_string(),
                    error: e.user_message(),
                });
                return Err(e);
            }
        };

        info!(
            "Restored {} examples and {} macro events saved at {}",
            example_count, timeline_events, snapshot.saved_at
        );
        self.emit(VisrecEvent::SnapshotLoaded {
            example_count,
            timeline_events,
        });
        Ok(true)
    }
}
