use super::{ShutdownReason, VisrecApp};
use crate::error::{Result, VisrecError};
use crate::events::VisrecEvent;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::signal;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

impl VisrecApp {
    /// Wait for a shutdown request or signal, then shut down gracefully
    pub async fn run(&self) -> Result<i32> {
        info!("Visrec is running");

        let shutdown_receiver = self
            .shutdown_receiver
            .lock()
            .take()
            .ok_or_else(|| VisrecError::system("Shutdown receiver already taken"))?;

        // Spawn signal handlers
        self.setup_signal_handlers();

        // Wait for shutdown signal
        let shutdown_reason = shutdown_receiver
            .await
            .map_err(|_| VisrecError::system("Shutdown channel closed unexpectedly"))?;

        info!("Shutdown initiated: {:?}", shutdown_reason);
        self.emit(VisrecEvent::ShutdownRequested {
            timestamp: SystemTime::now(),
            reason: format!("{:?}", shutdown_reason),
        });

        let exit_code = self.shutdown().await?;

        info!("Visrec shutdown complete");
        Ok(exit_code)
    }

    /// Set up signal handlers for graceful shutdown
    fn setup_signal_handlers(&self) {
        // Handle SIGTERM (systemd stop) - Unix only
        #[cfg(unix)]
        {
            let shutdown_sender = Arc::clone(&self.shutdown_sender);
            let token = self.cancellation_token.clone();
            tokio::spawn(async move {
                let mut sigterm =
                    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                        Ok(sigterm) => sigterm,
                        Err(e) => {
                            warn!("Failed to register SIGTERM handler: {}", e);
                            return;
                        }
                    };

                tokio::select! {
                    _ = token.cancelled() => {}
                    Some(()) = sigterm.recv() => {
                        info!("Received SIGTERM signal");
                        send_shutdown(&shutdown_sender, ShutdownReason::Signal("SIGTERM".to_string()));
                    }
                }
            });
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        let shutdown_sender = Arc::clone(&self.shutdown_sender);
        let token: CancellationToken = self.cancellation_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                Ok(()) = signal::ctrl_c() => {
                    info!("Received SIGINT signal (Ctrl+C)");
                    send_shutdown(&shutdown_sender, ShutdownReason::Signal("SIGINT".to_string()));
                }
            }
        });
    }
}

fn send_shutdown(
    shutdown_sender: &Mutex<Option<oneshot::Sender<ShutdownReason>>>,
    reason: ShutdownReason,
) {
    if let Some(sender) = shutdown_sender.lock().take() {
        let _ = sender.send(reason);
    }
}
