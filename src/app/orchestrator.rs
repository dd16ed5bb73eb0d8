use super::types::ShutdownReason;
use crate::automation::{InputInjector, MacroEngine, TracingInjector};
use crate::capture::{CaptureProvider, UnavailableCaptureProvider};
use crate::classify::ClassificationEngine;
use crate::clock::{Clock, MonotonicClock};
use crate::config::VisrecConfig;
use crate::error::Result;
use crate::events::{EventBus, EventFilter, EventReceiver, VisrecEvent};
use crate::persistence::{JsonFilePersistence, Persistence};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Application controller that owns both engines and their collaborators.
///
/// Every UI control maps to one method. Both engines sit behind their own
/// mutex; locks are never held across an await.
pub struct VisrecApp {
    pub(super) config: VisrecConfig,
    pub(super) event_bus: Arc<EventBus>,

    // Engines
    pub(super) classification: Mutex<ClassificationEngine>,
    pub(super) macros: Mutex<MacroEngine>,

    // Collaborators
    pub(super) capture_provider: Arc<dyn CaptureProvider>,
    pub(super) persistence: Option<Arc<dyn Persistence>>,

    // Lifecycle management
    pub(super) shutdown_sender: Arc<Mutex<Option<oneshot::Sender<ShutdownReason>>>>,
    pub(super) shutdown_receiver: Mutex<Option<oneshot::Receiver<ShutdownReason>>>,
    pub(super) cancellation_token: CancellationToken,
}

impl VisrecApp {
    pub fn builder(config: VisrecConfig) -> VisrecAppBuilder {
        VisrecAppBuilder::new(config)
    }

    pub fn config(&self) -> &VisrecConfig {
        &self.config
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    /// Subscribe to engine notifications for the status line and log pane
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<VisrecEvent> {
        self.event_bus.subscribe()
    }

    /// Subscribe to a subset of notifications, e.g. only `pointer_moved`
    /// for the coordinates readout
    pub fn subscribe_filtered(&self, filter: EventFilter, name: &str) -> EventReceiver {
        EventReceiver::new(self.event_bus.subscribe(), filter, name.to_string())
    }

    pub(super) fn emit(&self, event: VisrecEvent) {
        if let Err(e) = self.event_bus.publish(event) {
            trace!("Event not delivered: {}", e);
        }
    }
}

/// Builder wiring the controller to its capture, injection, clock and
/// persistence collaborators. Anything not supplied falls back to the
/// headless defaults.
pub struct VisrecAppBuilder {
    config: VisrecConfig,
    capture_provider: Option<Arc<dyn CaptureProvider>>,
    input_injector: Option<Arc<dyn InputInjector>>,
    clock: Option<Arc<dyn Clock>>,
    persistence: Option<Arc<dyn Persistence>>,
    persistence_disabled: bool,
    runtime: Option<Handle>,
    debug_events: bool,
}

impl VisrecAppBuilder {
    pub fn new(config: VisrecConfig) -> Self {
        Self {
            config,
            capture_provider: None,
            input_injector: None,
            clock: None,
            persistence: None,
            persistence_disabled: false,
            runtime: None,
            debug_events: false,
        }
    }

    pub fn with_capture_provider(mut self, provider: Arc<dyn CaptureProvider>) -> Self {
        self.capture_provider = Some(provider);
        self
    }

    pub fn with_input_injector(mut self, injector: Arc<dyn InputInjector>) -> Self {
        self.input_injector = Some(injector);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_persistence(mut self, persistence: Arc<dyn Persistence>) -> Self {
        self.persistence = Some(persistence);
        self.persistence_disabled = false;
        self
    }

    /// Runtime that macro replays are spawned on. Defaults to the runtime
    /// `build` is called from.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Log every published event at debug level
    pub fn with_debug_events(mut self, enabled: bool) -> Self {
        self.debug_events = enabled;
        self
    }

    /// Keep all state in memory regardless of the `[persistence]` section
    pub fn without_persistence(mut self) -> Self {
        self.persistence = None;
        self.persistence_disabled = true;
        self
    }

    pub fn build(self) -> Result<VisrecApp> {
        self.config.validate()?;

        let capacity = self.config.system.event_bus_capacity;
        let event_bus = Arc::new(if self.debug_events {
            EventBus::with_debug_logging(capacity)
        } else {
            EventBus::new(capacity)
        });
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let injector = self
            .input_injector
            .unwrap_or_else(|| Arc::new(TracingInjector));
        let capture_provider = self
            .capture_provider
            .unwrap_or_else(|| Arc::new(UnavailableCaptureProvider));

        let persistence = if self.persistence_disabled {
            None
        } else if let Some(persistence) = self.persistence {
            Some(persistence)
        } else if self.config.persistence.enabled {
            debug!("Using snapshot file {}", self.config.persistence.path);
            Some(Arc::new(JsonFilePersistence::new(&self.config.persistence.path))
                as Arc<dyn Persistence>)
        } else {
            None
        };

        let classification =
            ClassificationEngine::new(&self.config.features, &self.config.classifier);
        let mut macros = MacroEngine::new(&self.config.macros, clock, injector)
            .with_event_bus(Arc::clone(&event_bus));
        match self.runtime.or_else(|| Handle::try_current().ok()) {
            Some(runtime) => macros = macros.with_runtime(runtime),
            None => warn!("Built outside a tokio runtime, macro playback needs one at play time"),
        }
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        info!(
            "Controller ready: {}-dimensional features, persistence {}",
            classification.feature_dimension(),
            if persistence.is_some() { "on" } else { "off" }
        );

        Ok(VisrecApp {
            config: self.config,
            event_bus,
            classification: Mutex::new(classification),
            macros: Mutex::new(macros),
            capture_provider,
            persistence,
            shutdown_sender: Arc::new(Mutex::new(Some(shutdown_sender))),
            shutdown_receiver: Mutex::new(Some(shutdown_receiver)),
            cancellation_token: CancellationToken::new(),
        })
    }
}
