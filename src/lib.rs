pub mod app;
pub mod automation;
pub mod capture;
pub mod classify;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod features;
pub mod persistence;
pub mod region;

pub use app::{ShutdownReason, VisrecApp, VisrecAppBuilder};
pub use automation::{
    InputInjector, MacroEngine, MacroEvent, MacroState, MacroTimeline, PlaybackHandle,
    PlaybackOutcome, PointerKind, PointerSample, RecordingInjector, TracingInjector,
};
pub use capture::{CaptureProvider, StaticCaptureProvider, UnavailableCaptureProvider};
pub use classify::{
    ClassificationEngine, ClassificationResult, Example, ExampleId, HistoryEntry, HistoryId,
    LearnOutcome, UNKNOWN_LABEL,
};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::VisrecConfig;
pub use error::{ErrorExt, EventBusError, Result, VisrecError};
pub use events::{EventBus, EventFilter, EventReceiver, VisrecEvent};
pub use features::{FeatureExtractor, FeatureVector};
pub use persistence::{JsonFilePersistence, Persistence, Snapshot};
pub use region::{ImageRegion, RegionBounds};
