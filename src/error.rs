use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisrecError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Classification error: {0}")]
    Classification(#[from] ClassificationError),

    #[error("Macro error: {0}")]
    Macro(#[from] MacroError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("System error: {message}")]
    System { message: String },
}

impl VisrecError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }
}

/// Errors raised by the capture / learn / classify workflow
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationError {
    #[error("Captured region has zero area ({width}x{height})")]
    CaptureEmpty { width: u32, height: u32 },

    #[error("Screen capture unavailable: {details}")]
    CaptureUnavailable { details: String },

    #[error("No pending capture to learn or classify")]
    NoPendingCapture,

    #[error("Label must not be empty")]
    EmptyLabel,

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },

    #[error("Feature length {actual} does not match store dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors raised by macro recording and playback
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MacroError {
    #[error("Not recording")]
    NotRecording,

    #[error("Macro engine busy: {state}")]
    Busy { state: &'static str },

    #[error("Invalid repeat count {count} (allowed 1..={max})")]
    InvalidRepeatCount { count: u32, max: u32 },

    #[error("Macro timeline is empty")]
    EmptyTimeline,

    #[error("Input injection failed: {details}")]
    Injection { details: String },

    #[error("No async runtime to replay on: {details}")]
    RuntimeUnavailable { details: String },
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Snapshot IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot is corrupted: {details}")]
    Corrupted { details: String },

    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Event channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, VisrecError>;

/// UI-facing text for the status line and log pane
pub trait ErrorExt {
    fn user_message(&self) -> String;
}

impl ErrorExt for VisrecError {
    fn user_message(&self) -> String {
        match self {
            VisrecError::Classification(ClassificationError::CaptureEmpty { .. }) => {
                "Nothing captured: the selected region is empty".to_string()
            }
            VisrecError::Classification(ClassificationError::CaptureUnavailable { details }) => {
                format!("Screen capture is not available: {}", details)
            }
            VisrecError::Classification(ClassificationError::NoPendingCapture) => {
                "Capture a region first".to_string()
            }
            VisrecError::Classification(ClassificationError::EmptyLabel) => {
                "Enter a label before learning".to_string()
            }
            VisrecError::Classification(ClassificationError::NotFound { kind, id }) => {
                format!("No {} with id {}", kind, id)
            }
            VisrecError::Classification(ClassificationError::DimensionMismatch { .. }) => {
                "Saved examples were learned with a different feature grid".to_string()
            }
            VisrecError::Macro(MacroError::NotRecording) => {
                "Start recording before adding pointer events".to_string()
            }
            VisrecError::Macro(MacroError::Busy { state }) => {
                format!("Macro engine is busy ({})", state)
            }
            VisrecError::Macro(MacroError::InvalidRepeatCount { max, .. }) => {
                format!("Repeat count must be between 1 and {}", max)
            }
            VisrecError::Macro(MacroError::EmptyTimeline) => {
                "Record a macro before playing it".to_string()
            }
            VisrecError::Macro(MacroError::Injection { details }) => {
                format!("Could not replay pointer input: {}", details)
            }
            VisrecError::Macro(MacroError::RuntimeUnavailable { .. }) => {
                "Macro playback is not available yet".to_string()
            }
            VisrecError::Persistence(PersistenceError::Io { path, .. }) => {
                format!("Could not access saved state at {}", path)
            }
            VisrecError::Persistence(PersistenceError::Corrupted { .. }) => {
                "Saved state is damaged and was ignored".to_string()
            }
            VisrecError::Persistence(PersistenceError::UnsupportedVersion { found, .. }) => {
                format!("Saved state version {} is not supported", found)
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message<E: Into<VisrecError>>(error: E) -> String {
        error.into().user_message()
    }

    #[test]
    fn test_classification_messages() {
        assert_eq!(
            message(ClassificationError::CaptureEmpty {
                width: 0,
                height: 3
            }),
            "Nothing captured: the selected region is empty"
        );
        assert_eq!(
            message(ClassificationError::CaptureUnavailable {
                details: "headless".to_string()
            }),
            "Screen capture is not available: headless"
        );
        assert_eq!(
            message(ClassificationError::NoPendingCapture),
            "Capture a region first"
        );
        assert_eq!(
            message(ClassificationError::EmptyLabel),
            "Enter a label before learning"
        );
        assert_eq!(
            message(ClassificationError::NotFound {
                kind: "example",
                id: 7
            }),
            "No example with id 7"
        );
        assert_eq!(
            message(ClassificationError::DimensionMismatch {
                expected: 256,
                actual: 64
            }),
            "Saved examples were learned with a different feature grid"
        );
    }

    #[test]
    fn test_macro_messages() {
        assert_eq!(
            message(MacroError::NotRecording),
            "Start recording before adding pointer events"
        );
        assert_eq!(
            message(MacroError::Busy { state: "playing" }),
            "Macro engine is busy (playing)"
        );
        assert_eq!(
            message(MacroError::InvalidRepeatCount { count: 0, max: 50 }),
            "Repeat count must be between 1 and 50"
        );
        assert_eq!(
            message(MacroError::EmptyTimeline),
            "Record a macro before playing it"
        );
        assert_eq!(
            message(MacroError::Injection {
                details: "denied".to_string()
            }),
            "Could not replay pointer input: denied"
        );
        assert_eq!(
            message(MacroError::RuntimeUnavailable {
                details: "no reactor".to_string()
            }),
            "Macro playback is not available yet"
        );
    }

    #[test]
    fn test_persistence_and_system_messages() {
        assert_eq!(
            message(PersistenceError::Io {
                path: "state.json".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            }),
            "Could not access saved state at state.json"
        );
        assert_eq!(
            message(PersistenceError::Corrupted {
                details: "eof".to_string()
            }),
            "Saved state is damaged and was ignored"
        );
        assert_eq!(
            message(PersistenceError::UnsupportedVersion {
                found: 9,
                expected: 1
            }),
            "Saved state version 9 is not supported"
        );
        assert_eq!(
            VisrecError::system("channel closed").user_message(),
            "System error: channel closed"
        );
        assert_eq!(
            message(EventBusError::ChannelClosed),
            "Event bus error: Event channel closed"
        );
    }
}
