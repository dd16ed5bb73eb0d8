mod classifier;
mod engine;
mod history;
mod store;
mod types;


pub use classifier::Classifier;
pub use engine::{ClassificationEngine, LearnOutcome};
pub use history::{HistoryEntry, HistoryNavigator};
pub use store::{ExampleSnapshot, ExampleStore};
pub use types::{ClassificationResult, Example, ExampleId, HistoryId, UNKNOWN_LABEL};
