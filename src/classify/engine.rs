use super::classifier::Classifier;
use super::history::{HistoryEntry, HistoryNavigator};
use super::store::ExampleStore;
use super::types::{ClassificationResult, Example, ExampleId, HistoryId};
use crate::config::{ClassifierConfig, FeatureConfig};
use crate::error::ClassificationError;
use crate::features::{FeatureExtractor, FeatureVector};
use crate::region::ImageRegion;
use tracing::{debug, info};

/// The latest capture that has not been learned or classified yet
#[derive(Debug, Clone)]
struct PendingCapture {
    entry_id: HistoryId,
    feature: FeatureVector,
}

/// What a successful learn produced
#[derive(Debug, Clone, PartialEq)]
pub struct LearnOutcome {
    pub entry_id: HistoryId,
    pub example_id: ExampleId,
    pub label: String,
}

/// Capture → extract → learn/classify → history orchestration.
///
/// Every operation either applies completely or returns an error without
/// touching any state.
pub struct ClassificationEngine {
    extractor: FeatureExtractor,
    classifier: Classifier,
    store: ExampleStore,
    history: HistoryNavigator,
    pending: Option<PendingCapture>,
}

impl ClassificationEngine {
    pub fn new(features: &FeatureConfig, classifier: &ClassifierConfig) -> Self {
        Self {
            extractor: FeatureExtractor::new(features),
            classifier: Classifier::new(classifier),
            store: ExampleStore::new(),
            history: HistoryNavigator::new(),
            pending: None,
        }
    }

    /// Extract features from a captured region and append it to history.
    /// Replaces any capture still pending.
    pub fn capture(&mut self, region: &ImageRegion) -> Result<HistoryId, ClassificationError> {
        let feature = self.extractor.extract(region)?;
        let entry_id = self.history.append(feature.clone(), region.bounds);

        if let Some(previous) = self.pending.replace(PendingCapture { entry_id, feature }) {
            debug!(
                "Capture {} discarded pending capture {}",
                entry_id, previous.entry_id
            );
        }

        info!(
            "Captured {}x{} region as entry {}",
            region.width(),
            region.height(),
            entry_id
        );
        Ok(entry_id)
    }

    /// Store the pending capture as an example labelled `label`
    pub fn learn(&mut self, label: &str) -> Result<LearnOutcome, ClassificationError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ClassificationError::EmptyLabel);
        }

        let pending = self
            .pending
            .as_ref()
            .ok_or(ClassificationError::NoPendingCapture)?;
        if self.history.get(pending.entry_id).is_none() {
            return Err(ClassificationError::NoPendingCapture);
        }

        let entry_id = pending.entry_id;
        let example_id = self.store.add(label, pending.feature.clone())?;
        self.history
            .attach_result(entry_id, ClassificationResult::new(label, 1.0))?;
        self.pending = None;

        info!("Learned entry {} as '{}' ({})", entry_id, label, example_id);
        Ok(LearnOutcome {
            entry_id,
            example_id,
            label: label.to_string(),
        })
    }

    /// Classify the pending capture against the learned examples
    pub fn classify_current(
        &mut self,
    ) -> Result<(HistoryId, ClassificationResult), ClassificationError> {
        let pending = self
            .pending
            .as_ref()
            .ok_or(ClassificationError::NoPendingCapture)?;
        let entry_id = pending.entry_id;

        let result = self
            .classifier
            .classify(&pending.feature, self.store.all_examples());
        self.history.attach_result(entry_id, result.clone())?;
        self.pending = None;

        info!("Classified entry {} as {}", entry_id, result);
        Ok((entry_id, result))
    }

    /// Label typed into the prompt box; learned like any other label
    pub fn prompt(&mut self, label: &str) -> Result<LearnOutcome, ClassificationError> {
        self.learn(label)
    }

    pub fn prev(&mut self) -> Option<&HistoryEntry> {
        self.history.prev()
    }

    pub fn next(&mut self) -> Option<&HistoryEntry> {
        self.history.next()
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.history.current()
    }

    /// Delete the entry under the cursor. Returns `None` when history is empty.
    pub fn delete_current(&mut self) -> Option<HistoryId> {
        let id = self.history.current()?.id;
        self.history.delete(id).ok()?;

        if self.pending.as_ref().is_some_and(|p| p.entry_id == id) {
            debug!("Pending capture {} deleted with its history entry", id);
            self.pending = None;
        }

        Some(id)
    }

    /// Empty the history, discarding any pending capture
    pub fn clear_history(&mut self) -> usize {
        self.pending = None;
        let removed = self.history.clear();
        info!("Cleared {} history entries", removed);
        removed
    }

    pub fn pending_entry_id(&self) -> Option<HistoryId> {
        self.pending.as_ref().map(|p| p.entry_id)
    }

    pub fn history(&self) -> &HistoryNavigator {
        &self.history
    }

    pub fn examples(&self) -> &ExampleStore {
        &self.store
    }

    pub fn remove_example(&mut self, id: ExampleId) -> Result<Example, ClassificationError> {
        self.store.remove(id)
    }

    /// Forget every example learned under `label`
    pub fn forget_label(&mut self, label: &str) -> usize {
        let removed = self.store.remove_label(label.trim());
        info!("Forgot {} examples labelled '{}'", removed, label.trim());
        removed
    }

    pub fn clear_examples(&mut self) {
        self.store.clear();
    }

    /// Learned examples in insertion order, for persistence
    pub fn snapshot_examples(&self) -> Vec<(String, FeatureVector)> {
        self.store
            .all_examples()
            .map(|example| (example.label, example.feature))
            .collect()
    }

    /// Length of the vectors produced for captures
    pub fn feature_dimension(&self) -> usize {
        self.extractor.dimension()
    }

    /// Replace the example store with previously saved examples.
    ///
    /// Every feature must match the extractor's dimension, otherwise nothing
    /// is replaced.
    pub fn restore_examples<I>(&mut self, examples: I) -> Result<usize, ClassificationError>
    where
        I: IntoIterator<Item = (String, FeatureVector)>,
    {
        let expected = self.extractor.dimension();
        let mut restored = ExampleStore::new();

        for (label, feature) in examples {
            if feature.len() != expected {
                return Err(ClassificationError::DimensionMismatch {
                    expected,
                    actual: feature.len(),
                });
            }
            restored.add(label, feature)?;
        }

        let count = restored.len();
        self.store = restored;
        Ok(count)
    }
}

impl Default for ClassificationEngine {
    fn default() -> Self {
        Self::new(&FeatureConfig::default(), &ClassifierConfig::default())
    }
}
