use super::types::{Example, ExampleId};
use crate::error::ClassificationError;
use crate::features::FeatureVector;
use std::sync::Arc;
use tracing::debug;

/// In-memory collection of learned examples.
///
/// Examples sit behind an `Arc` that is copied on write, so an iteration
/// started with [`ExampleStore::all_examples`] keeps seeing the store as it
/// was, whatever happens to the store afterwards.
#[derive(Debug, Default)]
pub struct ExampleStore {
    examples: Arc<Vec<Example>>,
    next_id: u64,
}

impl ExampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an example. Fails only when the feature length differs from
    /// the examples already stored.
    pub fn add<S: Into<String>>(
        &mut self,
        label: S,
        feature: FeatureVector,
    ) -> Result<ExampleId, ClassificationError> {
        if let Some(expected) = self.dimension() {
            if feature.len() != expected {
                return Err(ClassificationError::DimensionMismatch {
                    expected,
                    actual: feature.len(),
                });
            }
        }

        self.next_id += 1;
        let id = ExampleId(self.next_id);
        let label = label.into();
        debug!("Adding example {} with label '{}'", id, label);

        Arc::make_mut(&mut self.examples).push(Example { id, label, feature });
        Ok(id)
    }

    /// Snapshot iterator over all examples in insertion order
    pub fn all_examples(&self) -> ExampleSnapshot {
        ExampleSnapshot {
            examples: Arc::clone(&self.examples),
            position: 0,
        }
    }

    pub fn get(&self, id: ExampleId) -> Option<&Example> {
        self.examples.iter().find(|example| example.id == id)
    }

    pub fn remove(&mut self, id: ExampleId) -> Result<Example, ClassificationError> {
        let index = self
            .examples
            .iter()
            .position(|example| example.id == id)
            .ok_or(ClassificationError::NotFound {
                kind: "example",
                id: id.0,
            })?;

        Ok(Arc::make_mut(&mut self.examples).remove(index))
    }

    /// Remove every example carrying `label`, returning how many were dropped
    pub fn remove_label(&mut self, label: &str) -> usize {
        if !self.examples.iter().any(|example| example.label == label) {
            return 0;
        }

        let examples = Arc::make_mut(&mut self.examples);
        let before = examples.len();
        examples.retain(|example| example.label != label);
        before - examples.len()
    }

    pub fn clear(&mut self) {
        if !self.examples.is_empty() {
            self.examples = Arc::new(Vec::new());
        }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Feature length shared by every stored example
    pub fn dimension(&self) -> Option<usize> {
        self.examples.first().map(|example| example.feature.len())
    }

    /// Distinct labels in first-seen order
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for example in self.examples.iter() {
            if !labels.contains(&example.label) {
                labels.push(example.label.clone());
            }
        }
        labels
    }
}

/// Point-in-time view over the example store
#[derive(Debug, Clone)]
pub struct ExampleSnapshot {
    examples: Arc<Vec<Example>>,
    position: usize,
}

impl Iterator for ExampleSnapshot {
    type Item = Example;

    fn next(&mut self) -> Option<Self::Item> {
        let example = self.examples.get(self.position)?.clone();
        self.position += 1;
        Some(example)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.examples.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ExampleSnapshot {}
