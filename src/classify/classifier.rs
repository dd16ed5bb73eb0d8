use super::types::{ClassificationResult, Example, UNKNOWN_LABEL};
use crate::config::ClassifierConfig;
use crate::features::FeatureVector;
use tracing::debug;

/// Nearest-neighbour classifier over Euclidean feature distance
#[derive(Debug, Clone)]
pub struct Classifier {
    confidence_falloff: f64,
    tie_tolerance: f64,
    min_confidence: f32,
}

impl Classifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            confidence_falloff: config.confidence_falloff,
            tie_tolerance: config.tie_tolerance,
            min_confidence: config.min_confidence,
        }
    }

    /// Classify `feature` against `examples`.
    ///
    /// Examples must arrive in insertion order: among matches whose distance
    /// is within the tie tolerance the later one wins. An empty input yields
    /// `unknown` with zero confidence.
    pub fn classify<I>(&self, feature: &FeatureVector, examples: I) -> ClassificationResult
    where
        I: IntoIterator<Item = Example>,
    {
        let Some((best, distance)) = self.nearest(feature, examples) else {
            return ClassificationResult::unknown();
        };

        let confidence = self.confidence(distance, feature.len());
        debug!(
            "Nearest example {} '{}' at distance {:.4} (confidence {:.3})",
            best.id, best.label, distance, confidence
        );

        if confidence < self.min_confidence {
            return ClassificationResult::new(UNKNOWN_LABEL, confidence);
        }

        ClassificationResult::new(best.label, confidence)
    }

    /// Find the closest example and its distance
    pub fn nearest<I>(&self, feature: &FeatureVector, examples: I) -> Option<(Example, f64)>
    where
        I: IntoIterator<Item = Example>,
    {
        let mut best: Option<(Example, f64)> = None;

        for candidate in examples {
            let Some(distance) = feature.distance(&candidate.feature) else {
                continue;
            };
            if !distance.is_finite() {
                continue;
            }

            best = match best {
                None => Some((candidate, distance)),
                Some((current, best_distance)) => {
                    if distance < best_distance - self.tie_tolerance {
                        Some((candidate, distance))
                    } else if distance <= best_distance + self.tie_tolerance
                        && candidate.id > current.id
                    {
                        Some((candidate, best_distance.min(distance)))
                    } else {
                        Some((current, best_distance))
                    }
                }
            };
        }

        best
    }

    /// Monotonically decreasing map from distance to `[0, 1]`; zero distance
    /// gives exactly 1.0
    pub fn confidence(&self, distance: f64, dimension: usize) -> f32 {
        let scale = (dimension.max(1) as f64).sqrt();
        let confidence = (-self.confidence_falloff * distance / scale).exp();
        confidence.clamp(0.0, 1.0) as f32
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}
