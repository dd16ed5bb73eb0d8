use crate::config::FeatureConfig;
use crate::error::ClassificationError;
use crate::region::ImageRegion;
use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

/// Fixed-length descriptor of a captured region.
///
/// The values live in a shared immutable buffer, so cloning a vector (into a
/// history entry, an example, a snapshot) never copies the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f32>", into = "Vec<f32>")]
pub struct FeatureVector {
    values: Arc<[f32]>,
}

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Euclidean distance, or `None` when the lengths differ
    pub fn distance(&self, other: &FeatureVector) -> Option<f64> {
        if self.len() != other.len() {
            return None;
        }

        let sum: f64 = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| {
                let d = *a as f64 - *b as f64;
                d * d
            })
            .sum();

        Some(sum.sqrt())
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

impl From<FeatureVector> for Vec<f32> {
    fn from(feature: FeatureVector) -> Self {
        feature.values.to_vec()
    }
}

/// Converts captured regions into luma-grid descriptors
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    grid_width: u32,
    grid_height: u32,
    blur_sigma: f32,
}

impl FeatureExtractor {
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            grid_width: config.grid_width.max(1),
            grid_height: config.grid_height.max(1),
            blur_sigma: config.blur_sigma,
        }
    }

    /// Length of every vector this extractor produces
    pub fn dimension(&self) -> usize {
        self.grid_width as usize * self.grid_height as usize
    }

    /// Extract the descriptor for a region.
    ///
    /// The region is reduced to luma, optionally blurred, resampled onto the
    /// configured grid and scaled into `[0, 1]`. Identical regions always
    /// produce identical vectors.
    pub fn extract(&self, region: &ImageRegion) -> Result<FeatureVector, ClassificationError> {
        if region.is_empty() {
            return Err(ClassificationError::CaptureEmpty {
                width: region.width(),
                height: region.height(),
            });
        }

        let mut luma = region.to_luma();
        if self.blur_sigma > 0.0 {
            luma = imageproc::filter::gaussian_blur_f32(&luma, self.blur_sigma);
        }

        let grid = imageops::resize(&luma, self.grid_width, self.grid_height, FilterType::Triangle);
        let values: Vec<f32> = grid.pixels().map(|p| p.0[0] as f32 / 255.0).collect();

        trace!(
            "Extracted {} features from {}x{} region",
            values.len(),
            region.width(),
            region.height()
        );

        Ok(FeatureVector::new(values))
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(&FeatureConfig::default())
    }
}
