use crate::error::ClassificationError;
use crate::region::ImageRegion;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::debug;

/// Source of screen regions for the Capture control
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    async fn capture_region(&self) -> Result<ImageRegion, ClassificationError>;
}

/// Provider that hands out queued regions, repeating the last one once the
/// queue runs dry
#[derive(Debug, Default)]
pub struct StaticCaptureProvider {
    queue: Mutex<VecDeque<ImageRegion>>,
    last: Mutex<Option<ImageRegion>>,
}

impl StaticCaptureProvider {
    pub fn new(region: ImageRegion) -> Self {
        Self::from_regions(vec![region])
    }

    pub fn from_regions(regions: Vec<ImageRegion>) -> Self {
        Self {
            queue: Mutex::new(regions.into()),
            last: Mutex::new(None),
        }
    }

    /// Queue another region to be returned by a later capture
    pub fn push(&self, region: ImageRegion) {
        self.queue.lock().push_back(region);
    }
}

#[async_trait]
impl CaptureProvider for StaticCaptureProvider {
    async fn capture_region(&self) -> Result<ImageRegion, ClassificationError> {
        let mut last = self.last.lock();
        if let Some(region) = self.queue.lock().pop_front() {
            *last = Some(region);
        }

        let region = last
            .clone()
            .ok_or_else(|| ClassificationError::CaptureUnavailable {
                details: "no region queued".to_string(),
            })?;
        debug!(
            "Static capture of {}x{} region",
            region.width(),
            region.height()
        );
        Ok(region)
    }
}

/// Provider for hosts without screen access
#[derive(Debug, Default)]
pub struct UnavailableCaptureProvider;

#[async_trait]
impl CaptureProvider for UnavailableCaptureProvider {
    async fn capture_region(&self) -> Result<ImageRegion, ClassificationError> {
        Err(ClassificationError::CaptureUnavailable {
            details: "no screen capture backend configured".to_string(),
        })
    }
}
