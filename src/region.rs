use image::{imageops, GrayImage, RgbaImage};
use std::sync::Arc;
use std::time::SystemTime;

/// Screen-space rectangle a region was captured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl RegionBounds {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Captured image region handed to the classification engine
#[derive(Debug, Clone)]
pub struct ImageRegion {
    /// Where on screen the pixels came from
    pub bounds: RegionBounds,
    /// Timestamp when the region was captured
    pub timestamp: SystemTime,
    /// Pixel data (shared ownership so previews can hold on to it)
    pub pixels: Arc<RgbaImage>,
}

impl ImageRegion {
    /// Create a region captured at the screen origin
    pub fn new(pixels: RgbaImage) -> Self {
        let bounds = RegionBounds::new(0, 0, pixels.width(), pixels.height());
        Self::at(bounds.x, bounds.y, pixels)
    }

    /// Create a region captured at a specific screen position
    pub fn at(x: i32, y: i32, pixels: RgbaImage) -> Self {
        Self {
            bounds: RegionBounds::new(x, y, pixels.width(), pixels.height()),
            timestamp: SystemTime::now(),
            pixels: Arc::new(pixels),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Check whether the region holds any pixels at all
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Luma conversion used by the feature extractor
    pub fn to_luma(&self) -> GrayImage {
        imageops::grayscale(self.pixels.as_ref())
    }
}
