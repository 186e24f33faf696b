//! Frame data structures for captured camera content

use image::RgbaImage;
use std::time::Instant;

use crate::geometry::{Size, SourcePx};

/// A captured frame from the camera
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// RGBA pixel data
    pub image: RgbaImage,
    /// Position of the frame in the capture stream
    pub sequence: u64,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl CapturedFrame {
    pub fn with_timestamp(image: RgbaImage, sequence: u64, timestamp: Instant) -> Self {
        Self {
            image,
            sequence,
            timestamp,
        }
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Frame dimensions in source pixel space
    pub fn size(&self) -> Size<SourcePx> {
        let (w, h) = self.dimensions();
        Size::from_pixels(w, h)
    }
}
