//! Replay a directory of still images as a capture stream

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{CapturedFrame, FrameSource, VideoOrientation};
use crate::geometry::{Size, SourcePx};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// Delivers image files in name order, stamped at a nominal frame rate
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
    started_at: Instant,
    frame_interval: Duration,
    orientation: VideoOrientation,
}

impl ImageSequenceSource {
    /// Collect every image file directly inside `dir`
    pub fn open(dir: &Path, fps: u32, orientation: VideoOrientation) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {:?}", dir))? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if path.is_file() && is_image {
                paths.push(path);
            }
        }
        paths.sort();

        info!("Image sequence: {} frames from {:?} at {} fps", paths.len(), dir, fps);
        Ok(Self::from_paths(paths, fps, orientation))
    }

    pub fn from_paths(paths: Vec<PathBuf>, fps: u32, orientation: VideoOrientation) -> Self {
        Self {
            paths,
            next: 0,
            started_at: Instant::now(),
            frame_interval: Duration::from_secs(1) / fps.max(1),
            orientation,
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Delivered size of the first frame, read from its header
    pub fn frame_size(&self) -> Result<Option<Size<SourcePx>>> {
        let Some(path) = self.paths.first() else {
            return Ok(None);
        };
        let (w, h) = image::image_dimensions(path)
            .with_context(|| format!("Failed to read dimensions of {:?}", path))?;
        let (w, h) = if self.orientation.is_landscape() { (h, w) } else { (w, h) };
        Ok(Some(Size::from_pixels(w, h)))
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<CapturedFrame>> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        let sequence = self.next as u64;
        self.next += 1;

        let image = image::open(path)
            .with_context(|| format!("Failed to decode frame {:?}", path))?
            .to_rgba8();
        let image = self.orientation.apply(image);
        let timestamp = self.started_at + self.frame_interval * sequence as u32;

        debug!("Frame {} from {:?} ({}x{})", sequence, path, image.width(), image.height());
        Ok(Some(CapturedFrame::with_timestamp(image, sequence, timestamp)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_sequence_order_and_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.png", "c.png"] {
            RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 255]))
                .save(dir.path().join(name))
                .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut source = ImageSequenceSource::open(dir.path(), 10, VideoOrientation::Portrait).unwrap();
        assert_eq!(source.len(), 3);

        let first = source.next_frame().unwrap().unwrap();
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 1);
        assert_eq!(second.timestamp - first.timestamp, Duration::from_millis(100));
        assert_eq!(first.dimensions(), (4, 2));

        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_orientation_applied() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::new(4, 2).save(dir.path().join("f.png")).unwrap();

        let mut source =
            ImageSequenceSource::open(dir.path(), 30, VideoOrientation::LandscapeRight).unwrap();
        assert_eq!(source.frame_size().unwrap(), Some(Size::from_pixels(2, 4)));
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.dimensions(), (2, 4));
    }

    #[test]
    fn test_missing_directory() {
        assert!(ImageSequenceSource::open(Path::new("/nonexistent/frames"), 30, VideoOrientation::Portrait).is_err());
    }
}
