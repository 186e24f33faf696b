//! Camera Capture Layer
//!
//! Frames are pushed from a capture collaborator into a [`FrameSink`] one at
//! a time. Device access lives outside this crate; [`ImageSequenceSource`]
//! replays still images for offline runs.

pub mod frame;
pub mod orientation;
pub mod sequence;
pub mod throttle;

pub use frame::CapturedFrame;
pub use orientation::{DeviceOrientation, VideoOrientation};
pub use sequence::ImageSequenceSource;
pub use throttle::FrameThrottle;

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info};

use crate::analysis::Verdict;
use crate::config::CaptureSettings;

/// Capture configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Minimum spacing between frames handed to recognition
    pub min_interval: Duration,
    /// Orientation frames are delivered in
    pub orientation: VideoOrientation,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            min_interval: throttle::DEFAULT_MIN_INTERVAL,
            orientation: VideoOrientation::Portrait,
        }
    }
}

impl From<&CaptureSettings> for CaptureConfig {
    fn from(settings: &CaptureSettings) -> Self {
        Self {
            min_interval: Duration::from_millis(settings.min_interval_ms),
            orientation: settings.orientation,
        }
    }
}

/// Receives every frame the capture collaborator produces
pub trait FrameSink {
    /// Handle one frame. Returns the verdict when the frame was recognized,
    /// `None` when it was dropped or yielded nothing.
    fn on_frame(&mut self, frame: &CapturedFrame) -> Option<Verdict>;
}

/// Pull-based producer of frames
pub trait FrameSource {
    /// Next frame, or `None` once the stream has ended
    fn next_frame(&mut self) -> Result<Option<CapturedFrame>>;
}

/// Drain `source` into `sink`, returning (frames delivered, verdicts produced)
pub fn pump_frames(source: &mut dyn FrameSource, sink: &mut dyn FrameSink) -> Result<(u64, u64)> {
    let mut delivered = 0;
    let mut verdicts = 0;

    while let Some(frame) = source.next_frame()? {
        delivered += 1;
        if let Some(verdict) = sink.on_frame(&frame) {
            debug!("Frame {} -> {:?}", frame.sequence, verdict);
            verdicts += 1;
        }
    }

    info!("Capture finished: {} frames delivered, {} verdicts", delivered, verdicts);
    Ok((delivered, verdicts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::time::Instant;

    struct CountingSource {
        remaining: u64,
    }

    impl FrameSource for CountingSource {
        fn next_frame(&mut self) -> Result<Option<CapturedFrame>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(CapturedFrame::with_timestamp(RgbaImage::new(2, 2), self.remaining, Instant::now())))
        }
    }

    struct EveryOther;

    impl FrameSink for EveryOther {
        fn on_frame(&mut self, frame: &CapturedFrame) -> Option<Verdict> {
            (frame.sequence % 2 == 0).then(|| Verdict::Unauthorized("X".to_string()))
        }
    }

    #[test]
    fn test_pump_frames_counts() {
        let mut source = CountingSource { remaining: 5 };
        let (delivered, verdicts) = pump_frames(&mut source, &mut EveryOther).unwrap();
        assert_eq!(delivered, 5);
        assert_eq!(verdicts, 3);
    }

    #[test]
    fn test_capture_config_from_settings() {
        let settings = CaptureSettings {
            min_interval_ms: 250,
            orientation: VideoOrientation::LandscapeLeft,
        };
        let config = CaptureConfig::from(&settings);
        assert_eq!(config.min_interval, Duration::from_millis(250));
        assert_eq!(config.orientation, VideoOrientation::LandscapeLeft);
    }
}
