//! Device and video orientation
//!
//! Frames are rotated into the orientation the device is held in before they
//! reach the pipeline, so downstream geometry never deals with rotation.

use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};

/// Physical orientation reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DeviceOrientation {
    #[default]
    Unknown,
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    FaceUp,
    FaceDown,
}

/// Orientation the capture connection delivers frames in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl From<DeviceOrientation> for VideoOrientation {
    /// Landscape sides are swapped: the device's left is the camera's right.
    /// Flat or unknown orientations fall back to portrait.
    fn from(device: DeviceOrientation) -> Self {
        match device {
            DeviceOrientation::Portrait => VideoOrientation::Portrait,
            DeviceOrientation::PortraitUpsideDown => VideoOrientation::PortraitUpsideDown,
            DeviceOrientation::LandscapeRight => VideoOrientation::LandscapeLeft,
            DeviceOrientation::LandscapeLeft => VideoOrientation::LandscapeRight,
            DeviceOrientation::Unknown | DeviceOrientation::FaceUp | DeviceOrientation::FaceDown => {
                VideoOrientation::Portrait
            }
        }
    }
}

impl VideoOrientation {
    /// Whether frames are rotated a quarter turn from the sensor
    pub fn is_landscape(&self) -> bool {
        matches!(self, VideoOrientation::LandscapeLeft | VideoOrientation::LandscapeRight)
    }

    /// Rotate an upright (portrait) sensor image into this orientation
    pub fn apply(&self, image: RgbaImage) -> RgbaImage {
        match self {
            VideoOrientation::Portrait => image,
            VideoOrientation::PortraitUpsideDown => imageops::rotate180(&image),
            VideoOrientation::LandscapeLeft => imageops::rotate270(&image),
            VideoOrientation::LandscapeRight => imageops::rotate90(&image),
        }
    }
}
