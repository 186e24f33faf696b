//! Application Configuration
//!
//! Tuning constants and the plate allow-list, stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analysis::AllowList;
use crate::capture::VideoOrientation;
use crate::geometry::{AspectRatio, RoiCalculator};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Capture settings
    pub capture: CaptureSettings,
    /// Reading window geometry
    pub region: RegionSettings,
    /// Image enhancement before OCR
    pub enhancement: EnhancementSettings,
    /// Allow-list and indicator behaviour
    pub authorization: AuthorizationSettings,
}

/// Capture-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Minimum milliseconds between recognized frames
    pub min_interval_ms: u64,
    /// Orientation frames are delivered in
    pub orientation: VideoOrientation,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            min_interval_ms: 100,
            orientation: VideoOrientation::Portrait,
        }
    }
}

/// Reading window settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionSettings {
    /// Width component of the plate aspect ratio
    pub width_ratio: f64,
    /// Height component of the plate aspect ratio
    pub height_ratio: f64,
    /// Share of the frame width covered by the window (0.0 - 1.0)
    pub width_fraction: f64,
    /// Downward shift of the on-screen window in viewport pixels
    pub overlay_vertical_offset: f64,
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            width_ratio: 2.0,
            height_ratio: 1.0,
            width_fraction: 0.5,
            overlay_vertical_offset: 120.0,
        }
    }
}

impl RegionSettings {
    /// Aspect ratio with zero components coerced to 0.1
    pub fn aspect_ratio(&self) -> AspectRatio {
        AspectRatio::from_components(self.width_ratio, self.height_ratio)
    }

    pub fn calculator(&self) -> RoiCalculator {
        RoiCalculator::new(self.aspect_ratio())
            .with_width_fraction(self.width_fraction)
            .with_overlay_vertical_offset(self.overlay_vertical_offset)
    }
}

/// Image enhancement settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementSettings {
    /// Enhancement enabled; when off the cropped region goes straight to OCR
    pub enabled: bool,
    /// Uniform downscale applied after cropping (0.0 - 1.0]
    pub downscale: f32,
    /// Saturation multiplier (1.0 = unchanged)
    pub saturation: f32,
    /// Brightness shift (-1.0 - 1.0, 0.0 = unchanged)
    pub brightness: f32,
    /// Contrast multiplier (1.0 = unchanged)
    pub contrast: f32,
    /// Exposure boost in EV stops
    pub exposure_ev: f32,
    /// Number of saturation + exposure passes
    pub passes: u32,
    /// Hue rotation in degrees, skipped when 0
    pub hue_angle: i32,
    /// Publish enhanced images for the diagnostic preview
    pub preview: bool,
}

impl Default for EnhancementSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            downscale: 0.5,
            saturation: 1.5,
            brightness: 0.0,
            contrast: 1.0,
            exposure_ev: 0.7,
            passes: 2,
            hue_angle: 0,
            preview: false,
        }
    }
}

/// Authorization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationSettings {
    /// Plates that pass, matched exactly
    pub authorized_plates: Vec<String>,
    /// Indicator decrement per unauthorized verdict
    pub fade_step: f32,
}

impl Default for AuthorizationSettings {
    fn default() -> Self {
        Self {
            authorized_plates: vec!["ZVX967".to_string()],
            fade_step: 0.1,
        }
    }
}

impl AuthorizationSettings {
    pub fn allow_list(&self) -> AllowList {
        self.authorized_plates.iter().cloned().collect()
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        // Check capture defaults
        assert_eq!(config.capture.min_interval_ms, 100);
        assert_eq!(config.capture.orientation, VideoOrientation::Portrait);

        // Check region defaults
        assert!((config.region.aspect_ratio().value() - 2.0).abs() < 1e-9);
        assert!((config.region.width_fraction - 0.5).abs() < 1e-9);
        assert!((config.region.overlay_vertical_offset - 120.0).abs() < 1e-9);

        // Check enhancement defaults
        assert!(config.enhancement.enabled);
        assert!((config.enhancement.downscale - 0.5).abs() < 0.001);
        assert!((config.enhancement.saturation - 1.5).abs() < 0.001);
        assert!((config.enhancement.exposure_ev - 0.7).abs() < 0.001);
        assert_eq!(config.enhancement.passes, 2);
        assert_eq!(config.enhancement.hue_angle, 0);
        assert!(!config.enhancement.preview);

        // Check authorization defaults
        assert_eq!(config.authorization.authorized_plates, vec!["ZVX967".to_string()]);
        assert!((config.authorization.fade_step - 0.1).abs() < 0.001);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AppConfig::default();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.capture.min_interval_ms, parsed.capture.min_interval_ms);
        assert_eq!(config.enhancement.passes, parsed.enhancement.passes);
        assert_eq!(
            config.authorization.authorized_plates,
            parsed.authorization.authorized_plates
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [capture]
            orientation = "landscape_right"

            [authorization]
            authorized_plates = ["ABC123", "XYZ789"]
            "#,
        )
        .unwrap();

        assert_eq!(parsed.capture.orientation, VideoOrientation::LandscapeRight);
        assert_eq!(parsed.capture.min_interval_ms, 100);
        assert_eq!(parsed.authorization.allow_list().len(), 2);
        assert!((parsed.authorization.fade_step - 0.1).abs() < 0.001);
        assert_eq!(parsed.enhancement.passes, 2);
    }

    #[test]
    fn test_zero_ratio_components_coerced() {
        let region = RegionSettings {
            width_ratio: 0.0,
            height_ratio: 1.0,
            ..Default::default()
        };
        assert!((region.aspect_ratio().value() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_save_and_load_config() {
        let mut config = AppConfig::default();
        config.region.width_ratio = 3.0;
        config.authorization.authorized_plates.push("AB123".to_string());

        let temp_file = NamedTempFile::new().unwrap();
        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert!((loaded.region.width_ratio - 3.0).abs() < 1e-9);
        assert!(loaded.authorization.allow_list().contains("AB123"));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
