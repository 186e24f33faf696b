//! Image enhancement before OCR
//!
//! Crops the plate window, downscales it, then runs red-emphasis passes
//! (saturation boost followed by an exposure lift) to separate characters
//! from the plate background. Every step degrades gracefully: if a filter
//! cannot run, its input passes through unchanged.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::map::map_colors;
use tracing::{debug, warn};

use super::VisionError;
use crate::config::EnhancementSettings;
use crate::geometry::{Normalized, Rect, Size, SourcePx};

/// Rec. 709 luma weights
const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Image handed to recognition, with the part of it that holds the plate
#[derive(Debug, Clone)]
pub struct EnhancedFrame {
    pub image: RgbaImage,
    /// Plate window within `image`; the whole image unless cropping failed
    pub region: Rect<Normalized>,
}

/// Composes the enhancement filters for one frame at a time
#[derive(Debug, Clone)]
pub struct EnhancementPipeline {
    settings: EnhancementSettings,
    preview: Option<Sender<RgbaImage>>,
}

impl EnhancementPipeline {
    pub fn new(settings: EnhancementSettings) -> Self {
        Self {
            settings,
            preview: None,
        }
    }

    /// Attach a preview channel and return its receiving end. Only the most
    /// recent enhanced image is kept; older ones are dropped while full.
    pub fn preview_channel(&mut self) -> Receiver<RgbaImage> {
        let (tx, rx) = bounded(1);
        self.preview = Some(tx);
        rx
    }

    /// Produce the image handed to recognition for `roi` of `frame`
    pub fn enhance(&self, frame: &RgbaImage, roi: Rect<SourcePx>) -> EnhancedFrame {
        let s = &self.settings;
        let full = Rect::new(0.0, 0.0, 1.0, 1.0);

        // Without a crop the OCR region must point back into the whole frame
        let (mut image, region) = match crop(frame, roi) {
            Ok(cropped) => (cropped, full),
            Err(e) => {
                warn!("Enhancement step skipped: {}", e);
                let (w, h) = frame.dimensions();
                let region = roi
                    .to_normalized(Size::from_pixels(w, h))
                    .unwrap_or(full);
                (frame.clone(), region)
            }
        };

        if !s.enabled {
            debug!("Enhancement disabled, sending {}x{} crop", image.width(), image.height());
            return EnhancedFrame { image, region };
        }

        image = run_step(image, |img| downscale(img, s.downscale));

        for _ in 0..s.passes {
            image = run_step(image, |img| {
                color_controls(img, s.saturation, s.brightness, s.contrast)
            });
            image = run_step(image, |img| exposure(img, s.exposure_ev));
        }

        if s.hue_angle != 0 {
            image = imageops::huerotate(&image, s.hue_angle);
        }

        debug!(
            "Enhanced plate window {}x{} (downscale={}, passes={})",
            image.width(),
            image.height(),
            s.downscale,
            s.passes
        );

        if s.preview {
            self.publish_preview(&image);
        }

        EnhancedFrame { image, region }
    }

    fn publish_preview(&self, image: &RgbaImage) {
        let Some(tx) = &self.preview else {
            return;
        };
        match tx.try_send(image.clone()) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => debug!("Preview receiver dropped"),
        }
    }
}

/// Run one filter, falling back to its input on failure
fn run_step<F>(image: RgbaImage, filter: F) -> RgbaImage
where
    F: FnOnce(&RgbaImage) -> Result<RgbaImage, VisionError>,
{
    match filter(&image) {
        Ok(out) => out,
        Err(e) => {
            warn!("Enhancement step skipped: {}", e);
            image
        }
    }
}

/// Cut `roi` out of the frame
fn crop(frame: &RgbaImage, roi: Rect<SourcePx>) -> Result<RgbaImage, VisionError> {
    let (fw, fh) = frame.dimensions();
    let (x, y, w, h) = roi.to_pixel_bounds(fw, fh);
    if w == 0 || h == 0 {
        return Err(VisionError::FilterUnavailable {
            filter: "crop",
            reason: format!("region {:?} is empty inside {}x{} frame", roi, fw, fh),
        });
    }
    Ok(imageops::crop_imm(frame, x, y, w, h).to_image())
}

/// Shrink both axes by `factor`
fn downscale(image: &RgbaImage, factor: f32) -> Result<RgbaImage, VisionError> {
    if !(factor.is_finite() && factor > 0.0 && factor <= 1.0) {
        return Err(VisionError::FilterUnavailable {
            filter: "downscale",
            reason: format!("factor {} outside (0, 1]", factor),
        });
    }
    let (w, h) = image.dimensions();
    let nw = (w as f32 * factor).round() as u32;
    let nh = (h as f32 * factor).round() as u32;
    if nw == 0 || nh == 0 {
        return Err(VisionError::FilterUnavailable {
            filter: "downscale",
            reason: format!("{}x{} would shrink to nothing", w, h),
        });
    }
    if (nw, nh) == (w, h) {
        return Ok(image.clone());
    }
    Ok(imageops::resize(image, nw, nh, FilterType::Triangle))
}

/// Saturation around luma, then brightness shift and contrast around mid-grey
fn color_controls(
    image: &RgbaImage,
    saturation: f32,
    brightness: f32,
    contrast: f32,
) -> Result<RgbaImage, VisionError> {
    if ![saturation, brightness, contrast].iter().all(|v| v.is_finite()) {
        return Err(VisionError::FilterUnavailable {
            filter: "color_controls",
            reason: "non-finite parameter".to_string(),
        });
    }

    Ok(map_colors(image, |p: Rgba<u8>| {
        let [r, g, b, a] = p.0;
        let rgb = [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0];
        let luma = rgb[0] * LUMA[0] + rgb[1] * LUMA[1] + rgb[2] * LUMA[2];

        let adjust = |c: f32| {
            let saturated = luma + (c - luma) * saturation;
            let brightened = saturated + brightness;
            to_u8((brightened - 0.5) * contrast + 0.5)
        };
        Rgba([adjust(rgb[0]), adjust(rgb[1]), adjust(rgb[2]), a])
    }))
}

/// Multiply every channel by `2^ev`, lifting light regions towards white
fn exposure(image: &RgbaImage, ev: f32) -> Result<RgbaImage, VisionError> {
    if !ev.is_finite() {
        return Err(VisionError::FilterUnavailable {
            filter: "exposure",
            reason: format!("exposure {} is not finite", ev),
        });
    }
    let gain = 2f32.powf(ev);

    Ok(map_colors(image, |p: Rgba<u8>| {
        let [r, g, b, a] = p.0;
        let lift = |c: u8| to_u8(c as f32 / 255.0 * gain);
        Rgba([lift(r), lift(g), lift(b), a])
    }))
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        ImageBuffer::from_fn(w, h, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8, 255])
        })
    }

    fn center_roi(w: u32, h: u32) -> Rect<SourcePx> {
        Rect::new(w as f64 / 4.0, h as f64 / 4.0, w as f64 / 2.0, h as f64 / 2.0)
    }

    #[test]
    fn test_output_extent_is_scaled_crop() {
        let pipeline = EnhancementPipeline::new(EnhancementSettings::default());
        let frame = gradient(200, 120);
        let out = pipeline.enhance(&frame, Rect::new(50.0, 30.0, 100.0, 50.0));
        assert_eq!(out.image.dimensions(), (50, 25));
        assert_eq!(out.region, Rect::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_enhance_is_deterministic() {
        let pipeline = EnhancementPipeline::new(EnhancementSettings::default());
        let frame = gradient(160, 90);
        let roi = center_roi(160, 90);

        let first = pipeline.enhance(&frame, roi);
        let second = pipeline.enhance(&frame, roi);
        assert_eq!(first.image.as_raw(), second.image.as_raw());
    }

    #[test]
    fn test_disabled_returns_plain_crop() {
        let settings = EnhancementSettings {
            enabled: false,
            ..Default::default()
        };
        let pipeline = EnhancementPipeline::new(settings);
        let frame = gradient(40, 40);
        let out = pipeline.enhance(&frame, Rect::new(10.0, 10.0, 20.0, 20.0)).image;

        assert_eq!(out.dimensions(), (20, 20));
        assert_eq!(out.get_pixel(0, 0), frame.get_pixel(10, 10));
    }

    #[test]
    fn test_empty_roi_passes_frame_through() {
        let settings = EnhancementSettings {
            enabled: false,
            ..Default::default()
        };
        let pipeline = EnhancementPipeline::new(settings);
        let frame = gradient(40, 30);
        let out = pipeline.enhance(&frame, Rect::new(100.0, 100.0, 20.0, 20.0));
        assert_eq!(out.image.as_raw(), frame.as_raw());
        assert!((out.region.x - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_downscale_skipped() {
        let settings = EnhancementSettings {
            downscale: 0.0,
            passes: 0,
            ..Default::default()
        };
        let pipeline = EnhancementPipeline::new(settings);
        let frame = gradient(40, 40);
        let out = pipeline.enhance(&frame, Rect::new(0.0, 0.0, 20.0, 10.0));
        assert_eq!(out.image.dimensions(), (20, 10));
    }

    #[test]
    fn test_downscale_to_nothing_fails() {
        let img = gradient(1, 1);
        assert!(downscale(&img, 0.2).is_err());
        assert_eq!(downscale(&img, 1.0).unwrap().dimensions(), (1, 1));
    }

    #[test]
    fn test_saturation_pushes_red_away_from_grey() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([180, 100, 100, 255]));
        let out = color_controls(&img, 1.5, 0.0, 1.0).unwrap();
        let p = out.get_pixel(0, 0);
        assert!(p[0] > 180);
        assert!(p[1] < 100);
        assert_eq!(p[3], 255);

        // Grey has no chroma to boost
        let grey = RgbaImage::from_pixel(1, 1, Rgba([128, 128, 128, 255]));
        let out = color_controls(&grey, 1.5, 0.0, 1.0).unwrap();
        let p = out.get_pixel(0, 0);
        assert!((p[0] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_neutral_color_controls_are_identity() {
        let img = gradient(16, 16);
        let out = color_controls(&img, 1.0, 0.0, 1.0).unwrap();
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn test_exposure_brightens_and_clamps() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([100, 200, 0, 77]));
        let out = exposure(&img, 0.7).unwrap();
        let p = out.get_pixel(0, 0);
        // 100 * 2^0.7 = 162.45
        assert_eq!(p[0], 162);
        assert_eq!(p[1], 255);
        assert_eq!(p[2], 0);
        assert_eq!(p[3], 77);

        assert!(exposure(&img, f32::NAN).is_err());
    }

    #[test]
    fn test_preview_does_not_alter_output() {
        let mut with_preview = EnhancementPipeline::new(EnhancementSettings {
            preview: true,
            ..Default::default()
        });
        let rx = with_preview.preview_channel();
        let plain = EnhancementPipeline::new(EnhancementSettings::default());

        let frame = gradient(80, 60);
        let roi = center_roi(80, 60);
        let out = with_preview.enhance(&frame, roi).image;
        // Second call finds the channel full and drops its copy
        with_preview.enhance(&frame, roi);

        assert_eq!(out.as_raw(), plain.enhance(&frame, roi).image.as_raw());
        let previewed = rx.try_recv().unwrap();
        assert_eq!(previewed.as_raw(), out.as_raw());
        assert!(rx.try_recv().is_err());
    }
}
