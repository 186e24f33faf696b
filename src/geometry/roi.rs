//! Plate reading window
//!
//! The OCR crop is derived from live frame dimensions on every frame. The
//! viewport overlay uses the same ratio but is computed separately and may
//! sit slightly lower than the true crop.

use super::{AspectRatio, GeometryError, Rect, Size, SourcePx, ViewportPx};

/// Default share of the frame width given to the reading window
pub const DEFAULT_WIDTH_FRACTION: f64 = 0.5;

/// Default downward shift of the on-screen window, in viewport pixels
pub const DEFAULT_OVERLAY_VERTICAL_OFFSET: f64 = 120.0;

/// Computes the reading window for frames and viewports
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiCalculator {
    ratio: AspectRatio,
    width_fraction: f64,
    overlay_vertical_offset: f64,
}

impl Default for RoiCalculator {
    fn default() -> Self {
        Self::new(AspectRatio::default())
    }
}

impl RoiCalculator {
    pub fn new(ratio: AspectRatio) -> Self {
        Self {
            ratio,
            width_fraction: DEFAULT_WIDTH_FRACTION,
            overlay_vertical_offset: DEFAULT_OVERLAY_VERTICAL_OFFSET,
        }
    }

    /// Share of the frame width the window spans, kept within `(0, 1]`
    pub fn with_width_fraction(mut self, fraction: f64) -> Self {
        self.width_fraction = if fraction.is_finite() && fraction > 0.0 {
            fraction.min(1.0)
        } else {
            DEFAULT_WIDTH_FRACTION
        };
        self
    }

    pub fn with_overlay_vertical_offset(mut self, offset: f64) -> Self {
        self.overlay_vertical_offset = offset;
        self
    }

    pub fn ratio(&self) -> AspectRatio {
        self.ratio
    }

    /// Crop rectangle in source-frame pixels, centered on both axes
    pub fn plate_window(&self, frame: Size<SourcePx>) -> Result<Rect<SourcePx>, GeometryError> {
        let frame = frame.validate()?;
        let (width, height) = self.window_size(frame.width, frame.height);
        Ok(Rect::new(
            (frame.width - width) / 2.0,
            (frame.height - height) / 2.0,
            width,
            height,
        ))
    }

    /// On-screen window in viewport pixels, shifted down by the overlay offset
    /// and kept inside the viewport
    pub fn overlay_window(&self, viewport: Size<ViewportPx>) -> Result<Rect<ViewportPx>, GeometryError> {
        let viewport = viewport.validate()?;
        let (width, height) = self.window_size(viewport.width, viewport.height);
        let y = ((viewport.height - height) / 2.0 + self.overlay_vertical_offset)
            .clamp(0.0, viewport.height - height);
        Ok(Rect::new((viewport.width - width) / 2.0, y, width, height))
    }

    /// Window dimensions for a `w x h` area. Falls back to the full height
    /// when the ratio is too narrow for the configured width.
    fn window_size(&self, w: f64, h: f64) -> (f64, f64) {
        let ratio = self.ratio.value();
        let width = w * self.width_fraction;
        let height = width / ratio;
        if height > h {
            (h * ratio, h)
        } else {
            (width, height)
        }
    }
}
