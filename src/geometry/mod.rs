//! Geometry Layer
//!
//! Rectangles and sizes tagged with the coordinate space they live in,
//! plus the aspect-fill mapper and region-of-interest calculator built on them.
//!
//! Three spaces exist: source-frame pixels, destination-viewport pixels and
//! normalized `[0, 1]` units relative to an image. A value is only ever
//! moved between spaces through an explicit conversion.

pub mod mapper;
pub mod roi;

pub use mapper::AspectFill;
pub use roi::RoiCalculator;

use std::marker::PhantomData;
use thiserror::Error;

/// Geometry precondition failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    /// A width or height was zero, negative or not finite
    #[error("invalid dimensions {width}x{height}: both must be positive")]
    InvalidDimensions { width: f64, height: f64 },
}

/// Pixels of a captured source frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePx;

/// Pixels of the on-screen viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportPx;

/// Unit square relative to an image, origin at the top-left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalized;

/// A point in coordinate space `S`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<S> {
    pub x: f64,
    pub y: f64,
    _space: PhantomData<S>,
}

impl<S> Point<S> {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, _space: PhantomData }
    }
}

/// Width and height in coordinate space `S`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size<S> {
    pub width: f64,
    pub height: f64,
    _space: PhantomData<S>,
}

impl<S> Size<S> {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, _space: PhantomData }
    }

    /// Build a size from integer pixel dimensions
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f64, height as f64)
    }

    /// Fails unless both dimensions are finite and strictly positive
    pub fn validate(self) -> Result<Self, GeometryError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(self)
        } else {
            Err(GeometryError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Width divided by height
    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

/// Axis-aligned rectangle in coordinate space `S`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect<S> {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    _space: PhantomData<S>,
}

impl<S> Rect<S> {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height, _space: PhantomData }
    }

    pub fn origin(&self) -> Point<S> {
        Point::new(self.x, self.y)
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn size(&self) -> Size<S> {
        Size::new(self.width, self.height)
    }

    /// True when the rectangle lies entirely inside `[0, w] x [0, h]`
    pub fn is_within(&self, bounds: Size<S>) -> bool {
        const EPS: f64 = 1e-9;
        self.x >= -EPS
            && self.y >= -EPS
            && self.max_x() <= bounds.width + EPS
            && self.max_y() <= bounds.height + EPS
    }
}

impl Rect<SourcePx> {
    /// Express this frame rectangle as a fraction of the frame it belongs to
    pub fn to_normalized(&self, frame: Size<SourcePx>) -> Result<Rect<Normalized>, GeometryError> {
        let frame = frame.validate()?;
        Ok(Rect::new(
            self.x / frame.width,
            self.y / frame.height,
            self.width / frame.width,
            self.height / frame.height,
        ))
    }

    /// Integer pixel bounds `(x, y, width, height)`, clamped to `frame`
    pub fn to_pixel_bounds(&self, frame_width: u32, frame_height: u32) -> (u32, u32, u32, u32) {
        let x = (self.x.max(0.0).round() as u32).min(frame_width);
        let y = (self.y.max(0.0).round() as u32).min(frame_height);
        let w = (self.width.max(0.0).round() as u32).min(frame_width - x);
        let h = (self.height.max(0.0).round() as u32).min(frame_height - y);
        (x, y, w, h)
    }
}

/// Width-to-height ratio, always strictly positive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatio(f64);

impl AspectRatio {
    /// Smallest value either ratio component may take
    pub const MIN_COMPONENT: f64 = 0.1;

    /// Build a ratio from its two components, coercing degenerate ones to
    /// [`Self::MIN_COMPONENT`]
    pub fn from_components(width: f64, height: f64) -> Self {
        let clamp = |v: f64| {
            if v.is_finite() && v > 0.0 {
                v
            } else {
                Self::MIN_COMPONENT
            }
        };
        Self(clamp(width) / clamp(height))
    }

    /// Build a ratio from a precomputed width/height value, floored at
    /// [`Self::MIN_COMPONENT`]
    pub fn new(ratio: f64) -> Self {
        if ratio.is_finite() && ratio >= Self::MIN_COMPONENT {
            Self(ratio)
        } else {
            Self(Self::MIN_COMPONENT)
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::from_components(2.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_validate_rejects_zero_and_negative() {
        assert!(Size::<SourcePx>::new(0.0, 10.0).validate().is_err());
        assert!(Size::<SourcePx>::new(10.0, -1.0).validate().is_err());
        assert!(Size::<SourcePx>::new(f64::NAN, 1.0).validate().is_err());
        assert!(Size::<SourcePx>::new(1.0, 1.0).validate().is_ok());
    }

    #[test]
    fn test_aspect_ratio_zero_components_coerced() {
        let r = AspectRatio::from_components(0.0, 1.0);
        assert!((r.value() - 0.1).abs() < 1e-12);

        let r = AspectRatio::from_components(2.0, 0.0);
        assert!((r.value() - 20.0).abs() < 1e-9);

        assert!((AspectRatio::new(0.0).value() - 0.1).abs() < 1e-12);
        assert!((AspectRatio::default().value() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_to_normalized() {
        let frame = Size::<SourcePx>::from_pixels(1920, 1080);
        let rect = Rect::<SourcePx>::new(480.0, 270.0, 960.0, 540.0);
        let n = rect.to_normalized(frame).unwrap();
        assert_eq!(n, Rect::new(0.25, 0.25, 0.5, 0.5));

        assert!(rect.to_normalized(Size::new(0.0, 1080.0)).is_err());
    }

    #[test]
    fn test_pixel_bounds_clamped() {
        let rect = Rect::<SourcePx>::new(90.4, -3.0, 50.0, 20.6);
        assert_eq!(rect.to_pixel_bounds(100, 100), (90, 0, 10, 21));
    }
}
