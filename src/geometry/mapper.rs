//! Aspect-fill coordinate mapping
//!
//! The preview scales the source uniformly until it covers the viewport,
//! then centers it so the excess is cropped equally on both sides.

use super::{GeometryError, Point, Rect, Size, SourcePx, ViewportPx};

/// Uniform scale and centering offsets from source pixels to viewport pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectFill {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl AspectFill {
    /// Compute the mapping for a source frame shown in a viewport
    pub fn new(source: Size<SourcePx>, viewport: Size<ViewportPx>) -> Result<Self, GeometryError> {
        let source = source.validate()?;
        let viewport = viewport.validate()?;

        // A wider viewport is covered by matching widths, a taller one by heights
        let scale = if viewport.aspect() > source.aspect() {
            viewport.width / source.width
        } else {
            viewport.height / source.height
        };

        Ok(Self {
            scale,
            offset_x: (viewport.width - source.width * scale) / 2.0,
            offset_y: (viewport.height - source.height * scale) / 2.0,
        })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Centering offsets `(x, y)`; negative along the cropped axis
    pub fn offset(&self) -> (f64, f64) {
        (self.offset_x, self.offset_y)
    }

    pub fn map_point(&self, p: Point<SourcePx>) -> Point<ViewportPx> {
        Point::new(p.x * self.scale + self.offset_x, p.y * self.scale + self.offset_y)
    }

    pub fn unmap_point(&self, p: Point<ViewportPx>) -> Point<SourcePx> {
        Point::new((p.x - self.offset_x) / self.scale, (p.y - self.offset_y) / self.scale)
    }

    pub fn map_rect(&self, r: Rect<SourcePx>) -> Rect<ViewportPx> {
        let origin = self.map_point(r.origin());
        Rect::new(origin.x, origin.y, r.width * self.scale, r.height * self.scale)
    }

    pub fn unmap_rect(&self, r: Rect<ViewportPx>) -> Rect<SourcePx> {
        let origin = self.unmap_point(r.origin());
        Rect::new(origin.x, origin.y, r.width / self.scale, r.height / self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_taller_viewport_crops_sides() {
        // 1920x1080 landscape frame shown on a 390x844 portrait screen
        let fill = AspectFill::new(Size::new(1920.0, 1080.0), Size::new(390.0, 844.0)).unwrap();
        assert!(close(fill.scale(), 844.0 / 1080.0));
        let (ox, oy) = fill.offset();
        assert!(ox < 0.0);
        assert!(close(oy, 0.0));

        let center = fill.map_point(Point::new(960.0, 540.0));
        assert!(close(center.x, 195.0));
        assert!(close(center.y, 422.0));
    }

    #[test]
    fn test_wider_viewport_crops_top_and_bottom() {
        let fill = AspectFill::new(Size::new(1080.0, 1920.0), Size::new(1000.0, 1000.0)).unwrap();
        assert!(close(fill.scale(), 1000.0 / 1080.0));
        let (ox, oy) = fill.offset();
        assert!(close(ox, 0.0));
        assert!(oy < 0.0);
    }

    #[test]
    fn test_identical_aspect_has_no_offset() {
        let fill = AspectFill::new(Size::new(640.0, 480.0), Size::new(1280.0, 960.0)).unwrap();
        assert!(close(fill.scale(), 2.0));
        assert_eq!(fill.offset(), (0.0, 0.0));
    }

    #[test]
    fn test_corner_round_trip() {
        let source = Size::<SourcePx>::new(1920.0, 1080.0);
        let fill = AspectFill::new(source, Size::new(390.0, 844.0)).unwrap();

        let corners = [
            (0.0, 0.0),
            (source.width, 0.0),
            (0.0, source.height),
            (source.width, source.height),
        ];
        for (x, y) in corners {
            let back = fill.unmap_point(fill.map_point(Point::new(x, y)));
            assert!(close(back.x, x), "x {} -> {}", x, back.x);
            assert!(close(back.y, y), "y {} -> {}", y, back.y);
        }
    }

    #[test]
    fn test_rect_round_trip() {
        let fill = AspectFill::new(Size::new(1280.0, 720.0), Size::new(800.0, 800.0)).unwrap();
        let rect = Rect::<SourcePx>::new(320.0, 200.0, 640.0, 320.0);
        let back = fill.unmap_rect(fill.map_rect(rect));
        assert!(close(back.x, rect.x) && close(back.y, rect.y));
        assert!(close(back.width, rect.width) && close(back.height, rect.height));
    }

    #[test]
    fn test_invalid_dimensions() {
        let err = AspectFill::new(Size::new(0.0, 1080.0), Size::new(390.0, 844.0)).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidDimensions { .. }));
        assert!(AspectFill::new(Size::new(10.0, 10.0), Size::new(10.0, -5.0)).is_err());
    }
}
