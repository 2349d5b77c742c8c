/// Display-surface geometry and the display → source transform
///
/// The preview is always stretched to fill the display box, so the x and y
/// scale factors are independent and aspect ratio is not preserved.

use super::data::SourceRect;

/// Size of the rendering surface in display pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayGeometry {
    pub width: f32,
    pub height: f32,
}

impl DisplayGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Axis-aligned rectangle in display-surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl OverlayRect {
    /// Normalize two corners into a rectangle
    pub fn from_corners(a: (f32, f32), b: (f32, f32)) -> Self {
        Self {
            left: a.0.min(b.0),
            top: a.1.min(b.1),
            right: a.0.max(b.0),
            bottom: a.1.max(b.1),
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Live pointer drag, from pointer-down until pointer-up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub start: (f32, f32),
    pub current: (f32, f32),
}

impl DragState {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            start: (x, y),
            current: (x, y),
        }
    }

    pub fn update(&mut self, x: f32, y: f32) {
        self.current = (x, y);
    }

    pub fn overlay(&self) -> OverlayRect {
        OverlayRect::from_corners(self.start, self.current)
    }
}

/// Map a drag from display space into source-image pixels.
///
/// `native` is the decoded image size, `surface` the size of the box the
/// preview is currently rendered into. Returns `None` for a selection with
/// no area (a click without a drag). Corners dragged past the surface edge
/// are clamped to the image.
pub fn to_source_rect(
    start: (f32, f32),
    end: (f32, f32),
    native: (u32, u32),
    surface: DisplayGeometry,
) -> Option<SourceRect> {
    let (width, height) = native;
    if width == 0 || height == 0 || surface.is_empty() {
        return None;
    }

    let sx = f64::from(width) / f64::from(surface.width);
    let sy = f64::from(height) / f64::from(surface.height);

    let (x0, y0) = (f64::from(start.0), f64::from(start.1));
    let (x1, y1) = (f64::from(end.0), f64::from(end.1));

    let left = (x0.min(x1) * sx).floor() as i64;
    let top = (y0.min(y1) * sy).floor() as i64;
    let right = (x0.max(x1) * sx).floor() as i64;
    let bottom = (y0.max(y1) * sy).floor() as i64;

    if right <= left || bottom <= top {
        return None;
    }

    let (w, h) = (i64::from(width), i64::from(height));
    let rect = SourceRect {
        left: left.clamp(0, w - 1) as u32,
        top: top.clamp(0, h - 1) as u32,
        right: right.clamp(1, w) as u32,
        bottom: bottom.clamp(1, h) as u32,
    };

    // Both corners past the same edge collapse to nothing after clamping
    if rect.right <= rect.left || rect.bottom <= rect.top {
        return None;
    }

    Some(rect)
}
