//! Viewport mathematics.
//!
//! Converts between widget pixels and image pixels for a centered image that
//! the user may zoom and pan. Everything here is pure; callers pass the current
//! widget and image sizes so the auto-fit scale is re-derived on every call
//! instead of being cached across resizes.

use crate::constants::{AUTO_FIT_SENTINEL, MAX_SCALE, MIN_SCALE, ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR};
use crate::model::BBox;

/// A position in either widget or image space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either side is zero or negative.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// The zoom level that fits the whole image inside the widget, never enlarging it.
///
/// Degenerate sizes yield 1.0 so conversions stay finite.
pub fn auto_fit_scale(widget: Size, image: Size) -> f64 {
    if widget.is_empty() || image.is_empty() {
        return 1.0;
    }
    (widget.width / image.width)
        .min(widget.height / image.height)
        .min(1.0)
}

/// User-controlled zoom and pan.
///
/// `scale == 1.0` doubles as "not customized": while it holds that value the
/// auto-fit scale is used instead. An explicit 100% zoom is therefore
/// indistinguishable from auto-fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub scale: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl ViewportState {
    pub fn new(scale: f64, pan_x: f64, pan_y: f64) -> Self {
        Self {
            scale,
            pan_x,
            pan_y,
        }
    }

    /// Auto-fit with no pan.
    pub fn auto_fit() -> Self {
        Self::new(AUTO_FIT_SENTINEL, 0.0, 0.0)
    }

    pub fn is_auto_fit(&self) -> bool {
        self.scale == AUTO_FIT_SENTINEL
    }

    /// Return to auto-fit and drop any pan.
    pub fn reset(&mut self) {
        *self = Self::auto_fit();
    }

    /// The scale actually used for drawing and hit-testing.
    pub fn effective_scale(&self, widget: Size, image: Size) -> f64 {
        if self.is_auto_fit() {
            auto_fit_scale(widget, image)
        } else {
            self.scale
        }
    }

    /// Widget position of the image's top-left corner.
    pub fn image_origin(&self, widget: Size, image: Size) -> Point {
        let scale = self.effective_scale(widget, image);
        Point::new(
            (widget.width - image.width * scale) / 2.0 + self.pan_x,
            (widget.height - image.height * scale) / 2.0 + self.pan_y,
        )
    }

    /// Freeze the current state into a projection for the given sizes.
    pub fn projection(&self, widget: Size, image: Size) -> Projection {
        Projection {
            scale: self.effective_scale(widget, image),
            origin: self.image_origin(widget, image),
        }
    }

    /// Add a widget-space delta to the pan offset, then clamp it.
    pub fn pan_by(&mut self, dx: f64, dy: f64, widget: Size, image: Size) {
        self.pan_x += dx;
        self.pan_y += dy;
        self.clamp_pan(widget, image);
    }

    /// Keep the widget window inside the scaled image on axes where the image
    /// is larger than the widget; pin the other axes to zero.
    pub fn clamp_pan(&mut self, widget: Size, image: Size) {
        let scale = self.effective_scale(widget, image);
        self.pan_x = clamp_axis(self.pan_x, image.width * scale, widget.width);
        self.pan_y = clamp_axis(self.pan_y, image.height * scale, widget.height);
    }

    /// Zoom one wheel notch in or out, keeping the image point under `anchor` fixed.
    pub fn zoom_step(&mut self, zoom_in: bool, anchor: Point, widget: Size, image: Size) {
        let factor = if zoom_in {
            ZOOM_IN_FACTOR
        } else {
            ZOOM_OUT_FACTOR
        };
        let current = self.effective_scale(widget, image);
        let target = (current * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.zoom_to(target, anchor, widget, image);
    }

    /// Set an explicit scale, adjusting pan so the image point under `anchor`
    /// stays under `anchor`.
    pub fn zoom_to(&mut self, new_scale: f64, anchor: Point, widget: Size, image: Size) {
        let fixed = self.projection(widget, image).widget_to_image(anchor);
        self.scale = new_scale;

        // A scale that lands on the sentinel falls back to auto-fit, so solve
        // for pan with whatever scale will actually be applied.
        let applied = self.effective_scale(widget, image);
        self.pan_x = anchor.x - fixed.x * applied - (widget.width - image.width * applied) / 2.0;
        self.pan_y = anchor.y - fixed.y * applied - (widget.height - image.height * applied) / 2.0;

        log::trace!(
            "Zoom to {:.3} about ({:.1}, {:.1}), pan=({:.1}, {:.1})",
            applied,
            anchor.x,
            anchor.y,
            self.pan_x,
            self.pan_y
        );
    }
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::auto_fit()
    }
}

fn clamp_axis(offset: f64, scaled: f64, widget: f64) -> f64 {
    if scaled > widget {
        let max = (scaled - widget) / 2.0;
        offset.clamp(-max, max)
    } else {
        0.0
    }
}

/// A resolved scale and origin: the affine map between image and widget space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub scale: f64,
    pub origin: Point,
}

impl Projection {
    pub fn widget_to_image(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.origin.x) / self.scale,
            (p.y - self.origin.y) / self.scale,
        )
    }

    pub fn image_to_widget(&self, p: Point) -> Point {
        Point::new(
            p.x * self.scale + self.origin.x,
            p.y * self.scale + self.origin.y,
        )
    }

    /// Convert a widget-space movement into image pixels.
    pub fn delta_to_image(&self, dx: f64, dy: f64) -> (f64, f64) {
        (dx / self.scale, dy / self.scale)
    }

    /// On-screen rectangle of an image-space box.
    pub fn box_to_widget(&self, bbox: &BBox) -> BBox {
        let tl = self.image_to_widget(Point::new(bbox.x1, bbox.y1));
        let br = self.image_to_widget(Point::new(bbox.x2, bbox.y2));
        BBox::new(tl.x, tl.y, br.x, br.y)
    }
}
