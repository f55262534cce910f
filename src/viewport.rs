//! Canvas viewport: pan/zoom mapping between screen and image space.
//!
//! Screen coordinates are canvas-local pixels (origin at the canvas top-left).
//! Image coordinates are pixels of the current item.
//!
//! `screen = image * scale + translation`

use crate::constants::zoom;

/// Pan/zoom state of the canvas. Ephemeral, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Viewport {
    /// Create a viewport with the given scale and translation.
    pub fn new(scale: f32, tx: f32, ty: f32) -> Self {
        Self { scale, tx, ty }
    }

    /// Identity viewport (scale 1, no translation).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Map a pointer position to image space.
    pub fn to_image_space(&self, px: f32, py: f32) -> (f32, f32) {
        ((px - self.tx) / self.scale, (py - self.ty) / self.scale)
    }

    /// Map an image-space point to the screen.
    pub fn to_screen_space(&self, ix: f32, iy: f32) -> (f32, f32) {
        (ix * self.scale + self.tx, iy * self.scale + self.ty)
    }

    /// Fit an image into the viewport minus `padding` on every side.
    ///
    /// The scale is clamped to the zoom bounds and the translation is reset
    /// to the padding origin.
    pub fn fit_to_view(
        item_width: f32,
        item_height: f32,
        view_width: f32,
        view_height: f32,
        padding: f32,
    ) -> Self {
        let avail_w = (view_width - 2.0 * padding).max(1.0);
        let avail_h = (view_height - 2.0 * padding).max(1.0);
        let scale = if item_width > 0.0 && item_height > 0.0 {
            (avail_w / item_width).min(avail_h / item_height)
        } else {
            1.0
        };
        Self::new(clamp_scale(scale), padding, padding)
    }

    /// Zoom by `factor`, keeping the image point under the pointer fixed.
    ///
    /// 1. Find the image-space point under the cursor
    /// 2. After scaling, solve the translation that puts it back under the cursor
    pub fn zoom_at(&self, pointer_x: f32, pointer_y: f32, factor: f32) -> Self {
        let new_scale = clamp_scale(self.scale * factor);
        let (img_x, img_y) = self.to_image_space(pointer_x, pointer_y);
        Self {
            scale: new_scale,
            tx: pointer_x - img_x * new_scale,
            ty: pointer_y - img_y * new_scale,
        }
    }

    /// Apply a screen-space pan delta.
    pub fn pan_by(&self, dx: f32, dy: f32) -> Self {
        Self {
            scale: self.scale,
            tx: self.tx + dx,
            ty: self.ty + dy,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::identity()
    }
}

fn clamp_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale.clamp(zoom::MIN, zoom::MAX)
    } else {
        1.0
    }
}
