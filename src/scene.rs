//! Render description of the editor canvas.
//!
//! The editor does not draw. It produces a [`Scene`] in screen pixels that a
//! UI layer renders on top of the item image.

/// A shape to stroke on the canvas, in screen pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneShape {
    /// An axis-aligned rectangle.
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    /// A polygon or an open polyline.
    Polygon {
        vertices: Vec<(f32, f32)>,
        closed: bool,
    },
}

/// A shape with styling.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneItem {
    pub shape: SceneShape,
    /// Stroke color (class color)
    pub color: [u8; 3],
    /// Stroke width in screen pixels
    pub stroke: f32,
    /// Whether this item is selected
    pub selected: bool,
    /// Whether the shape is approved
    pub approved: bool,
}

impl SceneItem {
    /// Create a new scene item.
    pub fn new(shape: SceneShape, color: [u8; 3], stroke: f32) -> Self {
        Self {
            shape,
            color,
            stroke,
            selected: false,
            approved: false,
        }
    }

    /// Mark this item as selected.
    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Mark this item as approved.
    pub fn approved(mut self, approved: bool) -> Self {
        self.approved = approved;
        self
    }
}

/// Where the item image lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Severity of the status banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerLevel {
    Info,
    Warning,
    Error,
}

/// The persistent status line above the canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub level: BannerLevel,
    pub text: String,
}

impl Banner {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: BannerLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: BannerLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: BannerLevel::Error,
            text: text.into(),
        }
    }
}

/// Everything needed to draw one frame of the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Image placement, `None` until the image has decoded
    pub image: Option<ImagePlacement>,
    /// Committed shapes in draw order
    pub items: Vec<SceneItem>,
    /// Shape under construction or being dragged
    pub preview: Option<SceneItem>,
    pub banner: Banner,
}

impl Scene {
    /// Check if there is nothing to draw besides the banner.
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.items.is_empty() && self.preview.is_none()
    }
}
