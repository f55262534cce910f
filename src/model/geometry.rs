//! Axis-aligned geometry in image pixel space.

/// Pixel extent of the item a shape belongs to.
///
/// Valid positions are `[0, width] x [0, height]`; a box touching the right
/// edge has `x + w == width`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Clamp a point into the bounds.
    pub fn clamp_point(&self, x: f32, y: f32) -> (f32, f32) {
        (x.clamp(0.0, self.width.max(0.0)), y.clamp(0.0, self.height.max(0.0)))
    }
}

/// Axis-aligned rectangle: top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Normalized rectangle spanned by two corners in any order.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            w: (x2 - x1).abs(),
            h: (y2 - y1).abs(),
        }
    }

    /// Axis-aligned envelope of a set of points; `None` for an empty set.
    pub fn envelope(points: &[(f32, f32)]) -> Option<Self> {
        let (&(fx, fy), rest) = points.split_first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (fx, fy, fx, fy);
        for &(x, y) in rest {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self::from_corners(min_x, min_y, max_x, max_y))
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Both dimensions strictly positive.
    pub fn is_valid(&self) -> bool {
        self.w > 0.0 && self.h > 0.0
    }

    /// Both dimensions at least `min`.
    pub fn meets_min_size(&self, min: f32) -> bool {
        self.w >= min && self.h >= min
    }

    /// Intersect with the item bounds. `None` when nothing positive remains.
    pub fn clip(&self, bounds: Bounds) -> Option<Self> {
        let (x1, y1) = bounds.clamp_point(self.x, self.y);
        let (x2, y2) = bounds.clamp_point(self.right(), self.bottom());
        let clipped = Self::from_corners(x1, y1, x2, y2);
        clipped.is_valid().then_some(clipped)
    }

    /// Move by `(dx, dy)` keeping the size, stopping at the item edges.
    ///
    /// A rectangle larger than the bounds is pinned to the origin on that axis.
    pub fn translate_within(&self, dx: f32, dy: f32, bounds: Bounds) -> Self {
        let max_x = (bounds.width - self.w).max(0.0);
        let max_y = (bounds.height - self.h).max(0.0);
        Self {
            x: (self.x + dx).clamp(0.0, max_x),
            y: (self.y + dy).clamp(0.0, max_y),
            w: self.w,
            h: self.h,
        }
    }

    /// Inclusive point containment.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEM: Bounds = Bounds {
        width: 800.0,
        height: 600.0,
    };

    #[test]
    fn from_corners_normalizes() {
        let r = Rect::from_corners(300.0, 250.0, 100.0, 100.0);
        assert_eq!(r, Rect::new(100.0, 100.0, 200.0, 150.0));
    }

    #[test]
    fn clip_trims_overhang() {
        let r = Rect::new(-20.0, 550.0, 100.0, 100.0).clip(ITEM).unwrap();
        assert_eq!(r, Rect::new(0.0, 550.0, 80.0, 50.0));
        assert!(r.right() <= ITEM.width && r.bottom() <= ITEM.height);
    }

    #[test]
    fn clip_outside_is_none() {
        assert!(Rect::new(900.0, 10.0, 50.0, 50.0).clip(ITEM).is_none());
    }

    #[test]
    fn translate_stops_at_edges() {
        let r = Rect::new(100.0, 100.0, 200.0, 150.0);
        assert_eq!(r.translate_within(-150.0, 0.0, ITEM).x, 0.0);
        let far = r.translate_within(1000.0, 1000.0, ITEM);
        assert_eq!((far.x, far.y), (600.0, 450.0));
    }

    #[test]
    fn envelope_of_triangle() {
        let r = Rect::envelope(&[(10.0, 10.0), (50.0, 10.0), (30.0, 40.0)]).unwrap();
        assert_eq!(r, Rect::new(10.0, 10.0, 40.0, 30.0));
        assert!(Rect::envelope(&[]).is_none());
    }
}
