//! The ordered annotation set of one item, with validated mutators.
//!
//! Every mutator re-establishes the geometry invariant (`w > 0`, `h > 0`,
//! inside the item bounds) and reports whether anything changed, so the
//! history layer can skip no-op records.

use labeldesk_api::types::DbId;

use super::geometry::{Bounds, Rect};
use super::shape::Shape;

/// A partial update to one shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapePatch {
    /// Replace the box (ignored for polygons; move them with `translate`)
    pub rect: Option<Rect>,
    /// Move by an offset, stopping at the item edges
    pub translate: Option<(f32, f32)>,
    /// Reassign the class
    pub class_id: Option<DbId>,
    /// Set (`Some(Some(..))`) or clear (`Some(None)`) the note
    pub note: Option<Option<String>>,
    /// Set the approval flag
    pub approved: Option<bool>,
}

impl ShapePatch {
    pub fn translate(dx: f32, dy: f32) -> Self {
        Self {
            translate: Some((dx, dy)),
            ..Default::default()
        }
    }

    pub fn class(class_id: DbId) -> Self {
        Self {
            class_id: Some(class_id),
            ..Default::default()
        }
    }

    pub fn note(note: Option<String>) -> Self {
        Self {
            note: Some(note.filter(|n| !n.trim().is_empty())),
            ..Default::default()
        }
    }
}

/// Ordered shapes of one item; later shapes render on top.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeList {
    shapes: Vec<Shape>,
    bounds: Bounds,
}

impl ShapeList {
    /// Empty list for an item of the given size.
    pub fn new(bounds: Bounds) -> Self {
        Self {
            shapes: Vec::new(),
            bounds,
        }
    }

    /// Adopt shapes loaded from the backend, clipping anything out of bounds
    /// and dropping degenerate entries.
    pub fn from_loaded(bounds: Bounds, shapes: impl IntoIterator<Item = Shape>) -> Self {
        let shapes = shapes
            .into_iter()
            .filter_map(|mut shape| {
                if shape.clip_to(bounds) {
                    Some(shape)
                } else {
                    log::warn!("Dropping degenerate shape {:?} from backend", shape.id);
                    None
                }
            })
            .collect();
        Self { shapes, bounds }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn get(&self, index: usize) -> Option<&Shape> {
        self.shapes.get(index)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Append a shape after clipping it into bounds.
    pub fn add_shape(&mut self, mut shape: Shape) -> bool {
        if !shape.clip_to(self.bounds) {
            log::debug!("Rejected shape with no area after clipping");
            return false;
        }
        self.shapes.push(shape);
        true
    }

    /// Apply a patch to the shape at `index`.
    pub fn update_shape(&mut self, index: usize, patch: ShapePatch) -> bool {
        let bounds = self.bounds;
        let Some(current) = self.shapes.get(index) else {
            return false;
        };
        let mut next = current.clone();

        if let Some(rect) = patch.rect {
            if !next.is_polygon() {
                next.rect = rect;
            }
        }
        if let Some((dx, dy)) = patch.translate {
            next.translate_within(dx, dy, bounds);
        }
        if let Some(class_id) = patch.class_id {
            next.class_id = class_id;
        }
        if let Some(note) = patch.note {
            next.note = note;
        }
        if let Some(approved) = patch.approved {
            next.approved = approved;
        }
        if !next.clip_to(bounds) || next == *current {
            return false;
        }
        self.shapes[index] = next;
        true
    }

    /// Remove the shape at `index`.
    pub fn remove_shape(&mut self, index: usize) -> bool {
        if index < self.shapes.len() {
            self.shapes.remove(index);
            true
        } else {
            false
        }
    }

    /// Flip the approval flag of the shape at `index`.
    pub fn toggle_approved(&mut self, index: usize) -> bool {
        match self.shapes.get_mut(index) {
            Some(shape) => {
                shape.approved = !shape.approved;
                true
            }
            None => false,
        }
    }

    /// Index of the top-most shape containing the point.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<usize> {
        self.shapes.iter().rposition(|s| s.contains_point(x, y))
    }

    /// Replace server-assigned ids after a save; `stored` is in save order.
    pub fn adopt_ids(&mut self, stored: &[Shape]) {
        if stored.len() != self.shapes.len() {
            log::warn!(
                "Saved list has {} shapes, local has {}; ids not adopted",
                stored.len(),
                self.shapes.len()
            );
            return;
        }
        for (local, saved) in self.shapes.iter_mut().zip(stored) {
            local.id = saved.id;
        }
    }
}
