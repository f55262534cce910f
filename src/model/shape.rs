//! Annotation shapes: axis-aligned boxes and simple polygons.

use labeldesk_api::types::{AnnotationAttributes, AnnotationDto, DbId};

use super::geometry::{Bounds, Rect};
use crate::constants::MIN_POLYGON_VERTICES;

/// One annotation on an item.
///
/// `rect` is always the box used for list display and hit context; for
/// polygon shapes it is the envelope of `polygon`.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Backend id, absent until the first save
    pub id: Option<DbId>,
    /// Label class
    pub class_id: DbId,
    /// Bounding geometry in image pixels
    pub rect: Rect,
    /// Model confidence, present only for machine-generated shapes
    pub confidence: Option<f32>,
    /// Reviewer approval
    pub approved: bool,
    /// Free-text note
    pub note: Option<String>,
    /// Flattened `x, y` vertex list when drawn with the polygon tool
    pub polygon: Option<Vec<f32>>,
    /// Attribute keys the editor does not interpret
    pub extra_attributes: serde_json::Map<String, serde_json::Value>,
}

impl Shape {
    /// A human-drawn box.
    pub fn boxed(class_id: DbId, rect: Rect) -> Self {
        Self {
            id: None,
            class_id,
            rect,
            confidence: None,
            approved: false,
            note: None,
            polygon: None,
            extra_attributes: serde_json::Map::new(),
        }
    }

    /// A human-drawn polygon; vertices are clamped into `bounds` and the box
    /// becomes their envelope.
    ///
    /// Returns `None` for fewer than three vertices or a degenerate envelope.
    pub fn polygon(class_id: DbId, vertices: &[(f32, f32)], bounds: Bounds) -> Option<Self> {
        if vertices.len() < MIN_POLYGON_VERTICES {
            return None;
        }
        let clamped: Vec<(f32, f32)> = vertices
            .iter()
            .map(|&(x, y)| bounds.clamp_point(x, y))
            .collect();
        let rect = Rect::envelope(&clamped).filter(Rect::is_valid)?;
        let flat = clamped.iter().flat_map(|&(x, y)| [x, y]).collect();
        Some(Self {
            polygon: Some(flat),
            ..Self::boxed(class_id, rect)
        })
    }

    pub fn is_polygon(&self) -> bool {
        self.polygon.is_some()
    }

    /// Polygon vertices as pairs; empty for boxes.
    pub fn vertices(&self) -> Vec<(f32, f32)> {
        self.polygon
            .as_deref()
            .unwrap_or_default()
            .chunks_exact(2)
            .map(|p| (p[0], p[1]))
            .collect()
    }

    /// Check if a point is inside this shape.
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        if !self.rect.contains(x, y) {
            return false;
        }
        let vertices = self.vertices();
        if vertices.len() < MIN_POLYGON_VERTICES {
            return true;
        }
        // Ray casting
        let mut inside = false;
        let mut j = vertices.len() - 1;
        for i in 0..vertices.len() {
            let (xi, yi) = vertices[i];
            let (xj, yj) = vertices[j];
            if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Move by `(dx, dy)` stopping at the item edges. Polygon vertices move by
    /// the same, possibly reduced, offset as the box.
    pub fn translate_within(&mut self, dx: f32, dy: f32, bounds: Bounds) {
        let moved = self.rect.translate_within(dx, dy, bounds);
        let (adx, ady) = (moved.x - self.rect.x, moved.y - self.rect.y);
        self.rect = moved;
        if let Some(points) = &mut self.polygon {
            for pair in points.chunks_exact_mut(2) {
                pair[0] += adx;
                pair[1] += ady;
            }
        }
    }

    /// Re-establish the geometry invariant after an edit.
    ///
    /// Returns `false` when nothing with positive area is left.
    pub fn clip_to(&mut self, bounds: Bounds) -> bool {
        if let Some(points) = &mut self.polygon {
            for pair in points.chunks_exact_mut(2) {
                let (x, y) = bounds.clamp_point(pair[0], pair[1]);
                pair[0] = x;
                pair[1] = y;
            }
            match Rect::envelope(&self.vertices()).filter(Rect::is_valid) {
                Some(envelope) => {
                    self.rect = envelope;
                    return true;
                }
                None => return false,
            }
        }
        match self.rect.clip(bounds) {
            Some(rect) => {
                self.rect = rect;
                true
            }
            None => false,
        }
    }

    /// Build from the wire representation.
    pub fn from_dto(dto: AnnotationDto) -> Self {
        let attrs = dto.attributes.unwrap_or_default();
        let polygon = attrs
            .polygon
            .filter(|p| p.len() >= MIN_POLYGON_VERTICES * 2 && p.len() % 2 == 0)
            .map(|p| p.into_iter().map(|v| v as f32).collect());
        Self {
            id: dto.id,
            class_id: dto.class_id,
            rect: Rect::new(dto.x as f32, dto.y as f32, dto.w as f32, dto.h as f32),
            confidence: dto.confidence.map(|c| c as f32),
            approved: dto.approved,
            note: attrs.note.filter(|n| !n.is_empty()),
            polygon,
            extra_attributes: attrs.extra,
        }
    }

    /// Convert to the wire representation.
    pub fn to_dto(&self) -> AnnotationDto {
        let attributes = AnnotationAttributes {
            note: self.note.clone(),
            polygon: self
                .polygon
                .as_ref()
                .map(|p| p.iter().map(|&v| f64::from(v)).collect()),
            extra: self.extra_attributes.clone(),
        };
        AnnotationDto {
            id: self.id,
            class_id: self.class_id,
            x: f64::from(self.rect.x),
            y: f64::from(self.rect.y),
            w: f64::from(self.rect.w),
            h: f64::from(self.rect.h),
            confidence: self.confidence.map(f64::from),
            approved: self.approved,
            attributes: (!attributes.is_empty()).then_some(attributes),
        }
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
    fn polygon_envelope_and_flattened_vertices() {
        let shape = Shape::polygon(1, &[(10.0, 10.0), (50.0, 10.0), (30.0, 40.0)], ITEM).unwrap();
        assert_eq!(shape.rect, Rect::new(10.0, 10.0, 40.0, 30.0));
        assert_eq!(
            shape.polygon.as_deref(),
            Some(&[10.0, 10.0, 50.0, 10.0, 30.0, 40.0][..])
        );
    }

    #[test]
    fn polygon_needs_three_vertices() {
        assert!(Shape::polygon(1, &[(10.0, 10.0), (50.0, 10.0)], ITEM).is_none());
    }

    #[test]
    fn collinear_polygon_is_rejected() {
        assert!(Shape::polygon(1, &[(10.0, 10.0), (20.0, 10.0), (30.0, 10.0)], ITEM).is_none());
    }

    #[test]
    fn polygon_vertices_are_clamped() {
        let shape =
            Shape::polygon(1, &[(-10.0, 10.0), (900.0, 10.0), (30.0, 700.0)], ITEM).unwrap();
        assert_eq!(shape.rect, Rect::new(0.0, 10.0, 800.0, 590.0));
    }

    #[test]
    fn point_in_polygon_uses_vertices() {
        let shape = Shape::polygon(1, &[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)], ITEM).unwrap();
        assert!(shape.contains_point(10.0, 10.0));
        // Inside the envelope but outside the triangle
        assert!(!shape.contains_point(90.0, 90.0));
    }

    #[test]
    fn translate_moves_polygon_vertices_by_clamped_offset() {
        let mut shape =
            Shape::polygon(1, &[(10.0, 10.0), (50.0, 10.0), (30.0, 40.0)], ITEM).unwrap();
        shape.translate_within(-100.0, 5.0, ITEM);
        assert_eq!(shape.rect.x, 0.0);
        assert_eq!(shape.rect.y, 15.0);
        assert_eq!(shape.vertices()[0], (0.0, 15.0));
    }

    #[test]
    fn dto_roundtrip_keeps_note_polygon_and_extra() {
        let mut shape = Shape::polygon(4, &[(1.0, 1.0), (9.0, 1.0), (5.0, 9.0)], ITEM).unwrap();
        shape.note = Some("occluded".into());
        shape
            .extra_attributes
            .insert("source".into(), serde_json::Value::String("model".into()));
        shape.id = Some(12);

        let back = Shape::from_dto(shape.to_dto());
        assert_eq!(back, shape);
    }

    #[test]
    fn plain_box_has_no_attributes_on_wire() {
        let dto = Shape::boxed(1, Rect::new(0.0, 0.0, 10.0, 10.0)).to_dto();
        assert!(dto.attributes.is_none());
        assert!(dto.confidence.is_none());
    }

    #[test]
    fn malformed_polygon_attribute_is_dropped() {
        let mut dto = Shape::boxed(1, Rect::new(0.0, 0.0, 10.0, 10.0)).to_dto();
        dto.attributes = Some(AnnotationAttributes {
            polygon: Some(vec![1.0, 2.0, 3.0]),
            ..Default::default()
        });
        assert!(Shape::from_dto(dto).polygon.is_none());
    }
}
