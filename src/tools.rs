//! Tool state machine.
//!
//! Each tool has one reducer that maps a pointer event to exactly one
//! transition of the in-progress gesture and, at most, one [`ToolAction`] for
//! the editor to apply. Reducers never touch the shape list; the editor owns
//! the edit gate and the history.

use labeldesk_api::types::DbId;

use crate::constants::{DUPLICATE_VERTEX_DISTANCE, MIN_DRAG_DISTANCE, MIN_SHAPE_SIZE};
use crate::input::PointerEvent;
use crate::model::{Rect, Shape, ShapeList};
use crate::viewport::Viewport;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Drag the canvas
    Pan,
    /// Draw axis-aligned boxes
    #[default]
    DrawBox,
    /// Click vertices of a polygon
    DrawPolygon,
    /// Select and move shapes
    Select,
}

/// The gesture currently in progress. Coordinates are image space except for
/// panning, which works on screen deltas.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Box anchored at `anchor`, opposite corner at `current`
    Box {
        anchor: (f32, f32),
        current: (f32, f32),
    },
    /// Polygon vertices so far, plus the pointer for the rubber-band segment
    Polygon {
        vertices: Vec<(f32, f32)>,
        hover: Option<(f32, f32)>,
    },
    /// Moving the shape at `index`
    Drag {
        index: usize,
        origin: (f32, f32),
        current: (f32, f32),
    },
    /// Panning; last pointer position in screen pixels
    Pan { last: (f32, f32) },
}

impl Gesture {
    /// Check if we're currently in the middle of a gesture.
    pub fn is_active(&self) -> bool {
        !matches!(self, Gesture::Idle)
    }
}

/// Result of a reducer step for the editor to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    /// Nothing to apply
    None,
    /// Add this shape through the history
    Commit(Shape),
    /// Change the selection
    Select(Option<usize>),
    /// Move a shape by an image-space offset through the history
    Move { index: usize, dx: f32, dy: f32 },
    /// Translate the viewport by a screen offset
    Pan { dx: f32, dy: f32 },
}

/// What a reducer may read.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    pub shapes: &'a ShapeList,
    pub viewport: &'a Viewport,
    pub active_class: Option<DbId>,
    pub editable: bool,
}

/// Active tool plus its gesture.
#[derive(Debug, Clone, Default)]
pub struct ToolState {
    tool: Tool,
    gesture: Gesture,
}

impl ToolState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Switch tools, cancelling any in-progress gesture.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.gesture = Gesture::Idle;
        log::debug!("🖌️ Tool: {:?}", tool);
    }

    /// Abandon the current gesture. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.gesture.is_active();
        self.gesture = Gesture::Idle;
        if was_active {
            log::debug!("❌ Gesture cancelled");
        }
        was_active
    }

    /// Image-space offset of the shape being dragged, for previews.
    pub fn drag_offset(&self) -> Option<(usize, f32, f32)> {
        match self.gesture {
            Gesture::Drag {
                index,
                origin,
                current,
            } => Some((index, current.0 - origin.0, current.1 - origin.1)),
            _ => None,
        }
    }

    /// Feed one pointer event to the active tool's reducer.
    pub fn handle(&mut self, event: PointerEvent, ctx: &ToolContext<'_>) -> ToolAction {
        let (sx, sy) = event.position();
        let image = ctx.viewport.to_image_space(sx, sy);
        let gesture = std::mem::take(&mut self.gesture);
        let (next, action) = match self.tool {
            Tool::DrawBox => draw_box(gesture, event, image, ctx),
            Tool::DrawPolygon => draw_polygon(gesture, event, image, ctx),
            Tool::Select => select(gesture, event, image, ctx),
            Tool::Pan => pan(gesture, event, (sx, sy)),
        };
        self.gesture = next;
        action
    }

    /// Close the in-progress polygon (Enter / finish button).
    pub fn finish_polygon(&mut self, ctx: &ToolContext<'_>) -> ToolAction {
        match std::mem::take(&mut self.gesture) {
            Gesture::Polygon { vertices, .. } => close_polygon(&vertices, ctx),
            other => {
                self.gesture = other;
                ToolAction::None
            }
        }
    }
}

type Step = (Gesture, ToolAction);

fn draw_box(gesture: Gesture, event: PointerEvent, at: (f32, f32), ctx: &ToolContext<'_>) -> Step {
    match (gesture, event) {
        (Gesture::Idle, PointerEvent::Down { .. }) if ctx.editable => {
            log::debug!("✏️ Started box at ({:.1}, {:.1})", at.0, at.1);
            (
                Gesture::Box {
                    anchor: at,
                    current: at,
                },
                ToolAction::None,
            )
        }
        (Gesture::Box { anchor, .. }, PointerEvent::Move { .. }) => (
            Gesture::Box {
                anchor,
                current: at,
            },
            ToolAction::None,
        ),
        (Gesture::Box { anchor, .. }, PointerEvent::Up { .. }) => {
            (Gesture::Idle, close_box(anchor, at, ctx))
        }
        (gesture, _) => (gesture, ToolAction::None),
    }
}

fn close_box(anchor: (f32, f32), corner: (f32, f32), ctx: &ToolContext<'_>) -> ToolAction {
    let Some(class_id) = ctx.active_class else {
        log::debug!("📝 No active class; box discarded");
        return ToolAction::None;
    };
    let rect = Rect::from_corners(anchor.0, anchor.1, corner.0, corner.1);
    let clipped = rect.clip(ctx.shapes.bounds());
    match clipped {
        Some(rect) if rect.meets_min_size(MIN_SHAPE_SIZE) => {
            ToolAction::Commit(Shape::boxed(class_id, rect))
        }
        _ => {
            log::debug!(
                "📝 Box {:.1}x{:.1} below minimum size; discarded",
                rect.w,
                rect.h
            );
            ToolAction::None
        }
    }
}

fn draw_polygon(
    gesture: Gesture,
    event: PointerEvent,
    at: (f32, f32),
    ctx: &ToolContext<'_>,
) -> Step {
    match (gesture, event) {
        (Gesture::Idle, PointerEvent::Down { .. }) if ctx.editable => {
            log::debug!("✏️ Started polygon at ({:.1}, {:.1})", at.0, at.1);
            (
                Gesture::Polygon {
                    vertices: vec![at],
                    hover: None,
                },
                ToolAction::None,
            )
        }
        (Gesture::Polygon { mut vertices, .. }, PointerEvent::Down { .. }) => {
            push_vertex(&mut vertices, at);
            (
                Gesture::Polygon {
                    vertices,
                    hover: None,
                },
                ToolAction::None,
            )
        }
        (Gesture::Polygon { vertices, .. }, PointerEvent::Move { .. }) => (
            Gesture::Polygon {
                vertices,
                hover: Some(at),
            },
            ToolAction::None,
        ),
        (Gesture::Polygon { mut vertices, .. }, PointerEvent::DoubleClick { .. }) => {
            push_vertex(&mut vertices, at);
            (Gesture::Idle, close_polygon(&vertices, ctx))
        }
        (gesture, _) => (gesture, ToolAction::None),
    }
}

/// Append a vertex unless it repeats the previous one (double-click sends the
/// same position twice).
fn push_vertex(vertices: &mut Vec<(f32, f32)>, at: (f32, f32)) {
    if let Some(&(lx, ly)) = vertices.last() {
        if (lx - at.0).hypot(ly - at.1) < DUPLICATE_VERTEX_DISTANCE {
            return;
        }
    }
    vertices.push(at);
    log::debug!(
        "✏️ Added polygon point at ({:.1}, {:.1}), total: {}",
        at.0,
        at.1,
        vertices.len()
    );
}

fn close_polygon(vertices: &[(f32, f32)], ctx: &ToolContext<'_>) -> ToolAction {
    let Some(class_id) = ctx.active_class else {
        log::debug!("📝 No active class; polygon discarded");
        return ToolAction::None;
    };
    match Shape::polygon(class_id, vertices, ctx.shapes.bounds()) {
        Some(shape) => ToolAction::Commit(shape),
        None => {
            log::debug!(
                "📝 Polygon with {} vertices discarded",
                vertices.len()
            );
            ToolAction::None
        }
    }
}

fn select(gesture: Gesture, event: PointerEvent, at: (f32, f32), ctx: &ToolContext<'_>) -> Step {
    match (gesture, event) {
        (Gesture::Idle, PointerEvent::Down { .. }) => match ctx.shapes.hit_test(at.0, at.1) {
            Some(index) => {
                let next = if ctx.editable {
                    Gesture::Drag {
                        index,
                        origin: at,
                        current: at,
                    }
                } else {
                    Gesture::Idle
                };
                log::debug!("🔍 Selected shape {}", index);
                (next, ToolAction::Select(Some(index)))
            }
            None => (Gesture::Idle, ToolAction::Select(None)),
        },
        (Gesture::Drag { index, origin, .. }, PointerEvent::Move { .. }) => {
            log::trace!("Dragging shape {} to ({:.1}, {:.1})", index, at.0, at.1);
            (
                Gesture::Drag {
                    index,
                    origin,
                    current: at,
                },
                ToolAction::None,
            )
        }
        (Gesture::Drag { index, origin, .. }, PointerEvent::Up { .. }) => {
            let (dx, dy) = (at.0 - origin.0, at.1 - origin.1);
            if dx.hypot(dy) < MIN_DRAG_DISTANCE {
                (Gesture::Idle, ToolAction::None)
            } else {
                (Gesture::Idle, ToolAction::Move { index, dx, dy })
            }
        }
        (gesture, _) => (gesture, ToolAction::None),
    }
}

fn pan(gesture: Gesture, event: PointerEvent, screen: (f32, f32)) -> Step {
    match (gesture, event) {
        (Gesture::Idle, PointerEvent::Down { .. }) => {
            (Gesture::Pan { last: screen }, ToolAction::None)
        }
        (Gesture::Pan { last }, PointerEvent::Move { .. }) => (
            Gesture::Pan { last: screen },
            ToolAction::Pan {
                dx: screen.0 - last.0,
                dy: screen.1 - last.1,
            },
        ),
        (Gesture::Pan { .. }, PointerEvent::Up { .. }) => (Gesture::Idle, ToolAction::None),
        (gesture, _) => (gesture, ToolAction::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Bounds;

    struct Fixture {
        shapes: ShapeList,
        viewport: Viewport,
        editable: bool,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                shapes: ShapeList::new(Bounds::new(800.0, 600.0)),
                viewport: Viewport::identity(),
                editable: true,
            }
        }

        fn ctx(&self) -> ToolContext<'_> {
            ToolContext {
                shapes: &self.shapes,
                viewport: &self.viewport,
                active_class: Some(7),
                editable: self.editable,
            }
        }
    }

    fn down(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Down { x, y }
    }
    fn mv(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Move { x, y }
    }
    fn up(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Up { x, y }
    }

    #[test]
    fn initial_tool_is_draw_box() {
        assert_eq!(ToolState::new().tool(), Tool::DrawBox);
    }

    #[test]
    fn box_drag_commits_normalized_rect() {
        let f = Fixture::new();
        let mut tools = ToolState::new();
        tools.handle(down(300.0, 250.0), &f.ctx());
        tools.handle(mv(200.0, 200.0), &f.ctx());
        let action = tools.handle(up(100.0, 100.0), &f.ctx());
        let ToolAction::Commit(shape) = action else {
            panic!("expected commit, got {:?}", action);
        };
        assert_eq!(shape.rect, Rect::new(100.0, 100.0, 200.0, 150.0));
        assert_eq!(shape.class_id, 7);
        assert!(!tools.gesture().is_active());
    }

    #[test]
    fn tiny_box_commits_nothing() {
        let f = Fixture::new();
        let mut tools = ToolState::new();
        tools.handle(down(10.0, 10.0), &f.ctx());
        assert_eq!(tools.handle(up(13.0, 40.0), &f.ctx()), ToolAction::None);
    }

    #[test]
    fn box_past_edge_is_clipped() {
        let f = Fixture::new();
        let mut tools = ToolState::new();
        tools.handle(down(700.0, 500.0), &f.ctx());
        let ToolAction::Commit(shape) = tools.handle(up(900.0, 700.0), &f.ctx()) else {
            panic!("expected commit");
        };
        assert_eq!(shape.rect, Rect::new(700.0, 500.0, 100.0, 100.0));
    }

    #[test]
    fn read_only_suppresses_drawing() {
        let mut f = Fixture::new();
        f.editable = false;
        let mut tools = ToolState::new();
        tools.handle(down(10.0, 10.0), &f.ctx());
        assert_eq!(tools.handle(up(100.0, 100.0), &f.ctx()), ToolAction::None);
    }

    #[test]
    fn polygon_double_click_closes_with_envelope() {
        let f = Fixture::new();
        let mut tools = ToolState::new();
        tools.set_tool(Tool::DrawPolygon);
        tools.handle(down(10.0, 10.0), &f.ctx());
        tools.handle(down(50.0, 10.0), &f.ctx());
        tools.handle(down(30.0, 40.0), &f.ctx());
        let action = tools.handle(PointerEvent::DoubleClick { x: 30.0, y: 40.0 }, &f.ctx());
        let ToolAction::Commit(shape) = action else {
            panic!("expected commit");
        };
        assert_eq!(shape.rect, Rect::new(10.0, 10.0, 40.0, 30.0));
        assert_eq!(
            shape.polygon.as_deref(),
            Some(&[10.0, 10.0, 50.0, 10.0, 30.0, 40.0][..])
        );
    }

    #[test]
    fn polygon_with_two_vertices_is_discarded() {
        let f = Fixture::new();
        let mut tools = ToolState::new();
        tools.set_tool(Tool::DrawPolygon);
        tools.handle(down(10.0, 10.0), &f.ctx());
        tools.handle(down(50.0, 10.0), &f.ctx());
        assert_eq!(tools.finish_polygon(&f.ctx()), ToolAction::None);
        assert!(!tools.gesture().is_active());
    }

    #[test]
    fn escape_cancels_polygon() {
        let f = Fixture::new();
        let mut tools = ToolState::new();
        tools.set_tool(Tool::DrawPolygon);
        tools.handle(down(10.0, 10.0), &f.ctx());
        assert!(tools.cancel());
        assert!(!tools.cancel());
    }

    #[test]
    fn select_drag_reports_single_move() {
        let mut f = Fixture::new();
        f.shapes
            .add_shape(Shape::boxed(1, Rect::new(100.0, 100.0, 200.0, 150.0)));
        let mut tools = ToolState::new();
        tools.set_tool(Tool::Select);
        assert_eq!(
            tools.handle(down(150.0, 150.0), &f.ctx()),
            ToolAction::Select(Some(0))
        );
        tools.handle(mv(100.0, 150.0), &f.ctx());
        assert_eq!(tools.drag_offset(), Some((0, -50.0, 0.0)));
        assert_eq!(
            tools.handle(up(0.0, 150.0), &f.ctx()),
            ToolAction::Move {
                index: 0,
                dx: -150.0,
                dy: 0.0
            }
        );
    }

    #[test]
    fn select_click_on_empty_clears() {
        let f = Fixture::new();
        let mut tools = ToolState::new();
        tools.set_tool(Tool::Select);
        assert_eq!(
            tools.handle(down(5.0, 5.0), &f.ctx()),
            ToolAction::Select(None)
        );
    }

    #[test]
    fn pan_reports_screen_deltas() {
        let mut f = Fixture::new();
        f.viewport = Viewport::new(2.0, 10.0, 10.0);
        let mut tools = ToolState::new();
        tools.set_tool(Tool::Pan);
        tools.handle(down(100.0, 100.0), &f.ctx());
        assert_eq!(
            tools.handle(mv(110.0, 95.0), &f.ctx()),
            ToolAction::Pan { dx: 10.0, dy: -5.0 }
        );
        assert_eq!(tools.handle(up(110.0, 95.0), &f.ctx()), ToolAction::None);
    }
}
