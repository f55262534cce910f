//! Data models for the labeldesk editor.

mod document;
mod geometry;
mod item;
mod label_class;
mod shape;
mod shape_list;

pub use document::ShapeDocument;
pub use geometry::{Bounds, Rect};
pub use item::{Item, Split};
pub use label_class::{LabelClass, palette_order};
pub use shape::Shape;
pub use shape_list::{ShapeList, ShapePatch};
