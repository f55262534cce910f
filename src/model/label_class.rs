//! Label classes (annotation categories) supplied by the project.

use labeldesk_api::types::{DbId, LabelClassDto};

use crate::color_utils::{generated_color, parse_hex_color};

/// A label class with a display name and color. Read-only to the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelClass {
    /// Unique identifier for the class
    pub id: DbId,
    /// Display name of the class
    pub name: String,
    /// RGB display color
    pub color: [u8; 3],
    /// Position in the palette; hotkey `n` selects the class at index `n - 1`
    pub order_index: i32,
}

impl LabelClass {
    /// Create a new class with the given ID, name, and color.
    pub fn new(id: DbId, name: &str, color: [u8; 3]) -> Self {
        Self {
            id,
            name: name.to_string(),
            color,
            order_index: 0,
        }
    }
}

impl From<LabelClassDto> for LabelClass {
    fn from(dto: LabelClassDto) -> Self {
        let color = parse_hex_color(&dto.color).unwrap_or_else(|| generated_color(dto.id));
        Self {
            id: dto.id,
            name: dto.name,
            color,
            order_index: dto.order_index,
        }
    }
}

/// Sort classes into palette order (order index, then id).
pub fn palette_order(mut classes: Vec<LabelClass>) -> Vec<LabelClass> {
    classes.sort_by_key(|c| (c.order_index, c.id));
    classes
}
