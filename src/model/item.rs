//! Dataset items as seen by the editor.

use labeldesk_api::types::{DbId, ItemDto};

use super::geometry::Bounds;

/// Which split an item belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Split {
    #[default]
    Train,
    Val,
    Test,
    /// Any other label the backend uses, kept verbatim
    Other(String),
}

impl Split {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "" | "train" => Split::Train,
            "val" | "valid" | "validation" => Split::Val,
            "test" => Split::Test,
            _ => Split::Other(raw.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
            Split::Other(s) => s,
        }
    }
}

/// One image unit. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: DbId,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub split: Split,
}

impl Item {
    pub fn new(id: DbId, file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id,
            file_name: file_name.into(),
            width,
            height,
            split: Split::default(),
        }
    }

    /// Pixel extent used to clip shapes.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width as f32, self.height as f32)
    }
}

impl From<ItemDto> for Item {
    fn from(dto: ItemDto) -> Self {
        Self {
            id: dto.id,
            file_name: dto.file_name,
            width: dto.width,
            height: dto.height,
            split: Split::parse(&dto.split),
        }
    }
}
