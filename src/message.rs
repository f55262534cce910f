//! Editor message and effect types.
//!
//! Every input, command and async completion reaches the editor as a
//! [`Message`]; the editor answers with [`Effect`]s describing the I/O it
//! wants performed. Async completions carry the generation of the item they
//! were started for so stale results can be dropped.

use std::time::Duration;

use chrono::{DateTime, Utc};
use image::RgbaImage;
use labeldesk_api::types::{AnnotationDto, DbId, LockRequest, UnlockRequest};

use crate::input::{Key, Modifiers, PointerEvent};
use crate::model::{Item, LabelClass, Shape};
use crate::tools::Tool;

/// Messages that can be sent to update editor state.
#[derive(Debug, Clone)]
pub enum Message {
    // Input
    /// Pointer event on the canvas
    Pointer(PointerEvent),
    /// Wheel notches at a screen position (positive zooms in)
    Wheel { delta: f32, x: f32, y: f32 },
    /// Key pressed
    Key { key: Key, modifiers: Modifiers },
    /// Canvas resized
    ViewResized { width: f32, height: f32 },

    // Commands
    /// Annotation tool selected
    SetTool(Tool),
    /// Active class selected by id
    SetActiveClass(DbId),
    /// Select a shape from the list
    SelectShape(Option<usize>),
    /// Reassign the class of the selected shape
    SetSelectedClass(DbId),
    /// Set or clear the note of the selected shape
    SetSelectedNote(Option<String>),
    /// Toggle approval of the selected shape
    ToggleApproved,
    /// Delete the selected shape
    DeleteSelected,
    /// Close the in-progress polygon
    FinishPolygon,
    /// Fit the image to the canvas
    FitView,
    Undo,
    Redo,
    Save,
    /// Navigate to previous item
    PrevItem,
    /// Navigate to next item
    NextItem,
    /// Navigate to the item at this index
    GotoItem(usize),
    /// Discard unsaved changes and perform the pending navigation
    ConfirmDiscard,
    /// Keep editing; drop the pending navigation
    CancelNavigation,

    // Async completions
    /// Item list for the dataset
    ItemsLoaded(Result<Vec<Item>, String>),
    /// Label classes for the project
    ClassesLoaded(Result<Vec<LabelClass>, String>),
    /// Shapes of the item entered at `generation`
    ShapesLoaded {
        generation: u64,
        result: Result<Vec<Shape>, String>,
    },
    /// Decoded image of `item_id`
    ImageLoaded {
        generation: u64,
        item_id: DbId,
        result: Result<RgbaImage, String>,
    },
    /// Acquire or renewal response
    LockResponse {
        generation: u64,
        result: Result<DateTime<Utc>, String>,
        received_at: DateTime<Utc>,
    },
    /// A renewal timer fired
    RenewalDue { generation: u64, seq: u64 },
    /// Save response; `result` holds the stored shapes in save order
    SaveCompleted {
        generation: u64,
        revision: u64,
        result: Result<Vec<Shape>, String>,
    },
}

/// I/O requested by the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fetch the dataset's items
    LoadItems { dataset_id: DbId },
    /// Fetch the project's label classes
    LoadClasses { project_id: DbId },
    /// A new item became current; per-item work from older generations is
    /// cancelled
    EnterItem { generation: u64, item_id: DbId },
    /// Fetch the item's shapes
    LoadShapes {
        generation: u64,
        item_id: DbId,
        annotation_set_id: DbId,
    },
    /// Fetch and decode the item's image
    LoadImage { generation: u64, item_id: DbId },
    /// Acquire or renew the lock
    AcquireLock {
        generation: u64,
        item_id: DbId,
        request: LockRequest,
    },
    /// Best-effort release; not tied to the current item
    ReleaseLock { item_id: DbId, request: UnlockRequest },
    /// Send `RenewalDue` after a delay
    ScheduleRenewal {
        generation: u64,
        seq: u64,
        after: Duration,
    },
    /// Replace the item's shapes on the server
    Save {
        generation: u64,
        revision: u64,
        item_id: DbId,
        annotation_set_id: DbId,
        shapes: Vec<AnnotationDto>,
    },
}
