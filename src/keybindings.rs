//! Keyboard bindings for the editor.
//!
//! Bindings are a layer independent of the active tool: the same key does the
//! same thing whichever tool is selected. Letter keys are matched
//! case-insensitively.

use serde::{Deserialize, Serialize};

use crate::constants::nudge;
use crate::input::{Key, Modifiers};
use crate::tools::Tool;

/// Maximum number of label classes that can have hotkeys (1-9 keys).
pub const MAX_CLASS_HOTKEYS: usize = 9;

/// Editor command produced by a key press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    PrevItem,
    NextItem,
    /// Activate the class at this palette index (0-based)
    SelectClass(usize),
    DeleteSelected,
    Save,
    Undo,
    Redo,
    SetTool(Tool),
    /// Move the selected shape by an offset in image pixels
    Nudge { dx: f32, dy: f32 },
    ToggleApproved,
    FitView,
    FinishPolygon,
    Cancel,
}

/// Letter hotkeys for the tools and the approval toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    /// Hotkey for Select tool
    pub tool_select: char,
    /// Hotkey for box tool
    pub tool_box: char,
    /// Hotkey for Polygon tool
    pub tool_polygon: char,
    /// Hotkey for Pan tool
    pub tool_pan: char,
    /// Toggle approval of the selected shape
    pub toggle_approved: char,
    /// Fit the image to the viewport
    pub fit_view: char,
    /// Nudge keys: up, left, down, right
    pub nudge: [char; 4],
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            tool_select: 'v',
            tool_box: 'b',
            tool_polygon: 'p',
            tool_pan: 'h',
            toggle_approved: 'a',
            fit_view: 'f',
            nudge: ['i', 'j', 'k', 'l'],
        }
    }
}

impl KeyBindings {
    /// Create new keybindings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the tool that corresponds to a letter, if any.
    pub fn tool_for_char(&self, c: char) -> Option<Tool> {
        let c = c.to_ascii_lowercase();
        if c == self.tool_select {
            Some(Tool::Select)
        } else if c == self.tool_box {
            Some(Tool::DrawBox)
        } else if c == self.tool_polygon {
            Some(Tool::DrawPolygon)
        } else if c == self.tool_pan {
            Some(Tool::Pan)
        } else {
            None
        }
    }


    /// Map a key press to an editor action.
    ///
    /// `class_count` limits the digit hotkeys to classes that exist.
    pub fn action_for(&self, key: Key, modifiers: Modifiers, class_count: usize) -> Option<KeyAction> {
        match key {
            Key::Left => Some(KeyAction::PrevItem),
            Key::Right => Some(KeyAction::NextItem),
            Key::Delete | Key::Backspace => Some(KeyAction::DeleteSelected),
            Key::Enter => Some(KeyAction::FinishPolygon),
            Key::Escape => Some(KeyAction::Cancel),
            Key::Up | Key::Down => None,
            Key::Char(c) if modifiers.command() => command_action(c, modifiers),
            Key::Char(c) => self.plain_action(c, modifiers, class_count),
        }
    }

    fn plain_action(&self, c: char, modifiers: Modifiers, class_count: usize) -> Option<KeyAction> {
        if let Some(digit) = c.to_digit(10) {
            let index = (digit as usize).checked_sub(1)?;
            return (index < class_count.min(MAX_CLASS_HOTKEYS))
                .then_some(KeyAction::SelectClass(index));
        }
        let lower = c.to_ascii_lowercase();
        if let Some(position) = self.nudge.iter().position(|&k| k == lower) {
            let step = if modifiers.shift {
                nudge::LARGE_STEP
            } else {
                nudge::STEP
            };
            let (dx, dy) = match position {
                0 => (0.0, -step),
                1 => (-step, 0.0),
                2 => (0.0, step),
                _ => (step, 0.0),
            };
            return Some(KeyAction::Nudge { dx, dy });
        }
        if lower == self.toggle_approved {
            return Some(KeyAction::ToggleApproved);
        }
        if lower == self.fit_view {
            return Some(KeyAction::FitView);
        }
        self.tool_for_char(lower).map(KeyAction::SetTool)
    }
}

/// Save/undo/redo live on fixed Ctrl (Cmd) chords.
fn command_action(c: char, modifiers: Modifiers) -> Option<KeyAction> {
    match c.to_ascii_lowercase() {
        's' => Some(KeyAction::Save),
        'z' if modifiers.shift => Some(KeyAction::Redo),
        'z' => Some(KeyAction::Undo),
        'y' => Some(KeyAction::Redo),
        _ => None,
    }
}
