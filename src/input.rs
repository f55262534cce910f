//! Input events delivered to the editor by the hosting UI.
//!
//! Pointer positions are in screen (canvas) pixels; the editor converts them
//! into image space through the viewport.

/// Pointer events for the primary button.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Button pressed.
    Down { x: f32, y: f32 },
    /// Pointer moved, with or without the button held.
    Move { x: f32, y: f32 },
    /// Button released.
    Up { x: f32, y: f32 },
    /// Second press of a double-click. Hosts send it after the second `Down`.
    DoubleClick { x: f32, y: f32 },
}

impl PointerEvent {
    /// Screen position of the event.
    pub fn position(&self) -> (f32, f32) {
        match *self {
            PointerEvent::Down { x, y }
            | PointerEvent::Move { x, y }
            | PointerEvent::Up { x, y }
            | PointerEvent::DoubleClick { x, y } => (x, y),
        }
    }
}

/// Keyboard keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    /// Ctrl on Linux/Windows, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}
