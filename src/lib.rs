//! labeldesk - annotation editor core
//!
//! A headless editor for image annotations backed by a shared labeling
//! server. The [`editor::Editor`] turns input into state changes and
//! [`message::Effect`]s; the [`runtime::Runtime`] performs those effects
//! against a [`labeldesk_api::Backend`] and feeds the results back. The
//! [`job`] module follows long-running backend jobs.

pub mod color_utils;
pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod image_loader;
pub mod input;
pub mod job;
pub mod keybindings;
pub mod lease;
pub mod message;
pub mod model;
pub mod runtime;
pub mod scene;
pub mod tools;
pub mod undo;
pub mod viewport;

pub use config::EditorConfig;
pub use editor::{Editor, EditorContext};
pub use message::{Effect, Message};
pub use runtime::Runtime;
