//! The editable document of the current item: shapes, history, dirty state.

use super::shape_list::ShapeList;
use crate::undo::History;

/// Shapes of one item plus their undo history and unsaved-change tracking.
///
/// `revision` increases on every successful mutation (including undo and
/// redo), which lets a save in flight tell whether the list changed underneath
/// it.
#[derive(Debug, Clone)]
pub struct ShapeDocument {
    current: ShapeList,
    history: History<ShapeList>,
    dirty: bool,
    revision: u64,
}

impl ShapeDocument {
    /// A clean document with no history.
    pub fn new(shapes: ShapeList) -> Self {
        Self {
            current: shapes,
            history: History::new(),
            dirty: false,
            revision: 0,
        }
    }

    pub fn shapes(&self) -> &ShapeList {
        &self.current
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_count(&self) -> usize {
        self.history.undo_count()
    }

    pub fn redo_count(&self) -> usize {
        self.history.redo_count()
    }

    /// Run `mutator` against a copy of the current shapes and adopt the result.
    ///
    /// The mutator reports whether it changed anything; unchanged runs leave
    /// the history and dirty flag alone.
    pub fn record(&mut self, mutator: impl FnOnce(&mut ShapeList) -> bool) -> bool {
        let mut next = self.current.clone();
        if !mutator(&mut next) {
            return false;
        }
        let previous = std::mem::replace(&mut self.current, next);
        self.history.push(previous);
        self.touch();
        true
    }

    /// Restore the previous snapshot. No-op when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.current.clone()) {
            Some(previous) => {
                self.current = previous;
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Re-apply the last undone snapshot. No-op when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.current.clone()) {
            Some(next) => {
                self.current = next;
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Called when a save of `saved_revision` succeeded.
    ///
    /// Clears the dirty flag only if nothing changed since that save was sent;
    /// `adopt` (server ids) is applied to the current shapes in that case.
    pub fn mark_saved(&mut self, saved_revision: u64, adopt: impl FnOnce(&mut ShapeList)) -> bool {
        if saved_revision != self.revision {
            log::debug!(
                "Save of revision {} finished but document is at {}; staying dirty",
                saved_revision,
                self.revision
            );
            return false;
        }
        adopt(&mut self.current);
        self.dirty = false;
        true
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }
}
