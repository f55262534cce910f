//! Undo/redo history over full state snapshots.
//!
//! Two stacks:
//! - `past`: snapshots that can be restored by undo (most recent at the end)
//! - `future`: snapshots that can be restored by redo (most recent at the end)
//!
//! Recording a new snapshot clears `future`; history never branches.
//! Capacity is unbounded: sessions are per-item and short-lived.

/// Linear undo/redo history for any cloneable state.
#[derive(Debug, Clone)]
pub struct History<T: Clone> {
    past: Vec<T>,
    future: Vec<T>,
}

impl<T: Clone> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> History<T> {
    /// Create an empty history.
    pub fn new() -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
        }
    }

    /// Push the pre-mutation state (call this BEFORE adopting the new state).
    ///
    /// This clears the redo stack since a new change invalidates it.
    pub fn push(&mut self, previous: T) {
        self.past.push(previous);
        self.future.clear();
        log::debug!("📝 History: recorded (undo depth {})", self.past.len());
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Undo: returns the state to restore, or None if there is nothing to undo.
    ///
    /// The current state is moved onto the redo stack.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.past.pop()?;
        self.future.push(current);
        log::debug!("⏪ History: undo (undo depth {})", self.past.len());
        Some(previous)
    }

    /// Redo: returns the state to restore, or None if there is nothing to redo.
    ///
    /// The current state is moved back onto the undo stack.
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.future.pop()?;
        self.past.push(current);
        log::debug!("⏩ History: redo (redo depth {})", self.future.len());
        Some(next)
    }

    /// Get number of undo steps available
    pub fn undo_count(&self) -> usize {
        self.past.len()
    }

    /// Get number of redo steps available
    pub fn redo_count(&self) -> usize {
        self.future.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_basic() {
        let mut history: History<u32> = History::new();
        assert!(!history.can_undo());
        assert!(!history.can_redo());

        history.push(1);
        assert_eq!(history.undo(2), Some(1));
        assert!(history.can_redo());
        assert_eq!(history.redo(1), Some(2));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history: History<u32> = History::new();
        history.push(1);
        history.undo(2);
        assert!(history.can_redo());

        history.push(1);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_undo_and_redo_are_noops() {
        let mut history: History<u32> = History::new();
        assert_eq!(history.undo(5), None);
        assert_eq!(history.redo(5), None);
        assert_eq!(history.undo_count(), 0);
        assert_eq!(history.redo_count(), 0);
    }

    #[test]
    fn test_unbounded_depth() {
        let mut history: History<usize> = History::new();
        for i in 0..1000 {
            history.push(i);
        }
        assert_eq!(history.undo_count(), 1000);
    }
}
