//! Keeping the caret anchored across remote edits.
//!
//! When the authority delivers someone else's edit the content changes under
//! the local caret. We look at where the old and new content diverge and
//! shift the caret by the size of the change if that happened before it, so
//! the caret stays next to the same text.
//!
//! Like the differ, this only understands a single contiguous insert or
//! delete; a same-length substitution leaves the caret where it was.

use tracing::debug;

use crate::diff::divergence;

/// Move `prior` across the change from `old` to `new`.
///
/// The result is not clamped; see [`clamp`].
pub fn adjust(old: &[char], new: &[char], prior: usize) -> usize {
    let d = divergence(old, new);

    if new.len() > old.len() {
        let grown = new.len() - old.len();
        if d <= prior {
            return prior + grown;
        }
        return prior;
    }

    if new.len() < old.len() {
        let shrunk = old.len() - new.len();
        if d < prior {
            return prior.saturating_sub(shrunk);
        }
        return prior;
    }

    return prior;
}

/// Clamp a caret into `0..=len`.
pub fn clamp(caret: usize, len: usize) -> usize {
    if caret > len {
        debug!(caret, len, "caret out of bounds, clamping");
        return len;
    }
    return caret;
}

/// The local caret position, as an offset in characters.
///
/// Never transmitted; each session tracks its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CursorTracker {
    caret: usize,
}

impl CursorTracker {
    /// A caret at the start of the document.
    pub fn new() -> CursorTracker {
        return CursorTracker { caret: 0 };
    }

    /// Current caret offset.
    pub fn caret(&self) -> usize {
        return self.caret;
    }

    /// Record the caret reported by the input control after a local edit.
    pub fn set(&mut self, caret: usize, len: usize) {
        self.caret = clamp(caret, len);
    }

    /// Move the caret across a change that did not come from a local
    /// keystroke. Returns the new caret.
    pub fn on_remote(&mut self, old: &[char], new: &[char]) -> usize {
        let adjusted = adjust(old, new, self.caret);
        self.caret = clamp(adjusted, new.len());
        return self.caret;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        return s.chars().collect();
    }

    #[test]
    fn insert_before_caret_shifts_right() {
        assert_eq!(adjust(&chars("abcdef"), &chars("abXYcdef"), 4), 6);
    }

    #[test]
    fn insert_at_caret_shifts_right() {
        assert_eq!(adjust(&chars("abcdef"), &chars("abcdXef"), 4), 5);
    }

    #[test]
    fn insert_after_caret_stays() {
        assert_eq!(adjust(&chars("abcdef"), &chars("abcdeZf"), 1), 1);
    }

    #[test]
    fn delete_before_caret_shifts_left() {
        assert_eq!(adjust(&chars("abcdef"), &chars("cdef"), 4), 2);
    }

    #[test]
    fn delete_at_caret_stays() {
        assert_eq!(adjust(&chars("abcdef"), &chars("abcd"), 4), 4);
    }

    #[test]
    fn substitution_stays() {
        assert_eq!(adjust(&chars("abcdef"), &chars("abXdef"), 4), 4);
    }

    #[test]
    fn delete_spanning_caret_saturates() {
        // Removing "bcde" with the caret at 2 would go negative.
        assert_eq!(adjust(&chars("abcdef"), &chars("af"), 2), 0);
    }

    #[test]
    fn clamp_caps_at_len() {
        assert_eq!(clamp(10, 3), 3);
        assert_eq!(clamp(2, 3), 2);
    }

    #[test]
    fn tracker_follows_wholesale_replacement() {
        let mut tracker = CursorTracker::new();
        tracker.set(6, 6);
        let caret = tracker.on_remote(&chars("abcdef"), &chars("xy"));
        assert_eq!(caret, 2);
    }

    #[test]
    fn tracker_clamps_stale_caret() {
        let mut tracker = CursorTracker::new();
        // Caret recorded against a longer buffer than the one being changed.
        tracker.set(8, 10);
        let caret = tracker.on_remote(&chars("abc"), &chars("abcd"));
        assert_eq!(caret, 4);
    }

    #[test]
    fn tracker_set_clamps() {
        let mut tracker = CursorTracker::new();
        tracker.set(99, 5);
        assert_eq!(tracker.caret(), 5);
    }
}
