//! Turning an observed change to a buffer into an operation.
//!
//! Input controls report the whole new buffer, not what happened to it. The
//! differ compares the previous buffer with the new one and recovers a single
//! [`Operation`] that can be sent to the authority.
//!
//! [`PrefixDiff`] scans for the common prefix only. That is exact for the
//! edits a single caret produces (a keystroke, a paste, a deletion) but it is
//! not a minimal edit distance: an edit touching two separate regions comes
//! out as one oversized region, and a same-length substitution is not
//! detected at all. Callers go through [`Diff`] so a multi-hunk differ can
//! replace it later.

use crate::op::Operation;

/// Derives an operation from two snapshots of a buffer.
pub trait Diff {
    /// Returns `None` when there is nothing to transmit.
    fn diff(&self, old: &[char], new: &[char]) -> Option<Operation>;
}

/// The first index at which `old` and `new` differ, scanning from the start.
///
/// If one is a prefix of the other this is the length of the shorter one.
pub fn divergence(old: &[char], new: &[char]) -> usize {
    return old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
}

/// Common-prefix differ for single contiguous edits.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrefixDiff;

impl Diff for PrefixDiff {
    fn diff(&self, old: &[char], new: &[char]) -> Option<Operation> {
        let p = divergence(old, new);

        if new.len() > old.len() {
            let inserted = new.len() - old.len();
            let text: String = new[p..p + inserted].iter().collect();
            return Some(Operation::Insert { position: p, text });
        }

        if new.len() < old.len() {
            return Some(Operation::Delete {
                position: p,
                length: old.len() - new.len(),
            });
        }

        // Same length: either identical or a substitution we can't express.
        return None;
    }
}

/// Diff two buffers with [`PrefixDiff`].
pub fn diff(old: &[char], new: &[char]) -> Option<Operation> {
    return PrefixDiff.diff(old, new);
}

/// Diff two strings with [`PrefixDiff`].
pub fn diff_str(old: &str, new: &str) -> Option<Operation> {
    let old: Vec<char> = old.chars().collect();
    let new: Vec<char> = new.chars().collect();
    return diff(&old, &new);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        return s.chars().collect();
    }

    #[test]
    fn divergence_of_prefix() {
        assert_eq!(divergence(&chars("abc"), &chars("abcdef")), 3);
        assert_eq!(divergence(&chars("abc"), &chars("abX")), 2);
        assert_eq!(divergence(&chars(""), &chars("abc")), 0);
    }

    #[test]
    fn keystroke_in_middle() {
        assert_eq!(diff_str("helo", "hello"), Some(Operation::insert(3, "l")));
    }

    #[test]
    fn paste_at_start() {
        assert_eq!(diff_str("world", "hello world"), Some(Operation::insert(0, "hello ")));
    }

    #[test]
    fn backspace_at_end() {
        assert_eq!(diff_str("hello", "hell"), Some(Operation::delete(4, 1)));
    }

    #[test]
    fn delete_selection() {
        assert_eq!(diff_str("hello world", "hello"), Some(Operation::delete(5, 6)));
    }

    #[test]
    fn identical_is_no_change() {
        assert_eq!(diff_str("same", "same"), None);
        assert_eq!(diff_str("", ""), None);
    }

    #[test]
    fn substitution_is_not_detected() {
        assert_eq!(diff_str("cat", "cut"), None);
    }

    #[test]
    fn repeated_char_picks_later_position() {
        // Inserting an 'l' into "helo" right after the first 'l' is
        // indistinguishable from inserting it after 'e'; prefix scan picks 3.
        assert_eq!(diff_str("helo", "hello").map(|op| op.position()), Some(3));
    }

    #[test]
    fn unicode_positions_are_chars() {
        assert_eq!(diff_str("héllo", "héllo!"), Some(Operation::insert(5, "!")));
    }

    #[test]
    fn two_region_edit_is_oversized() {
        // "abcdef" -> "XabcdefY" is two inserts; the prefix scan sees one
        // insert of length 2 at 0 whose text is whatever sits there in `new`.
        assert_eq!(diff_str("abcdef", "XabcdefY"), Some(Operation::insert(0, "Xa")));
    }
}
